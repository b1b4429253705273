//! Configuration management for Pagecast
//!
//! Two pieces of state are built once at startup and passed down by
//! reference: an [`Environment`] snapshot of the process variables, and the
//! run [`Settings`] (directories, publish delay, Graph API endpoint and
//! timeouts), optionally loaded from a TOML file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Environment variable naming an explicit settings file
pub const CONFIG_ENV_VAR: &str = "PAGECAST_CONFIG";

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v18.0";

/// Snapshot of the process environment
///
/// Library code never calls `std::env::var`; credential placeholders and
/// path expansion resolve against this value instead.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment, skipping non-UTF-8 entries
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Expand `~` and `$VAR` references in a path against this snapshot
    pub fn expand_path(&self, path: &Path) -> Result<PathBuf> {
        let raw = path.to_string_lossy();
        let expanded = shellexpand::full_with_context(
            raw.as_ref(),
            || self.get("HOME"),
            |var| Ok::<_, std::convert::Infallible>(self.get(var)),
        )
        .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", raw, e)))?;

        Ok(PathBuf::from(expanded.as_ref()))
    }
}

/// Run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `.txt` / `.docx` post files
    pub posts_dir: PathBuf,
    /// Directory that `IMAGE:` directives are resolved against
    pub images_dir: PathBuf,
    /// Pipe-delimited page registry
    pub pages_file: PathBuf,
    /// Pause between successive publish operations
    #[serde(with = "duration_str")]
    pub publish_delay: Duration,
    pub graph: GraphSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from("posts"),
            images_dir: PathBuf::from("images"),
            pages_file: PathBuf::from("config.txt"),
            publish_delay: Duration::from_secs(2),
            graph: GraphSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub base_url: String,
    pub api_version: String,
    #[serde(with = "duration_str")]
    pub metadata_timeout: Duration,
    #[serde(with = "duration_str")]
    pub upload_timeout: Duration,
    #[serde(with = "duration_str")]
    pub publish_timeout: Duration,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            metadata_timeout: Duration::from_secs(10),
            upload_timeout: Duration::from_secs(60),
            publish_timeout: Duration::from_secs(30),
        }
    }
}

impl GraphSettings {
    /// Versioned endpoint root, e.g. `https://graph.facebook.com/v18.0`
    pub fn api_base(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }
}

impl Settings {
    /// Load settings, honouring an explicit path first
    ///
    /// Resolution order: `explicit`, then `PAGECAST_CONFIG`, then
    /// `<config dir>/pagecast/pagecast.toml` when it exists, then defaults.
    /// Directory paths are expanded against `env` afterwards.
    pub fn load(explicit: Option<&Path>, env: &Environment) -> Result<Self> {
        let settings = match resolve_settings_path(explicit, env)? {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Self::load_from_path(&path)?
            }
            None => Self::default(),
        };

        settings.expanded(env)
    }

    /// Load settings from a specific TOML file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content).map_err(ConfigError::ParseError)?;
        Ok(settings)
    }

    fn expanded(mut self, env: &Environment) -> Result<Self> {
        self.posts_dir = env.expand_path(&self.posts_dir)?;
        self.images_dir = env.expand_path(&self.images_dir)?;
        self.pages_file = env.expand_path(&self.pages_file)?;
        Ok(self)
    }
}

/// Resolve which settings file to read, if any
pub fn resolve_settings_path(
    explicit: Option<&Path>,
    env: &Environment,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return Ok(Some(env.expand_path(path)?));
    }

    if let Some(path) = env.get(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Ok(Some(env.expand_path(Path::new(path))?));
    }

    Ok(dirs::config_dir()
        .map(|dir| dir.join("pagecast").join("pagecast.toml"))
        .filter(|path| path.is_file()))
}

/// Parse a human-readable duration such as `2s` or `500ms`
pub fn parse_duration(input: &str) -> Result<Duration> {
    humantime::parse_duration(input.trim())
        .map_err(|e| ConfigError::InvalidValue(format!("invalid duration '{}': {}", input, e)).into())
}

mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.posts_dir, PathBuf::from("posts"));
        assert_eq!(settings.images_dir, PathBuf::from("images"));
        assert_eq!(settings.pages_file, PathBuf::from("config.txt"));
        assert_eq!(settings.publish_delay, Duration::from_secs(2));
        assert_eq!(
            settings.graph.api_base(),
            "https://graph.facebook.com/v18.0"
        );
        assert_eq!(settings.graph.metadata_timeout, Duration::from_secs(10));
        assert_eq!(settings.graph.upload_timeout, Duration::from_secs(60));
        assert_eq!(settings.graph.publish_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
posts_dir = "content"
publish_delay = "500ms"

[graph]
api_version = "v19.0"
"#,
        )
        .unwrap();

        assert_eq!(settings.posts_dir, PathBuf::from("content"));
        assert_eq!(settings.images_dir, PathBuf::from("images"));
        assert_eq!(settings.publish_delay, Duration::from_millis(500));
        assert_eq!(settings.graph.api_version, "v19.0");
        assert_eq!(settings.graph.upload_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_duration_is_parse_error() {
        let result = Settings::from_toml(r#"publish_delay = "soon""#);
        assert!(matches!(
            result,
            Err(crate::PagecastError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_api_base_trims_slashes() {
        let graph = GraphSettings {
            base_url: "http://127.0.0.1:9000/".to_string(),
            api_version: "v18.0".to_string(),
            ..Default::default()
        };
        assert_eq!(graph.api_base(), "http://127.0.0.1:9000/v18.0");
    }

    #[test]
    fn test_environment_lookup() {
        let env = Environment::from_pairs([("TOKEN", "abc")]);
        assert_eq!(env.get("TOKEN"), Some("abc"));
        assert_eq!(env.get("MISSING"), None);
    }

    #[test]
    fn test_expand_path_uses_snapshot() {
        let env = Environment::from_pairs([("HOME", "/home/op"), ("SITE", "news")]);
        let expanded = env.expand_path(Path::new("~/pages/$SITE/posts")).unwrap();
        assert_eq!(expanded, PathBuf::from("/home/op/pages/news/posts"));
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pagecast.toml");
        std::fs::write(&path, "pages_file = \"$ROOT/pages.txt\"\n").unwrap();

        let env = Environment::from_pairs([("ROOT", "/srv/pagecast")]);
        let settings = Settings::load(Some(&path), &env).unwrap();
        assert_eq!(settings.pages_file, PathBuf::from("/srv/pagecast/pages.txt"));
    }

    #[test]
    fn test_load_from_env_variable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(&path, "images_dir = \"media\"\n").unwrap();

        let env = Environment::from_pairs([(CONFIG_ENV_VAR, path.to_string_lossy().to_string())]);
        let settings = Settings::load(None, &env).unwrap();
        assert_eq!(settings.images_dir, PathBuf::from("media"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        let result = Settings::load(Some(&path), &Environment::default());
        assert!(matches!(
            result,
            Err(crate::PagecastError::Config(ConfigError::ReadError(_)))
        ));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration(" 250ms ").unwrap(), Duration::from_millis(250));
        assert!(parse_duration("two seconds").is_err());
    }
}
