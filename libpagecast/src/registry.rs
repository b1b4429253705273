//! Page registry: the pipe-delimited list of destination pages
//!
//! ```text
//! # page_id|access_token|page_name
//! 123456789|EAAB...|Bakery
//! 987654321|$SHOP_PAGE_TOKEN|Shop
//! 555
//! ```
//!
//! The display name is optional and defaults to `Page_<page_id>`. A token
//! starting with `$` names an environment variable holding the real token.

use std::path::Path;

use tracing::{info, warn};

use crate::config::Environment;
use crate::error::{Result, SetupError};
use crate::types::PageTarget;

/// Load the registry file at `path`
///
/// A missing file yields an empty registry; the caller decides whether
/// that is fatal. Any other read failure, including invalid UTF-8, is a
/// [`SetupError::PagesUnreadable`].
pub fn load_pages(path: &Path, env: &Environment) -> Result<Vec<PageTarget>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file not found: {}", path.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(SetupError::PagesUnreadable {
                path: path.to_path_buf(),
                source,
            }
            .into())
        }
    };

    Ok(parse_pages(&content, env))
}

/// Parse registry lines, skipping comments and unusable entries
pub fn parse_pages(content: &str, env: &Environment) -> Vec<PageTarget> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| parse_line(index + 1, line, env))
        .collect()
}

fn parse_line(line_num: usize, line: &str, env: &Environment) -> Option<PageTarget> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    if parts.len() < 2 {
        warn!("Invalid format at line {}: {}", line_num, line);
        return None;
    }

    let page_id = parts[0];
    let name = match parts.get(2).filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("Page_{}", page_id),
    };

    let token = match parts[1].strip_prefix('$') {
        Some(var) => match env.get(var).filter(|value| !value.is_empty()) {
            Some(value) => value,
            None => {
                warn!("Environment variable {} not set (line {})", var, line_num);
                return None;
            }
        },
        None => parts[1],
    };

    if page_id.is_empty() || token.is_empty() {
        warn!("Missing page id or access token at line {}", line_num);
        return None;
    }

    info!("Loaded: {}", name);
    Some(PageTarget::new(page_id, token, name))
}
