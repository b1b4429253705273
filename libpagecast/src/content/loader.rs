//! Post loading from a content directory

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::parse_post_content;
use crate::error::ContentError;
use crate::types::Post;

/// Whether `.docx` files can be read by this build
pub fn docx_support() -> bool {
    cfg!(feature = "docx")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostFileKind {
    Text,
    #[cfg(feature = "docx")]
    Document,
}

impl PostFileKind {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            #[cfg(feature = "docx")]
            "docx" => Some(Self::Document),
            _ => None,
        }
    }
}

/// List supported post files in `dir`, sorted by file name
///
/// `.txt` files are always included; `.docx` only when [`docx_support`]
/// is true. Hidden files (leading `.`) and subdirectories are skipped.
pub fn list_post_files(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let io_error = |source| ContentError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_file() && !is_hidden(&path) && PostFileKind::of(&path).is_some() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Read the raw text of one post file
pub fn read_post_file(path: &Path) -> Result<String, ContentError> {
    match PostFileKind::of(path) {
        Some(PostFileKind::Text) => {
            let bytes = std::fs::read(path).map_err(|source| ContentError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            String::from_utf8(bytes).map_err(|_| ContentError::Encoding(path.to_path_buf()))
        }
        #[cfg(feature = "docx")]
        Some(PostFileKind::Document) => super::docx::read_docx_text(path),
        None => Err(ContentError::Document {
            path: path.to_path_buf(),
            message: "unsupported file type".to_string(),
        }),
    }
}

/// Load one post, logging and returning `None` when the file is unusable
pub fn load_post(path: &Path) -> Option<Post> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    info!("Reading: {}", filename);

    let content = match read_post_file(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Error reading {}: {}", path.display(), e);
            return None;
        }
    };

    let parsed = parse_post_content(&content);
    if parsed.text.is_empty() {
        warn!("No text content found in {}", filename);
        return None;
    }

    info!("  Text: {} characters", parsed.text.chars().count());
    if !parsed.images.is_empty() {
        info!("  Images: {} file(s)", parsed.images.len());
        for image in &parsed.images {
            info!("     - {}", image);
        }
    }

    Some(Post {
        filename,
        text: parsed.text,
        images: parsed.images,
    })
}

/// Load every valid post among `files`, keeping their order
///
/// Unusable files are logged by [`load_post`] and left out.
pub fn load_posts(files: &[PathBuf]) -> Vec<Post> {
    files.iter().filter_map(|path| load_post(path)).collect()
}
