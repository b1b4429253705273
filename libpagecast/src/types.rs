//! Core types for Pagecast

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Canonical public URL for a published Graph object
pub fn post_url(post_id: &str) -> String {
    format!("https://facebook.com/{}", post_id)
}

/// One destination Facebook Page and its access token
#[derive(Clone)]
pub struct PageTarget {
    pub page_id: String,
    access_token: SecretString,
    pub name: String,
}

impl PageTarget {
    pub fn new(page_id: impl Into<String>, access_token: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            access_token: SecretString::from(access_token.into()),
            name: name.into(),
        }
    }

    /// The raw access token, for building Graph API requests only
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

impl std::fmt::Debug for PageTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageTarget")
            .field("page_id", &self.page_id)
            .field("access_token", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

/// A post loaded from one content file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// File name (not path) the post was read from
    pub filename: String,
    pub text: String,
    /// Image filenames from `IMAGE:` directives, in encounter order
    pub images: Vec<String>,
}

/// Result of publishing one post to one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    /// Display name of the page
    pub page: String,
    pub success: bool,
    pub post_id: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
}

impl PublishOutcome {
    pub fn published(page: &str, post_id: String) -> Self {
        Self {
            page: page.to_string(),
            success: true,
            url: Some(post_url(&post_id)),
            post_id: Some(post_id),
            error: None,
        }
    }

    pub fn failed(page: &str, error: impl Into<String>) -> Self {
        Self {
            page: page.to_string(),
            success: false,
            post_id: None,
            url: None,
            error: Some(error.into()),
        }
    }
}

/// A staged photo, valid between upload and feed publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub path: PathBuf,
    pub media_id: String,
}

// ============================================================================
// Attachment Types
// ============================================================================

/// Image MIME types recognised by file extension
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageMimeType {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageMimeType {
    /// Detect MIME type from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get the MIME type string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }
}

impl std::fmt::Display for ImageMimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
