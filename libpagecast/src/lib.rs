//! Pagecast - publish local post files to Facebook Pages
//!
//! Post files (`.txt`, optionally `.docx`) are parsed into a message body
//! and a list of referenced images, then published to every page listed in
//! a pipe-delimited registry through the Graph API.

pub mod config;
pub mod content;
pub mod error;
pub mod graph;
pub mod logging;
pub mod publisher;
pub mod registry;
pub mod runner;
pub mod types;

// Re-export commonly used types
pub use config::{Environment, Settings};
pub use error::{PagecastError, Result};
pub use publisher::Publisher;
pub use runner::{RunSummary, Runner};
pub use types::{PageTarget, Post, PublishOutcome, UploadedMedia};
