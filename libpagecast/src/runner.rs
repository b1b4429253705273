//! Run orchestration
//!
//! A run walks through a fixed sequence of states:
//!
//! ```text
//! ValidatingDirs -> LoadingRegistry -> CheckingConnectivity -> LoadingPosts
//!     -> Publishing -> Summarizing -> Done
//! ```
//!
//! Failing preconditions abort the run with a [`SetupError`]. Problems with
//! individual files, images, uploads or publishes are logged, counted and
//! skipped. Every post is published to every reachable page, one at a time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Environment, Settings};
use crate::content::{docx_support, list_post_files, load_posts};
use crate::error::{Result, SetupError};
use crate::graph::GraphApi;
use crate::publisher::Publisher;
use crate::registry::load_pages;
use crate::types::{Post, PublishOutcome};

/// How often a publish delay checks for a shutdown request
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    ValidatingDirs,
    LoadingRegistry,
    CheckingConnectivity,
    LoadingPosts,
    Publishing,
    Summarizing,
    Done,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunState::ValidatingDirs => "validating directories",
            RunState::LoadingRegistry => "loading page registry",
            RunState::CheckingConnectivity => "checking connectivity",
            RunState::LoadingPosts => "loading posts",
            RunState::Publishing => "publishing",
            RunState::Summarizing => "summarizing",
            RunState::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Results for one post across all pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostReport {
    pub filename: String,
    pub results: Vec<PublishOutcome>,
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub posts_processed: usize,
    pub pages_targeted: usize,
    pub total_success: usize,
    pub total_failed: usize,
    pub cancelled: bool,
    pub posts: Vec<PostReport>,
}

impl RunSummary {
    fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Default::default()
        }
    }

    /// 0 when nothing failed or the run was cancelled, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.cancelled || self.total_failed == 0 {
            0
        } else {
            1
        }
    }

    fn record(&mut self, filename: &str, outcome: PublishOutcome) {
        if outcome.success {
            self.total_success += 1;
        } else {
            self.total_failed += 1;
        }

        match self.posts.last_mut() {
            Some(report) if report.filename == filename => report.results.push(outcome),
            _ => self.posts.push(PostReport {
                filename: filename.to_string(),
                results: vec![outcome],
            }),
        }
    }
}

/// Drives one publishing run
pub struct Runner<'a> {
    settings: &'a Settings,
    env: &'a Environment,
    api: Arc<dyn GraphApi>,
    shutdown: Arc<AtomicBool>,
}

impl<'a> Runner<'a> {
    pub fn new(settings: &'a Settings, env: &'a Environment, api: Arc<dyn GraphApi>) -> Self {
        Self {
            settings,
            env,
            api,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop at the next page boundary once `flag` is set
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    fn cancelled(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    fn enter(&self, state: RunState) {
        debug!("Run state: {}", state);
    }

    pub async fn run(&self) -> Result<RunSummary> {
        if !docx_support() {
            warn!(".docx support not compiled in; .docx files will be skipped");
        }

        self.enter(RunState::ValidatingDirs);
        self.validate_dirs()?;

        self.enter(RunState::LoadingRegistry);
        info!("Loading Facebook pages from {}", self.settings.pages_file.display());
        let pages = load_pages(&self.settings.pages_file, self.env)?;
        if pages.is_empty() {
            warn!("Expected one page per line: page_id|access_token|page_name");
            return Err(SetupError::NoTargets(self.settings.pages_file.clone()).into());
        }

        self.enter(RunState::CheckingConnectivity);
        info!("Testing connections...");
        let mut publishers = Vec::with_capacity(pages.len());
        for page in pages {
            if self.cancelled() {
                return Ok(RunSummary::cancelled());
            }
            let publisher = Publisher::new(page, Arc::clone(&self.api));
            if publisher.check_connection().await {
                publishers.push(publisher);
            }
        }
        if publishers.is_empty() {
            return Err(SetupError::NoReachableTargets.into());
        }
        info!("{} page(s) ready", publishers.len());

        self.enter(RunState::LoadingPosts);
        let posts = self.collect_posts()?;
        info!("Loaded {} valid post(s)", posts.len());

        self.enter(RunState::Publishing);
        let summary = self.publish_all(&posts, &publishers).await;

        self.enter(RunState::Summarizing);
        log_summary(&summary);

        self.enter(RunState::Done);
        Ok(summary)
    }

    fn validate_dirs(&self) -> Result<()> {
        let posts_dir = &self.settings.posts_dir;
        if !posts_dir.is_dir() {
            return Err(SetupError::PostsDirMissing(posts_dir.clone()).into());
        }

        let images_dir = &self.settings.images_dir;
        if !images_dir.exists() {
            warn!("Images directory not found: {}, creating it", images_dir.display());
            std::fs::create_dir_all(images_dir).map_err(|source| SetupError::ImagesDir {
                path: images_dir.clone(),
                source,
            })?;
        }

        Ok(())
    }

    fn collect_posts(&self) -> Result<Vec<Post>> {
        let posts_dir = &self.settings.posts_dir;
        info!("Loading posts from {}", posts_dir.display());

        let files = list_post_files(posts_dir)?;
        if files.is_empty() {
            return Err(SetupError::NoPostFiles(posts_dir.clone()).into());
        }
        info!("Found {} post file(s)", files.len());

        let posts = load_posts(&files);
        if posts.is_empty() {
            return Err(SetupError::NoPosts.into());
        }
        Ok(posts)
    }

    /// Wait out the publish delay, returning early once shutdown is requested
    async fn pause(&self) {
        let mut remaining = self.settings.publish_delay;
        while !remaining.is_zero() && !self.cancelled() {
            let step = remaining.min(SHUTDOWN_POLL);
            sleep(step).await;
            remaining -= step;
        }
    }

    async fn publish_all(&self, posts: &[Post], publishers: &[Publisher]) -> RunSummary {
        let mut summary = RunSummary {
            posts_processed: posts.len(),
            pages_targeted: publishers.len(),
            ..Default::default()
        };

        let mut first = true;
        for (index, post) in posts.iter().enumerate() {
            info!("[{}/{}] Processing: {}", index + 1, posts.len(), post.filename);
            let image_paths = resolve_images(&self.settings.images_dir, &post.images);

            for publisher in publishers {
                if !first {
                    self.pause().await;
                }
                if self.cancelled() {
                    warn!("Cancelled by user");
                    summary.cancelled = true;
                    return summary;
                }
                first = false;

                let outcome = publisher.publish(&post.text, &image_paths).await;
                summary.record(&post.filename, outcome);
            }
        }

        summary
    }
}

/// Resolve image filenames against `images_dir`, dropping missing files
pub fn resolve_images(images_dir: &Path, images: &[String]) -> Vec<PathBuf> {
    images
        .iter()
        .filter_map(|name| {
            let path = images_dir.join(name);
            if !name.is_empty() && path.is_file() {
                Some(path)
            } else {
                warn!("  Image not found: {}", name);
                None
            }
        })
        .collect()
}

fn log_summary(summary: &RunSummary) {
    info!(
        posts = summary.posts_processed,
        pages = summary.pages_targeted,
        success = summary.total_success,
        failed = summary.total_failed,
        "Run finished"
    );
}
