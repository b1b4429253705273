//! Publishing to a single Facebook Page
//!
//! A [`Publisher`] owns one [`PageTarget`] and performs every Graph API
//! interaction for it: the connectivity check, photo uploads and feed
//! publishes. Each call is attempted once; failures are logged here and
//! reported to the caller as values, never as errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::graph::{FeedRequest, GraphApi, GraphResponse, GraphResult};
use crate::types::{PageTarget, PublishOutcome, UploadedMedia};

pub struct Publisher {
    target: PageTarget,
    api: Arc<dyn GraphApi>,
}

impl Publisher {
    pub fn new(target: PageTarget, api: Arc<dyn GraphApi>) -> Self {
        Self { target, api }
    }

    pub fn target(&self) -> &PageTarget {
        &self.target
    }

    pub fn name(&self) -> &str {
        &self.target.name
    }

    /// Read the page's name and follower count
    ///
    /// Returns `false` on any transport error, API error or unrecognised
    /// reply; the page should then be left out of the run.
    pub async fn check_connection(&self) -> bool {
        let reply = self.api.page_info(&self.target).await;
        match reply.and_then(GraphResponse::into_result) {
            Ok((_, fields)) => {
                let actual_name = fields
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown");
                let fans = fields.get("fan_count").and_then(Value::as_u64).unwrap_or(0);
                info!("Connected: {} ({} followers)", actual_name, fans);
                true
            }
            Err(e) => {
                error!("Connection failed for {}: {}", self.target.name, e);
                false
            }
        }
    }

    /// Stage one photo, returning its media id
    pub async fn upload_photo(&self, path: &Path) -> Option<UploadedMedia> {
        let reply = self.api.upload_photo(&self.target, path).await;
        match reply.and_then(GraphResponse::into_result) {
            Ok((media_id, _)) => {
                info!("  Uploaded: {} -> {}", display_name(path), media_id);
                Some(UploadedMedia {
                    path: path.to_path_buf(),
                    media_id,
                })
            }
            Err(e) => {
                error!("  Upload failed for {}: {}", display_name(path), e);
                None
            }
        }
    }

    pub async fn post_text_only(&self, message: &str) -> GraphResult<GraphResponse> {
        self.api
            .publish_feed(&self.target, &FeedRequest::text(message))
            .await
    }

    pub async fn post_with_photos(
        &self,
        message: &str,
        media: &[UploadedMedia],
    ) -> GraphResult<GraphResponse> {
        self.api
            .publish_feed(&self.target, &FeedRequest::with_media(message, media))
            .await
    }

    /// Upload `image_paths` in order, then publish the message
    ///
    /// Photos that fail to upload are left out; if none upload, the
    /// message is published as text only.
    pub async fn publish(&self, message: &str, image_paths: &[PathBuf]) -> PublishOutcome {
        info!("Posting to: {}", self.target.name);

        let mut media = Vec::with_capacity(image_paths.len());
        for path in image_paths {
            if let Some(uploaded) = self.upload_photo(path).await {
                media.push(uploaded);
            }
        }

        if !image_paths.is_empty() && media.len() < image_paths.len() {
            warn!(
                "  {} of {} image(s) uploaded",
                media.len(),
                image_paths.len()
            );
        }

        let reply = if media.is_empty() {
            self.post_text_only(message).await
        } else {
            self.post_with_photos(message, &media).await
        };

        let outcome = interpret_reply(&self.target.name, reply);
        if let (Some(post_id), Some(url)) = (&outcome.post_id, &outcome.url) {
            info!("  Posted successfully!");
            info!("     ID: {}", post_id);
            info!("     URL: {}", url);
        } else if let Some(error) = &outcome.error {
            error!("  Post failed: {}", error);
        }
        outcome
    }
}

/// Turn a feed publish reply into an outcome
pub fn interpret_reply(page: &str, reply: GraphResult<GraphResponse>) -> PublishOutcome {
    match reply.and_then(GraphResponse::into_result) {
        Ok((post_id, _)) => PublishOutcome::published(page, post_id),
        Err(e) => PublishOutcome::failed(page, e.to_string()),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::graph::mock::{GraphCall, MockGraph};
    use tempfile::TempDir;

    fn publisher(mock: &MockGraph) -> Publisher {
        Publisher::new(
            PageTarget::new("100", "token", "Bakery"),
            Arc::new(mock.clone()),
        )
    }

    fn image(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"\x89PNG fake").unwrap();
        path
    }

    #[tokio::test]
    async fn test_check_connection_success() {
        let mock = MockGraph::new();
        assert!(publisher(&mock).check_connection().await);
    }

    #[tokio::test]
    async fn test_check_connection_api_error() {
        let mock = MockGraph::new().with_unreachable_page("100", "Invalid OAuth access token.");
        assert!(!publisher(&mock).check_connection().await);
    }

    #[tokio::test]
    async fn test_text_only_publish() {
        let mock = MockGraph::new();
        let outcome = publisher(&mock).publish("Hello", &[]).await;

        assert!(outcome.success);
        assert_eq!(outcome.page, "Bakery");
        let post_id = outcome.post_id.unwrap();
        assert_eq!(outcome.url.unwrap(), format!("https://facebook.com/{}", post_id));
        assert_eq!(
            mock.publish_calls(),
            vec![GraphCall::Publish {
                page_id: "100".to_string(),
                message: "Hello".to_string(),
                media_ids: vec![],
            }]
        );
    }

    #[tokio::test]
    async fn test_publish_with_photos_in_upload_order() {
        let temp = TempDir::new().unwrap();
        let paths = vec![image(&temp, "a.jpg"), image(&temp, "b.png")];
        let mock = MockGraph::new();

        let outcome = publisher(&mock).publish("Photos", &paths).await;
        assert!(outcome.success);
        assert_eq!(mock.upload_count(), 2);

        match &mock.publish_calls()[0] {
            GraphCall::Publish { media_ids, .. } => {
                assert_eq!(media_ids, &vec!["photo-1".to_string(), "photo-2".to_string()]);
            }
            other => panic!("Expected publish call, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_upload_is_skipped() {
        let temp = TempDir::new().unwrap();
        let paths = vec![image(&temp, "bad.jpg"), image(&temp, "good.jpg")];
        let mock = MockGraph::new().with_failing_upload("bad.jpg");

        let outcome = publisher(&mock).publish("Partial", &paths).await;
        assert!(outcome.success);

        match &mock.publish_calls()[0] {
            GraphCall::Publish { media_ids, .. } => assert_eq!(media_ids.len(), 1),
            other => panic!("Expected publish call, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_all_uploads_fail_falls_back_to_text() {
        let temp = TempDir::new().unwrap();
        let paths = vec![image(&temp, "bad.jpg")];
        let mock = MockGraph::new().with_failing_upload("bad.jpg");

        let outcome = publisher(&mock).publish("Text fallback", &paths).await;
        assert!(outcome.success);

        match &mock.publish_calls()[0] {
            GraphCall::Publish { media_ids, .. } => assert!(media_ids.is_empty()),
            other => panic!("Expected publish call, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_photo_missing_file() {
        let mock = MockGraph::new();
        let uploaded = publisher(&mock)
            .upload_photo(Path::new("/nope/missing.jpg"))
            .await;
        assert!(uploaded.is_none());
    }

    #[tokio::test]
    async fn test_publish_api_error() {
        let mock = MockGraph::new().with_publish_error("100", "(#200) Permissions error");
        let outcome = publisher(&mock).publish("Hello", &[]).await;

        assert!(!outcome.success);
        assert!(outcome.post_id.is_none());
        assert_eq!(outcome.error.as_deref(), Some("(#200) Permissions error"));
    }

    #[tokio::test]
    async fn test_publish_malformed_reply() {
        let mock = MockGraph::new().with_malformed_publish("100");
        let outcome = publisher(&mock).publish("Hello", &[]).await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Unknown error"));
    }

    #[tokio::test]
    async fn test_publish_transport_error() {
        let mock = MockGraph::new().with_publish_transport_error("100", "connection reset");
        let outcome = publisher(&mock).publish("Hello", &[]).await;

        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("connection reset"));
    }

    #[test]
    fn test_interpret_reply() {
        let ok = interpret_reply(
            "Page",
            Ok(GraphResponse::Success {
                id: "1_2".to_string(),
                fields: Default::default(),
            }),
        );
        assert_eq!(ok.url.as_deref(), Some("https://facebook.com/1_2"));

        let err = interpret_reply("Page", Err(GraphError::Network("timeout".to_string())));
        assert_eq!(err.error.as_deref(), Some("Network error: timeout"));
    }
}
