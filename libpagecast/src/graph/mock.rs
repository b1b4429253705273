//! Mock Graph API for testing
//!
//! Records every call and answers with configurable replies, so the
//! publisher and runner can be exercised without credentials or network
//! access.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{FeedRequest, GraphApi, GraphResponse, GraphResult};
use crate::error::GraphError;
use crate::types::PageTarget;

/// One recorded call against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphCall {
    PageInfo {
        page_id: String,
    },
    Upload {
        page_id: String,
        path: PathBuf,
    },
    Publish {
        page_id: String,
        message: String,
        media_ids: Vec<String>,
    },
}

/// Scripted reply for a page's feed publishes
#[derive(Debug, Clone)]
enum PublishReply {
    Error(String),
    Malformed,
    Transport(String),
}

#[derive(Debug, Default)]
struct MockState {
    unreachable_pages: HashMap<String, String>,
    failing_uploads: HashSet<String>,
    publish_replies: HashMap<String, PublishReply>,
    calls: Vec<GraphCall>,
    next_id: u64,
}

impl MockState {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }
}

/// Mock Graph API
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the recorded calls through another.
#[derive(Debug, Clone, Default)]
pub struct MockGraph {
    state: Arc<Mutex<MockState>>,
}

impl MockGraph {
    /// A mock where every page is reachable and every call succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the connectivity check for `page_id` fail with an API error
    pub fn with_unreachable_page(self, page_id: &str, message: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .unreachable_pages
            .insert(page_id.to_string(), message.to_string());
        self
    }

    /// Make uploads of files named `file_name` fail with an API error
    pub fn with_failing_upload(self, file_name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_uploads
            .insert(file_name.to_string());
        self
    }

    /// Make feed publishes to `page_id` answer with an error object
    pub fn with_publish_error(self, page_id: &str, message: &str) -> Self {
        self.set_publish_reply(page_id, PublishReply::Error(message.to_string()))
    }

    /// Make feed publishes to `page_id` answer without an id or error
    pub fn with_malformed_publish(self, page_id: &str) -> Self {
        self.set_publish_reply(page_id, PublishReply::Malformed)
    }

    /// Make feed publishes to `page_id` fail at the transport level
    pub fn with_publish_transport_error(self, page_id: &str, message: &str) -> Self {
        self.set_publish_reply(page_id, PublishReply::Transport(message.to_string()))
    }

    fn set_publish_reply(self, page_id: &str, reply: PublishReply) -> Self {
        self.state
            .lock()
            .unwrap()
            .publish_replies
            .insert(page_id.to_string(), reply);
        self
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<GraphCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Recorded feed publishes, in order
    pub fn publish_calls(&self) -> Vec<GraphCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, GraphCall::Publish { .. }))
            .collect()
    }

    /// Number of upload attempts, including failed ones
    pub fn upload_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, GraphCall::Upload { .. }))
            .count()
    }

    fn record(&self, call: GraphCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn success(id: String, fields: Map<String, Value>) -> GraphResponse {
    GraphResponse::Success { id, fields }
}

#[async_trait]
impl GraphApi for MockGraph {
    async fn page_info(&self, page: &PageTarget) -> GraphResult<GraphResponse> {
        self.record(GraphCall::PageInfo {
            page_id: page.page_id.clone(),
        });

        let state = self.state.lock().unwrap();
        if let Some(message) = state.unreachable_pages.get(&page.page_id) {
            return Ok(GraphResponse::ApiError {
                message: message.clone(),
            });
        }

        let mut fields = Map::new();
        fields.insert("name".to_string(), json!(page.name));
        fields.insert("fan_count".to_string(), json!(1234));
        Ok(success(page.page_id.clone(), fields))
    }

    async fn upload_photo(&self, page: &PageTarget, path: &Path) -> GraphResult<GraphResponse> {
        self.record(GraphCall::Upload {
            page_id: page.page_id.clone(),
            path: path.to_path_buf(),
        });

        if !path.is_file() {
            return Err(GraphError::MissingFile(path.display().to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if state.failing_uploads.contains(&file_name) {
            return Ok(GraphResponse::ApiError {
                message: format!("Upload rejected: {}", file_name),
            });
        }

        let id = format!("photo-{}", state.next_id());
        Ok(success(id, Map::new()))
    }

    async fn publish_feed(
        &self,
        page: &PageTarget,
        request: &FeedRequest,
    ) -> GraphResult<GraphResponse> {
        self.record(GraphCall::Publish {
            page_id: page.page_id.clone(),
            message: request.message.clone(),
            media_ids: request
                .attached_media
                .iter()
                .map(|m| m.media_fbid.clone())
                .collect(),
        });

        let mut state = self.state.lock().unwrap();
        match state.publish_replies.get(&page.page_id).cloned() {
            Some(PublishReply::Error(message)) => Ok(GraphResponse::ApiError { message }),
            Some(PublishReply::Malformed) => Ok(GraphResponse::Malformed),
            Some(PublishReply::Transport(message)) => Err(GraphError::Network(message)),
            None => {
                let id = format!("{}_{}", page.page_id, state.next_id());
                Ok(success(id, Map::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let mock = MockGraph::new();
        let page = PageTarget::new("1", "token", "Test");

        mock.page_info(&page).await.unwrap();
        let reply = mock.publish_feed(&page, &FeedRequest::text("hi")).await.unwrap();

        assert!(reply.is_success());
        assert_eq!(
            mock.calls(),
            vec![
                GraphCall::PageInfo {
                    page_id: "1".to_string()
                },
                GraphCall::Publish {
                    page_id: "1".to_string(),
                    message: "hi".to_string(),
                    media_ids: vec![],
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_unreachable_page() {
        let mock = MockGraph::new().with_unreachable_page("2", "Invalid token");
        let page = PageTarget::new("2", "token", "Broken");

        assert_eq!(
            mock.page_info(&page).await.unwrap(),
            GraphResponse::ApiError {
                message: "Invalid token".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_mock_clones_share_state() {
        let mock = MockGraph::new();
        let handle = mock.clone();
        let page = PageTarget::new("1", "token", "Test");

        mock.publish_feed(&page, &FeedRequest::text("a")).await.unwrap();
        assert_eq!(handle.publish_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_upload_missing_file() {
        let mock = MockGraph::new();
        let page = PageTarget::new("1", "token", "Test");

        let result = mock.upload_photo(&page, Path::new("/nope/a.jpg")).await;
        assert!(matches!(result, Err(GraphError::MissingFile(_))));
        assert_eq!(mock.upload_count(), 1);
    }
}
