//! Facebook Graph API access
//!
//! The three Graph operations the publisher needs are expressed by the
//! [`GraphApi`] trait. [`client::GraphClient`] talks to the real endpoint
//! over HTTP; [`mock::MockGraph`] is a scriptable stand-in for tests.
//!
//! Every reply body is decoded into a [`GraphResponse`] so the rules for
//! "what counts as success" live in one place.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GraphError;
use crate::types::{PageTarget, UploadedMedia};

pub mod client;
// Mock is available for all builds to support integration tests
pub mod mock;

pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Message used when a reply has neither an id nor an error object
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Fields requested by the connectivity check
pub const PAGE_FIELDS: &str = "name,fan_count";

/// Graph API operations used for publishing to a page
///
/// Transport failures (connection errors, timeouts, unreadable local
/// files) are returned as `Err`. Anything the server answered, including
/// API error objects, is returned as `Ok` with the decoded reply.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// `GET /{page-id}?fields=name,fan_count`
    async fn page_info(&self, page: &PageTarget) -> GraphResult<GraphResponse>;

    /// `POST /{page-id}/photos` with `published=false`
    async fn upload_photo(&self, page: &PageTarget, path: &Path) -> GraphResult<GraphResponse>;

    /// `POST /{page-id}/feed`
    async fn publish_feed(
        &self,
        page: &PageTarget,
        request: &FeedRequest,
    ) -> GraphResult<GraphResponse>;
}

/// Decoded Graph API reply
#[derive(Debug, Clone, PartialEq)]
pub enum GraphResponse {
    /// The object id plus every other top-level field of the reply
    Success { id: String, fields: Map<String, Value> },
    /// The reply carried an `error` object
    ApiError { message: String },
    /// Anything else: not JSON, no id, or a failed status without details
    Malformed,
}

impl GraphResponse {
    /// Decode a reply body
    ///
    /// An `error` object wins over everything else. A non-success status
    /// without an error object is treated as malformed.
    pub fn from_http(status_ok: bool, body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(status_ok, value),
            Err(_) => GraphResponse::Malformed,
        }
    }

    fn from_value(status_ok: bool, value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return GraphResponse::Malformed;
        };

        if let Some(error) = fields.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_ERROR)
                .to_string();
            return GraphResponse::ApiError { message };
        }

        if !status_ok {
            return GraphResponse::Malformed;
        }

        let id = match fields.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => id,
            Some(Value::Number(id)) => id.to_string(),
            _ => return GraphResponse::Malformed,
        };

        GraphResponse::Success { id, fields }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GraphResponse::Success { .. })
    }

    /// Id and fields of a successful reply; errors and malformed replies
    /// become [`GraphError::Api`]
    pub fn into_result(self) -> GraphResult<(String, Map<String, Value>)> {
        match self {
            GraphResponse::Success { id, fields } => Ok((id, fields)),
            GraphResponse::ApiError { message } => Err(GraphError::Api(message)),
            GraphResponse::Malformed => Err(GraphError::Api(UNKNOWN_ERROR.to_string())),
        }
    }
}

/// Reference to a staged photo inside `attached_media`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub media_fbid: String,
}

/// Body of a feed publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub message: String,
    pub attached_media: Vec<MediaRef>,
}

impl FeedRequest {
    pub fn text(message: &str) -> Self {
        Self {
            message: message.to_string(),
            attached_media: Vec::new(),
        }
    }

    /// Message plus staged photos, in upload order
    pub fn with_media(message: &str, media: &[UploadedMedia]) -> Self {
        Self {
            message: message.to_string(),
            attached_media: media
                .iter()
                .map(|m| MediaRef {
                    media_fbid: m.media_id.clone(),
                })
                .collect(),
        }
    }

    /// Form fields, without the access token
    ///
    /// `attached_media` is sent as a JSON array such as
    /// `[{"media_fbid":"1"},{"media_fbid":"2"}]` and omitted when empty.
    pub fn form_fields(&self) -> GraphResult<Vec<(&'static str, String)>> {
        let mut fields = vec![("message", self.message.clone())];
        if !self.attached_media.is_empty() {
            let encoded = serde_json::to_string(&self.attached_media)
                .map_err(|e| GraphError::Client(format!("encode attached_media: {}", e)))?;
            fields.push(("attached_media", encoded));
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_decode_success_keeps_fields() {
        let response = GraphResponse::from_http(
            true,
            r#"{"id":"123","name":"Bakery","fan_count":1500}"#,
        );
        match response {
            GraphResponse::Success { id, fields } => {
                assert_eq!(id, "123");
                assert_eq!(fields.get("name").and_then(Value::as_str), Some("Bakery"));
                assert_eq!(fields.get("fan_count").and_then(Value::as_u64), Some(1500));
                assert!(!fields.contains_key("id"));
            }
            other => panic!("Expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_numeric_id() {
        let response = GraphResponse::from_http(true, r#"{"id":42}"#);
        assert_eq!(response.into_result().unwrap().0, "42");
    }

    #[test]
    fn test_decode_error_object() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190}}"#;
        assert_eq!(
            GraphResponse::from_http(false, body),
            GraphResponse::ApiError {
                message: "Invalid OAuth access token.".to_string()
            }
        );
    }

    #[test]
    fn test_error_object_wins_over_id() {
        let body = r#"{"id":"1","error":{"message":"partial"}}"#;
        assert!(matches!(
            GraphResponse::from_http(true, body),
            GraphResponse::ApiError { .. }
        ));
    }

    #[test]
    fn test_error_object_without_message() {
        let response = GraphResponse::from_http(false, r#"{"error":{}}"#);
        assert_eq!(
            response,
            GraphResponse::ApiError {
                message: UNKNOWN_ERROR.to_string()
            }
        );
    }

    #[test]
    fn test_decode_malformed_shapes() {
        assert_eq!(GraphResponse::from_http(true, "<html>"), GraphResponse::Malformed);
        assert_eq!(GraphResponse::from_http(true, "[]"), GraphResponse::Malformed);
        assert_eq!(GraphResponse::from_http(true, r#"{"success":true}"#), GraphResponse::Malformed);
        assert_eq!(GraphResponse::from_http(true, r#"{"id":""}"#), GraphResponse::Malformed);
        assert_eq!(GraphResponse::from_http(false, r#"{"id":"1"}"#), GraphResponse::Malformed);
    }

    #[test]
    fn test_malformed_into_result_is_unknown_error() {
        let err = GraphResponse::Malformed.into_result().unwrap_err();
        assert_eq!(err.to_string(), UNKNOWN_ERROR);
    }

    #[test]
    fn test_text_request_has_no_media_field() {
        let fields = FeedRequest::text("Hello").form_fields().unwrap();
        assert_eq!(fields, vec![("message", "Hello".to_string())]);
    }

    #[test]
    fn test_attached_media_wire_format() {
        let media = vec![
            UploadedMedia {
                path: PathBuf::from("images/a.jpg"),
                media_id: "111".to_string(),
            },
            UploadedMedia {
                path: PathBuf::from("images/b.png"),
                media_id: "222".to_string(),
            },
        ];
        let fields = FeedRequest::with_media("With photos", &media)
            .form_fields()
            .unwrap();

        assert_eq!(fields[0], ("message", "With photos".to_string()));
        assert_eq!(
            fields[1],
            (
                "attached_media",
                r#"[{"media_fbid":"111"},{"media_fbid":"222"}]"#.to_string()
            )
        );
    }
}
