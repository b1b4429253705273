//! HTTP implementation of [`GraphApi`]

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::{FeedRequest, GraphApi, GraphResponse, GraphResult, PAGE_FIELDS};
use crate::config::GraphSettings;
use crate::error::GraphError;
use crate::types::{ImageMimeType, PageTarget};

/// Graph API client backed by reqwest
///
/// Requests are sent once each. Every request carries its own timeout:
/// short for metadata reads, long for uploads, medium for feed publishes.
pub struct GraphClient {
    http: reqwest::Client,
    api_base: String,
    metadata_timeout: Duration,
    upload_timeout: Duration,
    publish_timeout: Duration,
}

impl GraphClient {
    pub fn new(settings: &GraphSettings) -> GraphResult<Self> {
        Self::from_builder(settings, reqwest::Client::builder())
    }

    fn from_builder(
        settings: &GraphSettings,
        builder: reqwest::ClientBuilder,
    ) -> GraphResult<Self> {
        let http = builder
            .user_agent(concat!("pagecast/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: settings.api_base(),
            metadata_timeout: settings.metadata_timeout,
            upload_timeout: settings.upload_timeout,
            publish_timeout: settings.publish_timeout,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, page_id: &str, edge: Option<&str>) -> String {
        match edge {
            Some(edge) => format!("{}/{}/{}", self.api_base, page_id, edge),
            None => format!("{}/{}", self.api_base, page_id),
        }
    }

    async fn decode(response: reqwest::Response) -> GraphResult<GraphResponse> {
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Graph API replied {} ({} bytes)", status, body.len());
        Ok(GraphResponse::from_http(status.is_success(), &body))
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn page_info(&self, page: &PageTarget) -> GraphResult<GraphResponse> {
        let url = self.url(&page.page_id, None);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("fields", PAGE_FIELDS), ("access_token", page.access_token())])
            .timeout(self.metadata_timeout)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn upload_photo(&self, page: &PageTarget, path: &Path) -> GraphResult<GraphResponse> {
        if !path.is_file() {
            return Err(GraphError::MissingFile(path.display().to_string()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| GraphError::Client(format!("failed to read {}: {}", path.display(), e)))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let mut source = Part::bytes(bytes).file_name(file_name);
        if let Some(mime) = ImageMimeType::from_path(path) {
            source = source.mime_str(mime.as_str())?;
        }

        let form = Form::new()
            .text("access_token", page.access_token().to_string())
            .text("published", "false")
            .part("source", source);

        let url = self.url(&page.page_id, Some("photos"));
        tracing::debug!("POST {} ({})", url, path.display());

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn publish_feed(
        &self,
        page: &PageTarget,
        request: &FeedRequest,
    ) -> GraphResult<GraphResponse> {
        let mut fields = request.form_fields()?;
        fields.push(("access_token", page.access_token().to_string()));

        let url = self.url(&page.page_id, Some("feed"));
        tracing::debug!(
            "POST {} ({} attached media)",
            url,
            request.attached_media.len()
        );

        let response = self
            .http
            .post(&url)
            .form(&fields)
            .timeout(self.publish_timeout)
            .send()
            .await?;

        Self::decode(response).await
    }
}
