//! HTTP fetch tool
//!
//! Fetches raw content from an HTTPS URL with the full safety policy:
//! HTTPS only, resolve-time private-network blocking, no redirects (a
//! redirect could point at a blocked destination), bounded timeout, and a
//! response size cap.

use super::url_guard::resolve_and_validate;
use async_trait::async_trait;
use sdk::tool::Tool;
use sdk::types::{ToolError, ToolId, ToolInput};
use serde_json::json;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RESPONSE_SIZE: usize = 64 * 1024;

pub struct HttpFetchTool {
    client: reqwest::Client,
}

impl HttpFetchTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for HttpFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for HttpFetchTool {
    fn id(&self) -> ToolId {
        ToolId::HttpFetch
    }

    async fn invoke(&self, input: &ToolInput) -> Result<serde_json::Value, ToolError> {
        let url = input.param_str("url")?;
        let validated = resolve_and_validate(url).await?;

        let response = self.client.get(validated.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::Timeout
            } else {
                ToolError::Http(format!("request failed: {}", e))
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ToolError::Http(format!("failed to read body: {}", e)))?;

        let truncated = bytes.len() > MAX_RESPONSE_SIZE;
        let capped = &bytes[..bytes.len().min(MAX_RESPONSE_SIZE)];

        let body = match std::str::from_utf8(capped) {
            Ok(text) => text.to_string(),
            Err(_) => format!("<binary data, {} bytes>", capped.len()),
        };

        Ok(json!({
            "status_code": status,
            "content_type": content_type,
            "body": body,
            "truncated": truncated,
            "url": validated.as_str(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_url_rejected() {
        let tool = HttpFetchTool::new();
        let err = tool.invoke(&ToolInput::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter(_)));
    }

    #[tokio::test]
    async fn test_http_url_rejected_before_any_request() {
        let tool = HttpFetchTool::new();
        let input = ToolInput::new().with_param("url", json!("http://example.com"));
        let err = tool.invoke(&input).await.unwrap_err();
        assert!(matches!(err, ToolError::UrlBlocked(_)));
    }

    #[tokio::test]
    async fn test_private_destination_rejected() {
        let tool = HttpFetchTool::new();
        let input = ToolInput::new().with_param("url", json!("https://127.0.0.1/secrets"));
        let err = tool.invoke(&input).await.unwrap_err();
        assert!(matches!(err, ToolError::UrlBlocked(_)));
    }
}
