use serde_json::Value;
use std::time::Duration;

use super::error::ApiError;
use super::requests::ControlRequest;
use crate::backend::actions::{Bindings, ControlAction};
use crate::backend::error::{BridgeError, Result};

const PROBE_PATH: &str = "/queue";

/// HTTP client for the companion application's control API
#[derive(Debug, Clone)]
pub struct ControlApi {
    client: reqwest::Client,
    base_url: String,
}

impl ControlApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the API answers before enabling dispatch
    pub async fn probe(&self) -> Result<()> {
        let url = format!("{}{}", self.base_url, PROBE_PATH);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(BridgeError::HttpError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }
        Ok(())
    }

    /// Run one control operation and render the chat reply
    pub async fn execute(
        &self,
        action: &ControlAction,
        bindings: &Bindings,
    ) -> std::result::Result<String, ApiError> {
        let request = ControlRequest::build(action, bindings);
        let url = format!("{}{}", self.base_url, request.path());
        log::debug!("Control API {} -> GET {}", request.operation(), url);

        let failed = |cause: String| ApiError::new(request.operation(), cause, request.fallback_text());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(failed(format!("HTTP {}: {}", status, error_text)));
        }

        let text = response.text().await.map_err(|e| failed(e.to_string()))?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("Control API {} returned non-JSON body: {}", request.operation(), e);
                Value::Null
            })
        };

        Ok(request.success_text(&body))
    }
}
