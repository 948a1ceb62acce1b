//! HTTP client for the TinyPNG / Tinify compression API.
//!
//! Flusso: `POST /shrink` con i byte dell'immagine, poi download dell'output
//! (`GET <url>`) oppure conversione (`POST <url>` con `{"convert": ...}`).

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{CompressionService, ConvertedImage, OptimizedImage, ServiceError};
use crate::formats::TargetFormat;

#[derive(Debug, Deserialize)]
struct ShrinkResponse {
    output: ShrinkOutput,
}

#[derive(Debug, Deserialize)]
struct ShrinkOutput {
    size: u64,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

/// Tinify API client
pub struct TinifyClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl TinifyClient {
    pub fn new(api_key: &str, endpoint: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("asset-optimizer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Failure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn shrink_url(&self) -> String {
        format!("{}/shrink", self.endpoint)
    }

    async fn shrink(&self, data: Vec<u8>) -> Result<ShrinkOutput, ServiceError> {
        let response = self
            .client
            .post(self.shrink_url())
            .basic_auth("api", Some(&self.api_key))
            .body(data)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let shrink: ShrinkResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Failure(format!("invalid shrink response: {}", e)))?;
        debug!("Shrink result: {} bytes at {}", shrink.output.size, shrink.output.url);
        Ok(shrink.output)
    }
}

#[async_trait]
impl CompressionService for TinifyClient {
    async fn validate_credential(&self) -> Result<bool, ServiceError> {
        let response = self
            .client
            .post(self.shrink_url())
            .basic_auth("api", Some(&self.api_key))
            .send()
            .await
            .map_err(transport_error)?;

        validation_status(response.status())
    }

    async fn optimize(&self, data: Vec<u8>) -> Result<OptimizedImage, ServiceError> {
        let output = self.shrink(data).await?;

        let response = self
            .client
            .get(&output.url)
            .basic_auth("api", Some(&self.api_key))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(OptimizedImage::new(bytes.to_vec()))
    }

    async fn convert(&self, data: Vec<u8>, target: TargetFormat) -> Result<ConvertedImage, ServiceError> {
        let output = self.shrink(data).await?;

        let response = self
            .client
            .post(&output.url)
            .basic_auth("api", Some(&self.api_key))
            .json(&serde_json::json!({ "convert": { "type": target.mime_type() } }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let extension = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(extension_for_mime)
            .unwrap_or_else(|| target.extension())
            .to_string();

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(ConvertedImage {
            data: bytes.to_vec(),
            extension,
        })
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    ServiceError::Failure(format!("request failed: {}", e))
}

/// Map a non-success API status to a service error
fn status_error(status: StatusCode, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|e| format!("{}: {}", e.error, e.message))
        .unwrap_or_else(|_| body.trim().to_string());

    if status == StatusCode::TOO_MANY_REQUESTS {
        ServiceError::QuotaExceeded(message)
    } else {
        ServiceError::Failure(format!("HTTP {}: {}", status, message))
    }
}

/// An empty shrink request with a valid key fails with 400 (or 429 when over quota)
fn validation_status(status: StatusCode) -> Result<bool, ServiceError> {
    match status {
        StatusCode::UNAUTHORIZED => Ok(false),
        StatusCode::BAD_REQUEST | StatusCode::TOO_MANY_REQUESTS => Ok(true),
        s if s.is_success() => Ok(true),
        s => Err(ServiceError::Failure(format!("credential check failed: HTTP {}", s))),
    }
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.split(';').next()?.trim() {
        "image/webp" => Some("webp"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        _ => None,
    }
}
