//! HTTP sink posting batches as JSON

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::{ExportError, ExportResult};
use crate::sink::{BatchReport, DocumentFailure, ExportDocument, ExportSink};

/// Configuration for the HTTP sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpSinkConfig {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl HttpSinkConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            timeout_secs: default_timeout_secs(),
            bearer_token: None,
        }
    }
}

/// Body an endpoint may answer with to reject single documents
#[derive(Debug, Default, Deserialize)]
struct EndpointResponse {
    #[serde(default)]
    failed: Vec<DocumentFailure>,
}

/// POSTs every batch as a JSON array to an endpoint
#[derive(Debug)]
pub struct HttpSink {
    config: HttpSinkConfig,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(config: HttpSinkConfig) -> ExportResult<Self> {
        let client = Self::create_default_client().map_err(|e| ExportError::Network {
            url: config.url.clone(),
            error: e.to_string(),
        })?;
        Ok(Self { config, client })
    }

    pub fn with_client(config: HttpSinkConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// HTTP client with rustls and connection timeouts
    pub fn create_default_client() -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .user_agent(concat!("surge-export/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}

#[async_trait]
impl ExportSink for HttpSink {
    async fn export(&self, batch: &[ExportDocument]) -> ExportResult<BatchReport> {
        let started = Instant::now();
        let url = self.config.url.as_str();

        let mut request = self
            .client
            .post(url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(batch);
        for (name, value) in &self.config.headers {
            request = request.header(name, value);
        }
        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ExportError::Network {
            url: url.to_string(),
            error: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            tracing::warn!(
                target: "export",
                url = %url,
                status = status.as_u16(),
                "Export endpoint rejected batch"
            );
            return Err(ExportError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                response: body,
            });
        }

        let failures = serde_json::from_str::<EndpointResponse>(&body)
            .map(|parsed| parsed.failed)
            .unwrap_or_default();
        let mut report = BatchReport::accepted(
            self.sink_type(),
            batch.len().saturating_sub(failures.len()),
            started.elapsed(),
        )
        .with_location(url);
        report.failures = failures;
        Ok(report)
    }

    fn validate_config(&self) -> ExportResult<()> {
        let parsed = url::Url::parse(&self.config.url)
            .map_err(|e| ExportError::InvalidConfig(format!("invalid url '{}': {}", self.config.url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ExportError::InvalidConfig(format!(
                "unsupported url scheme '{}'",
                other
            ))),
        }
    }

    fn sink_type(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config() {
        let sink = HttpSink::new(HttpSinkConfig::new("https://metrics.example.com/bulk")).unwrap();
        assert!(sink.validate_config().is_ok());

        let sink = HttpSink::new(HttpSinkConfig::new("ftp://example.com")).unwrap();
        assert!(sink.validate_config().is_err());

        let sink = HttpSink::new(HttpSinkConfig::new("not a url")).unwrap();
        assert!(sink.validate_config().is_err());
    }
}
