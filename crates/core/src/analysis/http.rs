use crate::analysis::{AnalysisClient, Outcome};
use crate::config::Settings;
use crate::domain::contract::{AnalyzeRequest, AnalyzeResponse, ErrorBody};
use crate::domain::Symbol;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const ANALYZE_PATH: &str = "/analyze";
const HEALTH_PATH: &str = "/health";

#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl HttpAnalysisClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(settings.analysis_base_url(), settings.analysis_timeout())
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim();
        anyhow::ensure!(!base_url.is_empty(), "analysis base url must be non-empty");

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build analysis http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Any `Err` here is a transport failure; known rejections come back as `Ok`.
    async fn fetch_once(&self, symbol: &Symbol) -> Result<Outcome> {
        let res = self
            .http
            .post(self.url(ANALYZE_PATH))
            .json(&AnalyzeRequest::for_symbol(symbol))
            .send()
            .await
            .context("analysis request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read analysis response body")?;

        match status {
            s if s.is_success() => {
                let parsed = serde_json::from_str::<AnalyzeResponse>(&text)
                    .with_context(|| format!("analysis response is not a valid record: {text}"))?;
                let record = parsed
                    .validate_and_into_record(symbol)
                    .context("analysis response failed validation")?;
                Ok(Outcome::Success(record))
            }
            StatusCode::BAD_REQUEST => {
                let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or_default();
                Ok(Outcome::Rejected {
                    reason: body.reason_or_fallback(),
                })
            }
            StatusCode::NOT_FOUND => Ok(Outcome::NotFound),
            _ => anyhow::bail!("analysis service HTTP {status}: {text}"),
        }
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let res = self
            .http
            .get(self.url(HEALTH_PATH))
            .send()
            .await
            .context("health request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read health response")?;
        anyhow::ensure!(status.is_success(), "analysis service HTTP {status}: {text}");

        serde_json::from_str::<HealthStatus>(&text)
            .with_context(|| format!("health response is not valid JSON: {text}"))
    }
}

#[async_trait::async_trait]
impl AnalysisClient for HttpAnalysisClient {
    fn provider_name(&self) -> &'static str {
        "http_json"
    }

    async fn request_analysis(&self, symbol: &Symbol) -> Outcome {
        match self.fetch_once(symbol).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let detail = format!("{err:#}");
                tracing::warn!(%symbol, error = %detail, "analysis request failed");
                Outcome::TransportFailure { detail }
            }
        }
    }
}
