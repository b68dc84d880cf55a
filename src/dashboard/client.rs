//! HTTP client for the Mission Control JSON API.
//!
//! Wraps the dashboard endpoints with [`reqwest`]. Each getter returns the
//! endpoint's payload only when the envelope reports success; a failed
//! envelope maps to `Ok(None)` so callers keep their previous state.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::focus::TodayFocus;
use super::types::{
    EnhancedData, EnhancedDataPayload, Envelope, Endpoint, HttpMethod, NioActivity,
    NioStatusPayload, PipelineRunResult, SessionInfo, SessionStatusPayload, SystemMetricsPayload,
};
use crate::config::DashboardConfig;

/// Errors from the dashboard HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum DashboardApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Dashboard API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// `success: false` from a user-triggered action.
    #[error("{endpoint} reported failure: {message}")]
    Rejected { endpoint: &'static str, message: String },
}

/// Result of a pipeline run followed by the dependent refresh.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run: PipelineRunResult,
    pub focus: TodayFocus,
}

/// HTTP client for one Mission Control instance.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    client: reqwest::Client,
    base_url: String,
}

impl DashboardClient {
    /// * `base_url` - e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DashboardApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, DashboardApiError> {
        Self::new(config.base_url.clone(), config.request_timeout)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    pub async fn nio_status(&self) -> Result<Option<NioActivity>, DashboardApiError> {
        let env: Envelope<NioStatusPayload> = self.fetch(Endpoint::NioStatus).await?;
        Ok(env.accepted().and_then(|p| p.activity))
    }

    /// Metrics plus incidents and cron health, as one payload.
    pub async fn system_metrics(&self) -> Result<Option<SystemMetricsPayload>, DashboardApiError> {
        let env: Envelope<SystemMetricsPayload> = self.fetch(Endpoint::SystemMetrics).await?;
        Ok(env.accepted().filter(|p| p.metrics.is_some()))
    }

    pub async fn session_status(&self) -> Result<Option<SessionInfo>, DashboardApiError> {
        let env: Envelope<SessionStatusPayload> = self.fetch(Endpoint::SessionStatus).await?;
        Ok(env.accepted().and_then(|p| p.data))
    }

    pub async fn enhanced_data(&self) -> Result<Option<EnhancedData>, DashboardApiError> {
        let env: Envelope<EnhancedDataPayload> = self.fetch(Endpoint::EnhancedData).await?;
        Ok(env.accepted().and_then(|p| p.data))
    }

    /// Fetch both focus inputs concurrently.
    pub async fn today_focus(&self) -> Result<TodayFocus, DashboardApiError> {
        let (enhanced, metrics) = tokio::join!(self.enhanced_data(), self.system_metrics());
        Ok(TodayFocus::from_payloads(
            enhanced?.as_ref(),
            metrics?.as_ref(),
        ))
    }

    /// Trigger the batch pipeline, then refresh the focus inputs.
    ///
    /// The server runs every step before responding, so the refresh sees the
    /// pipeline's output. A rejected run is still followed by a refresh.
    pub async fn run_pipeline(&self) -> Result<PipelineOutcome, DashboardApiError> {
        let env: Envelope<PipelineRunResult> = self.fetch(Endpoint::Pipeline).await?;
        let run = match env.accepted() {
            Some(run) => {
                tracing::info!(steps = ?run.steps, "Pipeline run completed");
                run
            }
            None => {
                tracing::error!("Pipeline run failed");
                PipelineRunResult::default()
            }
        };
        let focus = self.today_focus().await?;
        Ok(PipelineOutcome { run, focus })
    }

    /// Like [`run_pipeline`](Self::run_pipeline) but surfaces `success: false` as an error.
    pub async fn run_pipeline_strict(&self) -> Result<PipelineRunResult, DashboardApiError> {
        let env: Envelope<PipelineRunResult> = self.fetch(Endpoint::Pipeline).await?;
        if env.success {
            Ok(env.payload)
        } else {
            Err(DashboardApiError::Rejected {
                endpoint: Endpoint::Pipeline.name(),
                message: env.error.unwrap_or_else(|| "Pipeline run failed".to_string()),
            })
        }
    }

    // ---- private helpers ----

    async fn fetch<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, DashboardApiError> {
        let url = self.url(endpoint);
        let request = match endpoint.method() {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        tracing::debug!(endpoint = endpoint.name(), %url, "Fetching");
        let response = request.send().await?;
        Self::parse_response(response).await
    }

    /// Ensure the response has a success status code. The pipeline route
    /// answers 500 with a JSON envelope, so that body is still parsed.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DashboardApiError> {
        let status = response.status();
        if !status.is_success() && !status.is_server_error() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(DashboardApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DashboardApiError> {
        let status = response.status();
        let response = Self::ensure_success(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|_| DashboardApiError::ApiError {
            status: status.as_u16(),
            body,
        })
    }
}
