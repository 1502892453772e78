use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Result, SentinelError};
use crate::models::{ExecuteRequest, ExecuteResponse, ScoreRequest, ScoreResponse, TransactionRecord};

/// Thin wrapper over the remote payment service. Every call maps non-2xx
/// statuses and malformed bodies to typed errors; callers decide whether
/// a failure is fatal.
pub struct ApiClient {
    http: Client,
    base: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(ApiClient {
            http,
            base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub async fn check_risk(&self, request: &ScoreRequest) -> Result<ScoreResponse> {
        let response = self
            .http
            .post(format!("{}/check-risk", self.base))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SentinelError::Api(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    pub async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse> {
        let response = self
            .http
            .post(format!("{}/pay", self.base))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SentinelError::Api(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    pub async fn user_history(&self, user_id: &str) -> Result<Vec<TransactionRecord>> {
        let response = self
            .http
            .get(format!("{}/history/{user_id}", self.base))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SentinelError::Api(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }

    pub async fn recent_transactions(&self) -> Result<Vec<TransactionRecord>> {
        let response = self
            .http
            .get(format!("{}/transactions", self.base))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SentinelError::Api(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}
