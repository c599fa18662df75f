//! # Report Transport
//!
//! Delivers serialized reports to the collection service.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{IgnitionError, Result};
use crate::report::Report;

/// Sends one report
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportTransport: Send + Sync {
    async fn send(&self, report: &Report) -> Result<()>;
}

/// Posts reports to the Flare HTTP API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new<B: Into<String>, K: Into<String>>(base_url: B, api_key: K) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/reports", self.base_url)
    }
}

#[async_trait]
impl ReportTransport for HttpTransport {
    async fn send(&self, report: &Report) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-token", &self.api_key)
            .header("Accept", "application/json")
            .json(report)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Error reading response".to_string());
            return Err(IgnitionError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(tracking_uuid = %report.tracking_uuid, status = %status, "Report delivered");
        Ok(())
    }
}
