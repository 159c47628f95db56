use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::domain::ContactFormData;
use crate::config::LeadConfig;

/// Body returned by the lead intake endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeadReceipt {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Delivers a completed contact form to the lead intake endpoint.
#[async_trait]
pub trait LeadSubmitter: Send + Sync {
    async fn submit(&self, form: &ContactFormData) -> Result<LeadReceipt, TransportError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status}: {status_text}")]
    Http { status: u16, status_text: String },
    #[error("request did not complete: {0}")]
    Network(String),
}

/// JSON-over-HTTP submitter backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpLeadSubmitter {
    client: Client,
    endpoint: Url,
}

impl HttpLeadSubmitter {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &LeadConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.endpoint.clone(), config.timeout)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl LeadSubmitter for HttpLeadSubmitter {
    async fn submit(&self, form: &ContactFormData) -> Result<LeadReceipt, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(form)
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), endpoint = %self.endpoint, "lead endpoint responded");
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response
            .json::<LeadReceipt>()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))
    }
}
