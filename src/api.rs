use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::request::{CorrelationId, OutboundRequest};

const API_KEY_HEADER: &str = "X-API-Key";

/// Terminal result of one submission. There are no retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success(u16),
    /// Request never produced a response (DNS, refused, timeout).
    TransportFailure(String),
    RejectedStatus(u16),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success(_))
    }
}

/// Posts outbound requests to the configured API endpoint.
pub struct Dispatcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl Dispatcher {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Serialize the body. Failure here means the body type itself is broken.
    pub fn encode(request: &OutboundRequest) -> Result<Vec<u8>> {
        serde_json::to_vec(request).context("Failed to encode outbound request")
    }

    /// Submit `request` once. Only an encoding fault is returned as `Err`;
    /// every network result is a `DispatchOutcome`.
    pub async fn dispatch(
        &self,
        request: &OutboundRequest,
        rid: &CorrelationId,
    ) -> Result<DispatchOutcome> {
        let body = Self::encode(request)?;

        debug!("{} POST {} ({} bytes)", rid, self.endpoint, body.len());

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }

        let outcome = match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if status == 200 {
                    DispatchOutcome::Success(status)
                } else {
                    DispatchOutcome::RejectedStatus(status)
                }
            }
            Err(e) => DispatchOutcome::TransportFailure(e.to_string()),
        };

        Ok(outcome)
    }
}
