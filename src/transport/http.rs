//! HTTP transport: POSTs the envelope as one JSON:API request.
//!
//! Uses `ureq` (sync) inside `tokio::task::spawn_blocking` so the caller's
//! runtime is never blocked while the single request is in flight.

use super::{Transport, TransportConfig};
use crate::error::TransportError;
use crate::wire::{BatchResponse, WireEnvelope};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

pub struct HttpTransport {
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn agent(&self) -> ureq::Agent {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(self.config.timeout_secs.map(Duration::from_secs))
            .build();
        ureq::Agent::new_with_config(config)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_batch(&self, envelope: &WireEnvelope) -> Result<BatchResponse, TransportError> {
        let url = self.config.batch_url();
        let payload = serde_json::to_string(envelope)
            .map_err(|e| TransportError::Decode(format!("could not encode envelope: {}", e)))?;
        let auth_token = self.config.auth_token.clone();
        let agent = self.agent();

        info!(url = %url, operations = envelope.len(), "sending batch");

        let join_url = url.clone();
        let (status, body) = tokio::task::spawn_blocking(move || {
            let mut request = agent
                .post(&url)
                .header("Content-Type", JSON_API_MEDIA_TYPE)
                .header("Accept", JSON_API_MEDIA_TYPE);
            if let Some(ref token) = auth_token {
                request = request.header("Authorization", &format!("Bearer {}", token));
            }

            let response = request.send(payload).map_err(|e| TransportError::Request {
                url: url.clone(),
                message: e.to_string(),
            })?;
            let status = response.status().as_u16();
            let body = response
                .into_body()
                .read_to_string()
                .map_err(|e| TransportError::Decode(format!("could not read response body: {}", e)))?;
            Ok::<_, TransportError>((status, body))
        })
        .await
        .map_err(|e| TransportError::Request {
            url: join_url,
            message: format!("task join error: {}", e),
        })??;

        debug!(status, bytes = body.len(), "received batched response");

        if !(200..300).contains(&status) {
            return Err(TransportError::Status {
                status,
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
