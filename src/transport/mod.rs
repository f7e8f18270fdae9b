//! The network collaborator: one request, one response per batch.

pub mod config;
pub mod http;

use crate::error::TransportError;
use crate::wire::{BatchResponse, WireEnvelope};
use async_trait::async_trait;

pub use config::TransportConfig;
pub use http::HttpTransport;

/// Carries a compiled envelope to the backend and brings back its batched
/// response.
///
/// Implementations own authentication and any retry or timeout policy; the
/// executor calls `send_batch` exactly once per `send`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_batch(&self, envelope: &WireEnvelope) -> Result<BatchResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send_batch(&self, envelope: &WireEnvelope) -> Result<BatchResponse, TransportError> {
        (**self).send_batch(envelope).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send_batch(&self, envelope: &WireEnvelope) -> Result<BatchResponse, TransportError> {
        (**self).send_batch(envelope).await
    }
}
