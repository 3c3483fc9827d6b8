//! Event publishing port.
//!
//! Resource creation announces itself to the rest of the platform through
//! this interface. Publishing is best effort: handlers log a failed publish
//! and respond successfully anyway, so a broker outage never turns into a
//! failed write for the client.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error as ThisError;
use tracing::debug;

#[derive(Debug, ThisError)]
#[error("publish to `{topic}` failed: {reason}")]
pub struct PublishError {
    pub topic: String,
    pub reason: String,
}

/// Where creation events go. Implementations must be cheap to call on the
/// request path.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Publisher that drops everything, for deployments without a broker.
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        debug!(topic = topic, bytes = payload.len(), "event dropped, no publisher configured");
        Ok(())
    }
}

/// Publisher that records events in memory, for tests and demos.
#[derive(Default)]
pub struct BufferPublisher {
    events: Mutex<Vec<(String, Vec<u8>)>>,
}

impl BufferPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `(topic, payload)` pairs published so far, in order.
    pub fn events(&self) -> Vec<(String, Vec<u8>)> {
        self.events.lock().expect("publisher lock poisoned").clone()
    }
}

#[async_trait]
impl EventPublisher for BufferPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        self.events
            .lock()
            .expect("publisher lock poisoned")
            .push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }
}
