use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::error::Result;

pub const UPDATE_EVENT: &str = "update_data";
const CHANNEL_CAPACITY: usize = 64;

/// Push channel towards dashboard clients.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns how many subscribers the event reached.
    async fn publish(&self, event: &str, payload: Value) -> Result<usize>;
}

/// Fans each event out to every connected WebSocket as
/// `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    tx: broadcast::Sender<String>,
}

impl BroadcastPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for BroadcastPublisher {
    async fn publish(&self, event: &str, payload: Value) -> Result<usize> {
        let message = json!({ "event": event, "data": payload }).to_string();
        // Zero subscribers reports 0 delivered.
        Ok(self.tx.send(message).unwrap_or(0))
    }
}
