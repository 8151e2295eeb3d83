//! Alert feed
//!
//! Broadcast-backed subscription the dispatcher drains. A slow dispatcher
//! skips lagged batches rather than processing stale alerts; a closed
//! channel ends the feed.

use log::warn;
use tokio::sync::broadcast;

use courier_core::{AlertBatch, DispatchError};

pub struct AlertFeed {
    receiver: broadcast::Receiver<AlertBatch>,
}

/// Creates a feed and the sender side the transport publishes into.
pub fn channel(capacity: usize) -> (broadcast::Sender<AlertBatch>, AlertFeed) {
    let (sender, receiver) = broadcast::channel(capacity);
    (sender, AlertFeed { receiver })
}

impl AlertFeed {
    pub fn new(receiver: broadcast::Receiver<AlertBatch>) -> Self {
        AlertFeed { receiver }
    }

    /// Next batch, or `None` once all senders are gone.
    pub async fn recv(&mut self) -> Option<AlertBatch> {
        loop {
            match self.receiver.recv().await {
                Ok(batch) => return Some(batch),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("alert feed lagging, skipped {skipped} batch(es)");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Parses a raw transport payload into a batch.
pub fn parse_batch(payload: &str) -> Result<AlertBatch, DispatchError> {
    serde_json::from_str(payload)
        .map_err(|err| DispatchError::Validation(format!("unparseable alert payload: {err}")))
}
