//! Currency-change notifications.

use serde::{Deserialize, Serialize};
use storefront_common::CurrencyCode;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 16;

/// The shopper picked a new display currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyChange {
    pub currency: CurrencyCode,
}

/// Broadcast channel for [`CurrencyChange`] events.
#[derive(Debug, Clone)]
pub struct CurrencyBus {
    sender: broadcast::Sender<CurrencyChange>,
}

impl CurrencyBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Announce a change. Returns the number of subscribers reached.
    pub fn publish(&self, currency: CurrencyCode) -> usize {
        self.sender.send(CurrencyChange { currency }).unwrap_or(0)
    }

    pub fn subscribe(&self) -> CurrencySubscription {
        let subscription = CurrencySubscription {
            id: Uuid::new_v4(),
            receiver: self.sender.subscribe(),
        };
        debug!(subscription_id = %subscription.id, "Currency subscription opened");
        subscription
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for CurrencyBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Receiving end of a [`CurrencyBus`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct CurrencySubscription {
    id: Uuid,
    receiver: broadcast::Receiver<CurrencyChange>,
}

impl CurrencySubscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next change, or `None` once every publisher is gone.
    ///
    /// A subscriber that falls behind skips the events it missed and carries
    /// on with the ones still buffered.
    pub async fn recv(&mut self) -> Option<CurrencyChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(subscription_id = %self.id, skipped, "Currency subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        debug!(subscription_id = %self.id, "Currency subscription closed");
    }
}
