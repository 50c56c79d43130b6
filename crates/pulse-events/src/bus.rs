use crate::types::{ChangeNotification, Collection};
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeNotification>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscription that only yields notifications for `collections`.
    /// An empty list watches everything.
    pub fn subscribe_to(&self, collections: &[Collection]) -> ChangeSubscription {
        ChangeSubscription {
            receiver: self.sender.subscribe(),
            collections: collections.to_vec(),
        }
    }

    /// Publishing with no live subscribers is not an error.
    pub fn publish(&self, notification: ChangeNotification) {
        if self.sender.send(notification).is_err() {
            debug!("change published with no subscribers");
        }
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSignal {
    Changed(ChangeNotification),
    /// The receiver fell behind and dropped this many notifications. Anything
    /// may have changed.
    Lagged(u64),
}

pub struct ChangeSubscription {
    receiver: broadcast::Receiver<ChangeNotification>,
    collections: Vec<Collection>,
}

impl ChangeSubscription {
    pub fn watches(&self, collection: Collection) -> bool {
        self.collections.is_empty() || self.collections.contains(&collection)
    }

    /// Waits for the next relevant signal; `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<ChangeSignal> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) if self.watches(notification.collection) => {
                    return Some(ChangeSignal::Changed(notification));
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    return Some(ChangeSignal::Lagged(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
