use tokio::sync::{Mutex, mpsc};

use crate::types::NavigationEvent;

/// Explicit fan-out queue for navigation intents.
///
/// Each subscriber owns an unbounded queue. An emitted event is pushed once
/// onto the queue of every subscriber alive at emission time, so delivery is
/// at most once and in emission order per subscriber. Events emitted before a
/// subscription are never replayed to it. Subscribers whose receiver was
/// dropped are pruned on the next emission.
#[derive(Default)]
pub struct NavigationEvents {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<NavigationEvent>>>,
}

impl NavigationEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<NavigationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().await.push(tx);
        rx
    }

    /// Delivers `event` and returns how many subscribers received it.
    pub async fn emit(&self, event: NavigationEvent) -> usize {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|tx| tx.send(event).is_ok());
        log::debug!("navigation {:?} delivered to {} subscribers", event, subscribers.len());
        subscribers.len()
    }
}
