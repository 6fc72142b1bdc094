//! "Data changed" signal for the display layer.
//!
//! The signal carries no payload. Subscribers re-pull through the tree
//! projector. Bursts of notifications between two reads collapse into one.

use tokio::sync::watch;

#[derive(Clone)]
pub struct ChangeNotifier {
    tx: watch::Sender<u64>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    pub fn notify(&self) {
        self.tx.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    /// Number of notifications fired so far.
    pub fn generation(&self) -> u64 {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

pub struct ChangeSubscription {
    rx: watch::Receiver<u64>,
}

impl ChangeSubscription {
    /// Wait for the next change. Returns `false` once the notifier is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Treat everything fired so far as already seen.
    pub fn mark_seen(&mut self) {
        self.rx.borrow_and_update();
    }

    /// Whether a change arrived since the last call to [`changed`](Self::changed).
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_sees_notification() {
        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe();
        assert!(!sub.has_changed());

        notifier.notify();
        assert!(sub.has_changed());
        assert!(sub.changed().await);
        assert!(!sub.has_changed());
        assert_eq!(notifier.generation(), 1);
    }

    #[tokio::test]
    async fn test_bursts_coalesce() {
        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe();
        notifier.notify();
        notifier.notify();
        notifier.notify();
        assert!(sub.changed().await);
        assert!(!sub.has_changed());
        assert_eq!(notifier.generation(), 3);
    }

    #[tokio::test]
    async fn test_mark_seen_clears_pending_change() {
        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe();
        notifier.notify();
        sub.mark_seen();
        assert!(!sub.has_changed());
    }

    #[tokio::test]
    async fn test_dropped_notifier_ends_subscription() {
        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe();
        drop(notifier);
        assert!(!sub.changed().await);
    }
}
