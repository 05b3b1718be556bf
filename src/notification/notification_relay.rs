use tokio::sync::broadcast;
use tracing::debug;

use super::notification_models::{Notification, REMINDERS_CHANNEL};

/// Best-effort fan-out of reminder notifications to live subscribers.
#[derive(Clone)]
pub struct NotificationRelay {
    tx: broadcast::Sender<Notification>,
}

impl NotificationRelay {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Returns how many subscribers received the message. Zero is not an error.
    pub fn publish(&self, notification: Notification) -> usize {
        debug!(
            "Publishing {} on {} for reminder {}",
            notification.kind.event_name(),
            REMINDERS_CHANNEL,
            notification.reminder_id
        );
        self.tx.send(notification).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let relay = NotificationRelay::new(8);
        assert_eq!(relay.publish(Notification::completed(Uuid::new_v4())), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let relay = NotificationRelay::new(8);
        let mut rx1 = relay.subscribe();
        let mut rx2 = relay.subscribe();
        assert_eq!(relay.subscriber_count(), 2);

        let id = Uuid::new_v4();
        assert_eq!(relay.publish(Notification::error(id, "boom")), 2);

        let first = rx1.recv().await.unwrap();
        let second = rx2.recv().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.kind, NotificationKind::Error);
        assert_eq!(first.message, "Error processing reminder: boom");
    }
}
