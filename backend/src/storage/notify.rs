//! # Change Notification
//!
//! Storage publishes a [`ChangeEvent`] after every successful write. Consumers
//! subscribe to everything or to a single collection/document scope and
//! receive events in publish order.
//!
//! Domain services never subscribe themselves; wiring a subscription to a
//! re-computation (for example re-running roster sync when a roster changes)
//! is left to the application layer.

use log::{debug, warn};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::domain::models::MonthId;

/// Default number of events buffered per subscriber before it lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Collection or document an event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeScope {
    Groups,
    Users,
    Roster { group_id: String },
    Report { group_id: String, month: MonthId },
    Entries { group_id: String, month: MonthId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub scope: ChangeScope,
    /// Id of the document inside the scope, when the write targeted one.
    pub document_id: Option<String>,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(scope: ChangeScope, document_id: Option<&str>, kind: ChangeKind) -> Self {
        Self {
            scope,
            document_id: document_id.map(str::to_string),
            kind,
        }
    }
}

/// Broadcast hub for storage change events.
#[derive(Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        if self.sender.send(event).is_err() {
            debug!("Change event dropped: no subscribers");
        }
    }

    /// Subscribe to all events, or only to those in `scope`.
    pub fn subscribe(&self, scope: Option<ChangeScope>) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            scope,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Receiving end of a subscription. Dropping it unsubscribes.
pub struct Subscription {
    receiver: broadcast::Receiver<ChangeEvent>,
    scope: Option<ChangeScope>,
}

impl Subscription {
    /// Wait for the next matching event. Returns `None` once the notifier is
    /// gone. A subscriber that falls behind skips the missed events.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Change subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event already queued, without waiting.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Change subscriber lagged, skipped {} events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    fn matches(&self, event: &ChangeEvent) -> bool {
        self.scope.as_ref().map_or(true, |scope| *scope == event.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(group_id: &str) -> ChangeScope {
        ChangeScope::Roster {
            group_id: group_id.to_string(),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let notifier = ChangeNotifier::default();
        notifier.publish(ChangeEvent::new(ChangeScope::Groups, None, ChangeKind::Updated));
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_scoped_subscription_filters() {
        let notifier = ChangeNotifier::default();
        let mut all = notifier.subscribe(None);
        let mut g1 = notifier.subscribe(Some(roster("g1")));

        notifier.publish(ChangeEvent::new(roster("g2"), Some("ana"), ChangeKind::Created));
        notifier.publish(ChangeEvent::new(roster("g1"), Some("bia"), ChangeKind::Updated));

        let first = all.try_next().unwrap();
        assert_eq!(first.scope, roster("g2"));
        assert_eq!(all.try_next().unwrap().document_id.as_deref(), Some("bia"));
        assert!(all.try_next().is_none());

        let only = g1.try_next().unwrap();
        assert_eq!(only.scope, roster("g1"));
        assert_eq!(only.kind, ChangeKind::Updated);
        assert!(g1.try_next().is_none());
    }

    #[tokio::test]
    async fn test_next_waits_for_matching_event() {
        let notifier = ChangeNotifier::default();
        let mut sub = notifier.subscribe(Some(ChangeScope::Users));
        let publisher = notifier.clone();

        tokio::spawn(async move {
            publisher.publish(ChangeEvent::new(ChangeScope::Groups, None, ChangeKind::Updated));
            publisher.publish(ChangeEvent::new(ChangeScope::Users, Some("u1"), ChangeKind::Updated));
        });

        let event = sub.next().await.unwrap();
        assert_eq!(event.scope, ChangeScope::Users);
        assert_eq!(event.document_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_next_returns_none_when_closed() {
        let notifier = ChangeNotifier::new(4);
        let mut sub = notifier.subscribe(None);
        drop(notifier);
        assert!(sub.next().await.is_none());
    }
}
