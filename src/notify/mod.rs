//! Change notification port.
//!
//! Services publish a [`WorksheetUpdated`] event after every committed
//! mutation. Delivery is best effort: publishing never fails the operation
//! that triggered it and events are not replayed.

use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::debug;

use crate::models::{WORKSHEET_UPDATED, WorksheetUpdated};

/// Fire-and-forget sink for change events.
pub trait ChangePublisher: Send + Sync {
    /// Publishes an event. Must not block or fail.
    fn publish(&self, event: WorksheetUpdated);
}

/// Fans events out to every live subscriber over a tokio broadcast channel.
///
/// Slow subscribers lose the oldest events once the buffer is full.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<WorksheetUpdated>,
}

impl BroadcastPublisher {
    /// Creates a publisher with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<WorksheetUpdated> {
        self.sender.subscribe()
    }
}

impl ChangePublisher for BroadcastPublisher {
    fn publish(&self, event: WorksheetUpdated) {
        let group_id = event.group_id.clone();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(channel = WORKSHEET_UPDATED, group_id = %group_id, receivers, "Published change event");
            }
            Err(_) => {
                debug!(channel = WORKSHEET_UPDATED, group_id = %group_id, "No subscribers, change event dropped");
            }
        }
    }
}

/// Keeps every published event in memory for inspection.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<WorksheetUpdated>>,
}

impl RecordingPublisher {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events published so far.
    pub fn events(&self) -> Vec<WorksheetUpdated> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl ChangePublisher for RecordingPublisher {
    fn publish(&self, event: WorksheetUpdated) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeKind;
    use chrono::{NaiveDate, Utc};

    fn event(work_hour: Option<u32>) -> WorksheetUpdated {
        WorksheetUpdated {
            group_id: "group_a1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            work_hour,
            affected_workers: 3,
            change: ChangeKind::BatchUpdated,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let publisher = BroadcastPublisher::new(8);
        let mut receiver = publisher.subscribe();

        publisher.publish(event(Some(2)));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.work_hour, Some(2));
        assert_eq!(received.affected_workers, 3);
    }

    #[test]
    fn test_broadcast_without_subscribers_does_not_panic() {
        let publisher = BroadcastPublisher::new(8);
        publisher.publish(event(None));
    }

    #[test]
    fn test_recording_publisher_keeps_order() {
        let publisher = RecordingPublisher::new();
        publisher.publish(event(Some(1)));
        publisher.publish(event(Some(2)));
        let hours: Vec<Option<u32>> = publisher.events().iter().map(|e| e.work_hour).collect();
        assert_eq!(hours, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let json = serde_json::to_value(event(Some(4))).unwrap();
        assert_eq!(json["groupId"], "group_a1");
        assert_eq!(json["workHour"], 4);
        assert_eq!(json["affectedWorkers"], 3);
        assert_eq!(json["change"], "batch_updated");
    }
}
