//! Tokio broadcast bus for sync lifecycle events.

use crate::models::SyncEvent;
use tokio::sync::broadcast;

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 256;

/// Broadcasts [`SyncEvent`]s to any number of subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SyncEvent>,
}

/// Receiver that only yields events matching a predicate.
pub struct FilteredReceiver<F> {
    receiver: broadcast::Receiver<SyncEvent>,
    predicate: F,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event (best effort; dropped when nobody listens).
    pub fn publish(&self, event: SyncEvent) {
        metrics::counter!("quote_events_published_total", "event" => event.event_type())
            .increment(1);
        if self.sender.send(event).is_err() {
            metrics::counter!("quote_events_dropped_total").increment(1);
        }
    }

    /// Subscribes to every event.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    /// Subscribes with a predicate.
    #[must_use]
    pub fn subscribe_filtered<F>(&self, predicate: F) -> FilteredReceiver<F>
    where
        F: Fn(&SyncEvent) -> bool,
    {
        FilteredReceiver {
            receiver: self.sender.subscribe(),
            predicate,
        }
    }

    /// Subscribes to a single event type, as named by [`SyncEvent::event_type`].
    #[must_use]
    pub fn subscribe_event_type(
        &self,
        event_type: &'static str,
    ) -> FilteredReceiver<impl Fn(&SyncEvent) -> bool> {
        self.subscribe_filtered(move |event| event.event_type() == event_type)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUS_CAPACITY)
    }
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&SyncEvent) -> bool,
{
    /// Receives the next matching event. Lagged events are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`broadcast::error::RecvError::Closed`] once every sender is gone.
    pub async fn recv(&mut self) -> Result<SyncEvent, broadcast::error::RecvError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if (self.predicate)(&event) => return Ok(event),
                Ok(_) => {},
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    metrics::counter!("quote_events_lagged_total").increment(skipped);
                },
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConflictPolicy;
    use chrono::Utc;

    #[tokio::test]
    async fn test_subscribe_event_type_skips_others() {
        let bus = EventBus::new(16);
        let mut completed = bus.subscribe_event_type("completed");

        bus.publish(SyncEvent::Coalesced);
        bus.publish(SyncEvent::Completed {
            policy: ConflictPolicy::Merge,
            new_count: 2,
            conflict_count: 0,
            merged_at: Utc::now(),
        });

        let event = completed.recv().await.expect("receive event");
        assert!(matches!(event, SyncEvent::Completed { new_count: 2, .. }));
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::default();
        bus.publish(SyncEvent::SchedulerStopped);
    }
}
