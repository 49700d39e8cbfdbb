//! Broadcast bus for distributing `TurnEvent` to multiple subscribers.
//!
//! Built on `tokio::sync::broadcast`. Publishing with no active subscribers
//! is a no-op, and a lagged subscriber loses old events rather than applying
//! backpressure to the reasoning loop.

use patter_types::event::TurnEvent;
use tokio::sync::broadcast;

/// Multi-consumer bus for turn telemetry.
///
/// Wraps a `tokio::sync::broadcast` channel. Cloning the bus clones the
/// sender, so the runner, resolver, and orchestrator can all publish to the
/// same stream.
pub struct EventBus {
    sender: broadcast::Sender<TurnEvent>,
}

impl EventBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a subscriber that receives all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<TurnEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no subscribers the event is silently dropped; emission
    /// failure is never surfaced to the caller.
    pub fn publish(&self, event: TurnEvent) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_event() -> TurnEvent {
        TurnEvent::IterationStarted {
            turn_id: Uuid::now_v7(),
            iteration: 1,
        }
    }

    #[tokio::test]
    async fn publish_and_subscribe_delivers_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(sample_event());

        let received = rx.recv().await.unwrap();
        assert!(matches!(
            received,
            TurnEvent::IterationStarted { iteration: 1, .. }
        ));
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(sample_event());

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_a_noop() {
        let bus = EventBus::new(16);
        bus.publish(sample_event());
        bus.publish(sample_event());
        assert_eq!(bus.receiver_count(), 0);
    }

    #[tokio::test]
    async fn lagged_receiver_loses_events_without_blocking_publisher() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();

        let turn_id = Uuid::now_v7();
        for iteration in 0..10 {
            bus.publish(TurnEvent::IterationStarted { turn_id, iteration });
        }

        match rx.try_recv() {
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn clone_shares_channel() {
        let bus = EventBus::new(16);
        let bus2 = bus.clone();
        let mut rx = bus.subscribe();

        bus2.publish(sample_event());

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn events_carry_turn_scope() {
        let event = sample_event();
        assert!(event.turn_id().is_some());

        let domain_scoped = TurnEvent::ProviderResolutionFailed {
            domain: "shop.example.com".to_string(),
            detectors_tried: 2,
        };
        assert!(domain_scoped.turn_id().is_none());
    }
}
