//! Event Bus - broadcast channel for coordinator events
//!
//! Both drivers and the health monitor publish here. Late subscribers only
//! see what is emitted after they subscribe; a lagging subscriber loses the
//! oldest events rather than slowing the publishers down.

use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::types::CoordEvent;

/// Default channel capacity (events)
///
/// A three-pillar tick emits roughly a dozen events, so this holds many
/// minutes of history for a slow subscriber.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

pub struct EventBus {
    tx: broadcast::Sender<CoordEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: called");
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Publish an event; returns how many subscribers will see it
    pub fn emit(&self, event: CoordEvent) -> usize {
        trace!(event_type = event.event_type(), "EventBus::emit");
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordEvent> {
        debug!(subscribers = self.tx.receiver_count() + 1, "EventBus::subscribe: called");
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.emit(CoordEvent::CycleSkipped { active_sequence: None }), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let bus = EventBus::new(16);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.emit(CoordEvent::CycleStarted { sequence: 7 }), 2);

        for rx in [&mut first, &mut second] {
            match rx.recv().await.unwrap() {
                CoordEvent::CycleStarted { sequence } => assert_eq!(sequence, 7),
                other => panic!("Unexpected event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_lagging_subscriber_loses_oldest() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for sequence in 1..=4 {
            bus.emit(CoordEvent::CycleStarted { sequence });
        }

        assert!(matches!(rx.recv().await, Err(broadcast::error::RecvError::Lagged(2))));
        match rx.recv().await.unwrap() {
            CoordEvent::CycleStarted { sequence } => assert_eq!(sequence, 3),
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let bus = EventBus::new(0);
        let _rx = bus.subscribe();
        assert_eq!(bus.emit(CoordEvent::CycleStarted { sequence: 1 }), 1);
    }
}
