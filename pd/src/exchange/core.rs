//! Message Exchange - bounded buffer of delivered cross-pillar messages

use std::sync::{Arc, Mutex};

use tracing::debug;

use super::webhook::MessageSink;
use crate::domain::{CrossPillarMessage, MessageKind, PillarStatus};
use crate::events::{CoordEvent, EventBus};
use crate::registry::PillarRegistry;
use crate::retention::{BoundedLog, MESSAGE_RETENTION};

/// Why a message was not delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    UnknownTarget,
    TargetNotOnline(PillarStatus),
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::UnknownTarget => write!(f, "unknown target"),
            DropReason::TargetNotOnline(status) => write!(f, "target {}", status),
        }
    }
}

/// Result of [`MessageExchange::send`]
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Delivered(CrossPillarMessage),
    Dropped(DropReason),
}

impl SendOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SendOutcome::Delivered(_))
    }
}

/// Directed message buffer shared by both drivers
///
/// Only messages whose target is online at send time are retained. Dropped
/// messages are never retried.
pub struct MessageExchange {
    registry: Arc<PillarRegistry>,
    buffer: Mutex<BoundedLog<CrossPillarMessage>>,
    sink: Option<Arc<dyn MessageSink>>,
    events: Arc<EventBus>,
}

impl MessageExchange {
    pub fn new(registry: Arc<PillarRegistry>, events: Arc<EventBus>) -> Self {
        Self::with_capacity(registry, events, MESSAGE_RETENTION)
    }

    /// Capacity is capped at [`MESSAGE_RETENTION`]
    pub fn with_capacity(registry: Arc<PillarRegistry>, events: Arc<EventBus>, capacity: usize) -> Self {
        Self {
            registry,
            buffer: Mutex::new(BoundedLog::new(capacity.min(MESSAGE_RETENTION))),
            sink: None,
            events,
        }
    }

    /// Forward delivered messages to `sink` as well
    pub fn with_sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Send a message from `source` to `target`
    ///
    /// The message is appended only if `target` is currently online.
    pub fn send(&self, source: &str, target: &str, kind: MessageKind, payload: serde_json::Value) -> SendOutcome {
        debug!(%source, %target, %kind, "MessageExchange::send: called");

        let pillar = match self.registry.get(target) {
            Some(pillar) if pillar.status.is_online() => pillar,
            Some(pillar) => return self.drop_message(source, target, kind, DropReason::TargetNotOnline(pillar.status)),
            None => return self.drop_message(source, target, kind, DropReason::UnknownTarget),
        };

        let message = CrossPillarMessage::new(source, target, kind, payload);
        {
            let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(evicted) = buffer.push(message.clone()) {
                debug!(evicted = %evicted.id, "MessageExchange::send: evicted oldest message");
            }
        }

        if let Some(sink) = &self.sink {
            sink.deliver(&pillar, &message);
        }

        self.events.emit(CoordEvent::MessageSent {
            message_id: message.id.clone(),
            source: source.to_string(),
            target: target.to_string(),
            kind,
        });
        SendOutcome::Delivered(message)
    }

    fn drop_message(&self, source: &str, target: &str, kind: MessageKind, reason: DropReason) -> SendOutcome {
        debug!(%source, %target, %kind, %reason, "MessageExchange::send: dropped");
        self.events.emit(CoordEvent::MessageDropped {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            reason: reason.to_string(),
        });
        SendOutcome::Dropped(reason)
    }

    /// The last `n` messages, most recent last
    pub fn recent(&self, n: usize) -> Vec<CrossPillarMessage> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).recent(n)
    }

    /// The last `n` messages of one kind, most recent last
    pub fn recent_of_kind(&self, kind: MessageKind, n: usize) -> Vec<CrossPillarMessage> {
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .recent_matching(n, |m| m.kind == kind)
    }

    /// Number of retained messages of one kind
    pub fn count_of_kind(&self, kind: MessageKind) -> usize {
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|m| m.kind == kind)
            .count()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pillar;
    use chrono::Utc;
    use serde_json::json;

    const STATUSES: [PillarStatus; 3] = [PillarStatus::Online, PillarStatus::Degraded, PillarStatus::Offline];

    fn registry() -> Arc<PillarRegistry> {
        Arc::new(PillarRegistry::new(vec![
            Pillar::new("hub", "http://hub.local", "/api/health"),
            Pillar::new("ecosystem", "http://eco.local", "/api/health"),
            Pillar::new("dao", "http://dao.local", "/api/health"),
        ]))
    }

    fn exchange(registry: Arc<PillarRegistry>) -> MessageExchange {
        MessageExchange::new(registry, Arc::new(EventBus::new(256)))
    }

    #[test]
    fn test_delivery_guard_all_combinations() {
        let names = ["hub", "ecosystem", "dao"];
        for source in names {
            for target in names {
                for source_status in STATUSES {
                    for target_status in STATUSES {
                        let registry = registry();
                        registry.record_check(source, source_status, Utc::now());
                        registry.record_check(target, target_status, Utc::now());
                        let exchange = exchange(registry.clone());

                        let outcome = exchange.send(source, target, MessageKind::EcosystemUpdate, json!({}));
                        let online = registry.status_of(target) == Some(PillarStatus::Online);
                        assert_eq!(outcome.is_delivered(), online);
                        assert_eq!(exchange.len(), usize::from(online));
                    }
                }
            }
        }
    }

    #[test]
    fn test_unknown_target_dropped() {
        let exchange = exchange(registry());
        let outcome = exchange.send("hub", "mining", MessageKind::MiningData, json!({}));
        assert_eq!(outcome, SendOutcome::Dropped(DropReason::UnknownTarget));
        assert!(exchange.is_empty());
    }

    #[test]
    fn test_offline_drop_is_not_retried() {
        let registry = registry();
        let exchange = exchange(registry.clone());
        exchange.send("hub", "dao", MessageKind::DaoProposal, json!({"id": 1}));

        registry.record_check("dao", PillarStatus::Online, Utc::now());
        assert!(exchange.is_empty());
    }

    #[test]
    fn test_buffer_keeps_last_fifty() {
        let registry = registry();
        registry.record_check("dao", PillarStatus::Online, Utc::now());
        let exchange = exchange(registry);

        for i in 0..MESSAGE_RETENTION + 5 {
            exchange.send("hub", "dao", MessageKind::Discussion, json!({"n": i}));
        }

        let retained = exchange.recent(MESSAGE_RETENTION + 5);
        assert_eq!(retained.len(), MESSAGE_RETENTION);
        let numbers: Vec<u64> = retained.iter().map(|m| m.payload["n"].as_u64().unwrap()).collect();
        let expected: Vec<u64> = (5..(MESSAGE_RETENTION + 5) as u64).collect();
        assert_eq!(numbers, expected);
    }

    #[test]
    fn test_recent_most_recent_last() {
        let registry = registry();
        registry.record_check("hub", PillarStatus::Online, Utc::now());
        let exchange = exchange(registry);

        exchange.send("dao", "hub", MessageKind::Discussion, json!({"n": 1}));
        exchange.send("dao", "hub", MessageKind::SystemActivity, json!({"n": 2}));
        exchange.send("dao", "hub", MessageKind::Discussion, json!({"n": 3}));

        let recent = exchange.recent(2);
        assert_eq!(recent[0].payload["n"], 2);
        assert_eq!(recent[1].payload["n"], 3);

        let discussions = exchange.recent_of_kind(MessageKind::Discussion, 5);
        assert_eq!(discussions.len(), 2);
        assert_eq!(exchange.count_of_kind(MessageKind::Discussion), 2);
    }

    #[test]
    fn test_capacity_never_exceeds_cap() {
        let exchange = MessageExchange::with_capacity(registry(), Arc::new(EventBus::new(4)), 10_000);
        assert_eq!(
            exchange.buffer.lock().unwrap().capacity(),
            MESSAGE_RETENTION
        );
    }

    #[test]
    fn test_sink_receives_delivered_only() {
        use std::sync::Mutex as StdMutex;

        #[derive(Default)]
        struct Recorder(StdMutex<Vec<String>>);
        impl MessageSink for Recorder {
            fn deliver(&self, target: &Pillar, _message: &CrossPillarMessage) {
                self.0.lock().unwrap().push(target.name.clone());
            }
        }

        let registry = registry();
        registry.record_check("hub", PillarStatus::Online, Utc::now());
        let recorder = Arc::new(Recorder::default());
        let exchange = exchange(registry).with_sink(recorder.clone());

        exchange.send("dao", "hub", MessageKind::Discussion, json!({}));
        exchange.send("hub", "dao", MessageKind::Discussion, json!({}));

        assert_eq!(*recorder.0.lock().unwrap(), vec!["hub".to_string()]);
    }
}
