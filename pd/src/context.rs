//! CoordinatorContext - shared state handed to both drivers
//!
//! Pillar status, the message buffer and the activity log live here instead
//! of in globals. Each structure has its own lock.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::config::RetentionConfig;
use crate::domain::{Pillar, SystemActivity};
use crate::events::{CoordEvent, EventBus};
use crate::exchange::{MessageExchange, MessageSink};
use crate::health::{HealthMonitor, HealthProbe};
use crate::registry::PillarRegistry;
use crate::retention::{ACTIVITY_RETENTION, BoundedLog};

pub struct CoordinatorContext {
    pub registry: Arc<PillarRegistry>,
    pub health: Arc<HealthMonitor>,
    pub exchange: Arc<MessageExchange>,
    pub events: Arc<EventBus>,
    activities: Mutex<BoundedLog<SystemActivity>>,
}

impl CoordinatorContext {
    pub fn new(
        pillars: Vec<Pillar>,
        probe: Arc<dyn HealthProbe>,
        sink: Option<Arc<dyn MessageSink>>,
        retention: &RetentionConfig,
        events: Arc<EventBus>,
    ) -> Self {
        debug!(pillars = pillars.len(), "CoordinatorContext::new: called");
        let registry = Arc::new(PillarRegistry::new(pillars));
        let health = Arc::new(HealthMonitor::new(registry.clone(), probe, events.clone()));
        let mut exchange = MessageExchange::with_capacity(registry.clone(), events.clone(), retention.messages());
        if let Some(sink) = sink {
            exchange = exchange.with_sink(sink);
        }
        Self {
            registry,
            health,
            exchange: Arc::new(exchange),
            events,
            activities: Mutex::new(BoundedLog::new(retention.activities())),
        }
    }

    /// Append an activity, evicting the oldest past the cap
    pub fn record_activity(&self, activity: SystemActivity) {
        let event = CoordEvent::ActivityRecorded {
            pillar: activity.pillar.clone(),
            description: activity.description.clone(),
        };
        self.activities.lock().unwrap_or_else(|e| e.into_inner()).push(activity);
        self.events.emit(event);
    }

    /// The last `n` (at most 100) activities, most recent last
    pub fn recent_activities(&self, n: usize) -> Vec<SystemActivity> {
        self.activities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .recent(n.min(ACTIVITY_RETENTION))
    }

    pub fn activity_count(&self) -> usize {
        self.activities.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
