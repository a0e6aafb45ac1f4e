//! Coordinator - owns the shared context and both periodic drivers

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{Config, StorageBackend};
use crate::context::CoordinatorContext;
use crate::coordination::{CoordinationCycle, SystemStatus};
use crate::domain::{CrossPillarMessage, FeedbackCycle, RepositoryActivity, SystemActivity};
use crate::driver::PeriodicDriver;
use crate::error::{CoordError, Result};
use crate::events::EventBus;
use crate::exchange::{MessageSink, WebhookSink};
use crate::feedback::{AggregateMetrics, FeedbackScheduler};
use crate::health::{HealthProbe, HttpProbe};
use crate::repo::{self, RepositoryHost};
use crate::store::{FileStore, MemoryStore, Store};
use crate::strategy::{ActivityPicker, OpportunityDetector};

/// External collaborators and strategies the coordinator is built from
pub struct Collaborators {
    pub store: Arc<dyn Store>,
    pub repo_host: Arc<dyn RepositoryHost>,
    pub probe: Arc<dyn HealthProbe>,
    pub detector: Arc<dyn OpportunityDetector>,
    pub picker: Arc<dyn ActivityPicker>,
    pub sink: Option<Arc<dyn MessageSink>>,
}

impl Collaborators {
    /// Production collaborators for a validated config
    pub async fn from_config(config: &Config) -> Result<Self> {
        debug!("Collaborators::from_config: called");
        let store: Arc<dyn Store> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::File => Arc::new(FileStore::open(config.storage.resolved_dir()).await?),
        };
        let probe = HttpProbe::new(config.health.timeout()).map_err(|e| CoordError::Config(e.to_string()))?;
        let sink = WebhookSink::new(config.health.timeout()).map_err(|e| CoordError::Config(e.to_string()))?;
        let strategy = Arc::new(config.feedback.strategy());

        Ok(Self {
            store,
            repo_host: repo::from_config(&config.repository),
            probe: Arc::new(probe),
            detector: strategy.clone(),
            picker: strategy,
            sink: Some(Arc::new(sink)),
        })
    }
}

pub struct Coordinator {
    config: Config,
    ctx: Arc<CoordinatorContext>,
    coordination: Arc<CoordinationCycle>,
    feedback: Arc<FeedbackScheduler>,
    store: Arc<dyn Store>,
    drivers: Vec<PeriodicDriver>,
}

impl Coordinator {
    pub fn new(config: Config, collaborators: Collaborators, events: Arc<EventBus>) -> Self {
        debug!(pillars = config.pillars.len(), "Coordinator::new: called");
        let Collaborators {
            store,
            repo_host,
            probe,
            detector,
            picker,
            sink,
        } = collaborators;

        let ctx = Arc::new(CoordinatorContext::new(
            config.build_pillars(),
            probe,
            sink,
            &config.retention,
            events.clone(),
        ));
        let coordination = Arc::new(CoordinationCycle::new(ctx.clone(), picker));
        let feedback = Arc::new(
            FeedbackScheduler::new(detector, repo_host, store.clone(), events)
                .with_activity_retention(config.retention.repository_activity()),
        );

        Self {
            config,
            ctx,
            coordination,
            feedback,
            store,
            drivers: Vec::new(),
        }
    }

    /// Spawn the enabled drivers; no-op if already started
    pub fn start(&mut self) {
        if !self.drivers.is_empty() {
            debug!("Coordinator::start: already started");
            return;
        }
        if self.config.coordination.enabled {
            self.drivers
                .push(PeriodicDriver::spawn(self.coordination.clone(), self.config.coordination.interval()));
        }
        if self.config.feedback.enabled {
            self.drivers
                .push(PeriodicDriver::spawn(self.feedback.clone(), self.config.feedback.interval()));
        }
        info!(drivers = self.drivers.len(), "Coordinator started");
    }

    /// Stop both drivers, waiting for in-flight ticks to reach a terminal state
    pub async fn stop(&mut self) {
        debug!(drivers = self.drivers.len(), "Coordinator::stop: called");
        // Signal every driver before waiting on any, so none starts a tick
        // while another finishes its in-flight one
        for driver in &self.drivers {
            driver.signal_stop();
        }
        for driver in self.drivers.iter_mut() {
            driver.join().await;
        }
        self.drivers.clear();
        info!("Coordinator stopped");
    }

    pub fn is_started(&self) -> bool {
        !self.drivers.is_empty()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn context(&self) -> &Arc<CoordinatorContext> {
        &self.ctx
    }

    pub fn coordination(&self) -> &Arc<CoordinationCycle> {
        &self.coordination
    }

    pub fn feedback(&self) -> &Arc<FeedbackScheduler> {
        &self.feedback
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.ctx.events
    }

    // === Observability ===

    pub fn system_status(&self) -> SystemStatus {
        self.coordination.system_status()
    }

    pub fn recent_discussions(&self, n: usize) -> Vec<CrossPillarMessage> {
        self.coordination.recent_discussions(n)
    }

    pub fn recent_activities(&self, n: usize) -> Vec<SystemActivity> {
        self.coordination.recent_activities(n)
    }

    pub fn current_cycle(&self) -> Option<FeedbackCycle> {
        self.feedback.current_cycle()
    }

    pub fn cycle_history(&self) -> Vec<FeedbackCycle> {
        self.feedback.cycle_history()
    }

    pub fn recent_repository_activity(&self, n: usize) -> Vec<RepositoryActivity> {
        self.feedback.recent_repository_activity(n)
    }

    pub fn aggregate_metrics(&self) -> AggregateMetrics {
        self.feedback.aggregate_metrics()
    }
}
