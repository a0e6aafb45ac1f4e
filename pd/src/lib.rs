//! pillard - Cross-pillar coordinator
//!
//! Keeps a fixed set of independently deployed systems ("pillars") in view,
//! moves messages between them and runs a periodic feedback pipeline that
//! turns detected opportunities into services.
//!
//! # Core Concepts
//!
//! - **Two drivers**: the coordination cycle (health, messages, status) and the
//!   feedback scheduler (detect, materialize, convert, score) tick independently
//! - **One active cycle**: a feedback tick that finds a cycle running is skipped
//! - **Failures become status**: collaborator errors degrade a pillar or get
//!   logged; nothing escapes to crash the process
//! - **Bounded memory**: every in-memory log has a fixed cap with FIFO eviction
//!
//! # Modules
//!
//! - [`registry`] / [`health`] - pillar set and health monitoring
//! - [`exchange`] - cross-pillar message buffer with delivery guard
//! - [`converter`] - opportunity to service conversion
//! - [`feedback`] - feedback cycle scheduler
//! - [`coordination`] - coordination cycle and system status
//! - [`coordinator`] - facade owning both drivers
//! - [`ipc`] / [`cli`] - daemon surface

pub mod cli;
pub mod config;
pub mod context;
pub mod converter;
pub mod coordination;
pub mod coordinator;
pub mod domain;
pub mod driver;
pub mod error;
pub mod events;
pub mod exchange;
pub mod feedback;
pub mod health;
pub mod ipc;
pub mod registry;
pub mod render;
pub mod repo;
pub mod retention;
pub mod store;
pub mod strategy;

// Re-export commonly used types
pub use config::Config;
pub use context::CoordinatorContext;
pub use converter::{ConversionReport, OpportunityConverter, automation_level};
pub use coordination::{CoordinationConfig, CoordinationCycle, SystemStatus};
pub use coordinator::{Collaborators, Coordinator};
pub use domain::{
    CrossPillarMessage, CycleStatus, FeedbackCycle, Impact, MessageKind, Opportunity, OpportunityStatus, Pillar,
    PillarStatus, RepositoryActivity, Service, SystemActivity,
};
pub use driver::{PeriodicDriver, Tick};
pub use error::{CoordError, Result};
pub use events::{CoordEvent, EventBus, EventLogEntry, EventLogger};
pub use exchange::{MessageExchange, SendOutcome};
pub use feedback::{AggregateMetrics, CycleOutcome, FeedbackConfig, FeedbackScheduler, feedback_score};
pub use health::{HealthMonitor, HealthProbe, HttpProbe, ProbeOutcome};
pub use registry::PillarRegistry;
pub use repo::{GitHubHost, RepositoryHost};
pub use store::{FileStore, MemoryStore, Store, StoreError};
pub use strategy::{ActivityPicker, CatalogStrategy, FixedStrategy, OpportunityDetector};
