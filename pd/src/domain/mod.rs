//! Domain types for the coordinator
//!
//! - [`Pillar`]: an external system and its last known health
//! - [`FeedbackCycle`]: one run of the feedback pipeline
//! - [`CrossPillarMessage`]: directed message between pillars
//! - [`RepositoryActivity`], [`SystemActivity`]: retained activity logs
//! - [`Opportunity`], [`Service`], [`MetricRecord`]: records owned by storage

mod activity;
mod cycle;
pub mod id;
mod message;
mod opportunity;
mod pillar;

pub use activity::{Impact, RepositoryActivity, SystemActivity};
pub use cycle::{CycleStatus, FeedbackCycle};
pub use id::{generate_id, short_hex, slugify};
pub use message::{CrossPillarMessage, MessageKind};
pub use opportunity::{
    MetricRecord, Opportunity, OpportunityPatch, OpportunityStatus, Service, ServiceStatus,
};
pub use pillar::{Pillar, PillarStatus};
