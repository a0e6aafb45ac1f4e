//! Storage collaborator for metrics, opportunities and services
//!
//! The coordinator only needs a small CRUD surface. Two backends are provided:
//! an in-memory store (default, also used by tests) and a JSON file store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{MetricRecord, Opportunity, OpportunityPatch, Service};

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// CRUD surface consumed by the converter and the feedback scheduler
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a metric record
    async fn create_metric(&self, kind: &str, value: f64, metadata: serde_json::Value) -> StoreResult<MetricRecord>;

    /// All opportunities, in storage order
    async fn get_opportunities(&self) -> StoreResult<Vec<Opportunity>>;

    /// Persist a new service record
    async fn create_service(&self, service: Service) -> StoreResult<Service>;

    /// Apply a partial update to an opportunity
    async fn update_opportunity(&self, id: &str, patch: OpportunityPatch) -> StoreResult<Opportunity>;

    /// Insert an opportunity (seeding, external producers)
    async fn add_opportunity(&self, opportunity: Opportunity) -> StoreResult<Opportunity>;

    async fn list_services(&self) -> StoreResult<Vec<Service>>;

    async fn list_metrics(&self) -> StoreResult<Vec<MetricRecord>>;
}

/// The records held by a store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreData {
    pub opportunities: Vec<Opportunity>,
    pub services: Vec<Service>,
    pub metrics: Vec<MetricRecord>,
}

impl StoreData {
    pub fn update_opportunity(&mut self, id: &str, patch: &OpportunityPatch) -> StoreResult<Opportunity> {
        let opportunity = self
            .opportunities
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        opportunity.apply(patch);
        Ok(opportunity.clone())
    }

    pub fn add_opportunity(&mut self, opportunity: Opportunity) -> StoreResult<Opportunity> {
        if self.opportunities.iter().any(|o| o.id == opportunity.id) {
            return Err(StoreError::Rejected(format!("duplicate opportunity id {}", opportunity.id)));
        }
        self.opportunities.push(opportunity.clone());
        Ok(opportunity)
    }

    pub fn create_service(&mut self, service: Service) -> StoreResult<Service> {
        if self.services.iter().any(|s| s.id == service.id) {
            return Err(StoreError::Rejected(format!("duplicate service id {}", service.id)));
        }
        self.services.push(service.clone());
        Ok(service)
    }
}
