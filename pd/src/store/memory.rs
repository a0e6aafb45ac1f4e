//! In-memory store

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Store, StoreData, StoreResult};
use crate::domain::{MetricRecord, Opportunity, OpportunityPatch, Service};

/// Store backed by vectors behind a mutex. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with opportunities
    pub fn with_opportunities(opportunities: Vec<Opportunity>) -> Self {
        Self {
            data: Mutex::new(StoreData {
                opportunities,
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_metric(&self, kind: &str, value: f64, metadata: serde_json::Value) -> StoreResult<MetricRecord> {
        debug!(%kind, value, "MemoryStore::create_metric: called");
        let metric = MetricRecord::new(kind, value, metadata);
        self.data.lock().await.metrics.push(metric.clone());
        Ok(metric)
    }

    async fn get_opportunities(&self) -> StoreResult<Vec<Opportunity>> {
        Ok(self.data.lock().await.opportunities.clone())
    }

    async fn create_service(&self, service: Service) -> StoreResult<Service> {
        debug!(service_id = %service.id, "MemoryStore::create_service: called");
        self.data.lock().await.create_service(service)
    }

    async fn update_opportunity(&self, id: &str, patch: OpportunityPatch) -> StoreResult<Opportunity> {
        debug!(%id, ?patch, "MemoryStore::update_opportunity: called");
        self.data.lock().await.update_opportunity(id, &patch)
    }

    async fn add_opportunity(&self, opportunity: Opportunity) -> StoreResult<Opportunity> {
        self.data.lock().await.add_opportunity(opportunity)
    }

    async fn list_services(&self) -> StoreResult<Vec<Service>> {
        Ok(self.data.lock().await.services.clone())
    }

    async fn list_metrics(&self) -> StoreResult<Vec<MetricRecord>> {
        Ok(self.data.lock().await.metrics.clone())
    }
}
