//! JSON file store
//!
//! Keeps the same records as [`MemoryStore`](super::MemoryStore) and mirrors
//! each collection to `<dir>/{opportunities,services,metrics}.json` after every
//! mutation. Files are replaced atomically (write to a temp file, then rename).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Store, StoreData, StoreResult};
use crate::domain::{MetricRecord, Opportunity, OpportunityPatch, Service};

const OPPORTUNITIES_FILE: &str = "opportunities.json";
const SERVICES_FILE: &str = "services.json";
const METRICS_FILE: &str = "metrics.json";

pub struct FileStore {
    dir: PathBuf,
    data: Mutex<StoreData>,
}

impl FileStore {
    /// Open (or create) a store rooted at `dir`, loading any existing files
    pub async fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        debug!(?dir, "FileStore::open: called");
        fs::create_dir_all(&dir).await?;

        let data = StoreData {
            opportunities: read_json(&dir.join(OPPORTUNITIES_FILE)).await?,
            services: read_json(&dir.join(SERVICES_FILE)).await?,
            metrics: read_json(&dir.join(METRICS_FILE)).await?,
        };
        debug!(
            opportunities = data.opportunities.len(),
            services = data.services.len(),
            metrics = data.metrics.len(),
            "FileStore::open: loaded"
        );

        Ok(Self {
            dir,
            data: Mutex::new(data),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Vec<T>> {
    if !fs::try_exists(path).await? {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&content)?)
}

async fn write_json<T: Serialize>(path: &Path, records: &[T]) -> StoreResult<()> {
    let content = serde_json::to_string_pretty(records)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    debug!(?path, count = records.len(), "FileStore: wrote file");
    Ok(())
}

#[async_trait]
impl Store for FileStore {
    async fn create_metric(&self, kind: &str, value: f64, metadata: serde_json::Value) -> StoreResult<MetricRecord> {
        debug!(%kind, value, "FileStore::create_metric: called");
        let mut data = self.data.lock().await;
        let metric = MetricRecord::new(kind, value, metadata);
        data.metrics.push(metric.clone());
        if let Err(e) = write_json(&self.dir.join(METRICS_FILE), &data.metrics).await {
            data.metrics.pop();
            return Err(e);
        }
        Ok(metric)
    }

    async fn get_opportunities(&self) -> StoreResult<Vec<Opportunity>> {
        Ok(self.data.lock().await.opportunities.clone())
    }

    async fn create_service(&self, service: Service) -> StoreResult<Service> {
        debug!(service_id = %service.id, "FileStore::create_service: called");
        let mut data = self.data.lock().await;
        let created = data.create_service(service)?;
        if let Err(e) = write_json(&self.dir.join(SERVICES_FILE), &data.services).await {
            data.services.pop();
            return Err(e);
        }
        Ok(created)
    }

    async fn update_opportunity(&self, id: &str, patch: OpportunityPatch) -> StoreResult<Opportunity> {
        debug!(%id, ?patch, "FileStore::update_opportunity: called");
        let mut data = self.data.lock().await;
        let before = data.opportunities.clone();
        let updated = data.update_opportunity(id, &patch)?;
        if let Err(e) = write_json(&self.dir.join(OPPORTUNITIES_FILE), &data.opportunities).await {
            data.opportunities = before;
            return Err(e);
        }
        Ok(updated)
    }

    async fn add_opportunity(&self, opportunity: Opportunity) -> StoreResult<Opportunity> {
        let mut data = self.data.lock().await;
        let added = data.add_opportunity(opportunity)?;
        if let Err(e) = write_json(&self.dir.join(OPPORTUNITIES_FILE), &data.opportunities).await {
            data.opportunities.pop();
            return Err(e);
        }
        Ok(added)
    }

    async fn list_services(&self) -> StoreResult<Vec<Service>> {
        Ok(self.data.lock().await.services.clone())
    }

    async fn list_metrics(&self) -> StoreResult<Vec<MetricRecord>> {
        Ok(self.data.lock().await.metrics.clone())
    }
}
