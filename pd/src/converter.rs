//! Opportunity Converter - turns detected opportunities into services
//!
//! A service is created before its opportunity is flipped to `converted`.
//! If the flip fails after the service was created, the next pass finds the
//! existing service and only retries the flip, so each opportunity yields at
//! most one service.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{Opportunity, OpportunityPatch, OpportunityStatus, Service, ServiceStatus, generate_id};
use crate::store::{Store, StoreError};

/// Deterministic automation score for an opportunity, in [0, 100]
pub fn automation_level(opportunity: &Opportunity) -> u8 {
    let title = opportunity.title.to_lowercase();
    let mut level: i32 = 50;
    if opportunity.estimated_value > 10_000.0 {
        level += 20;
    }
    if opportunity.confidence > 90.0 {
        level += 15;
    }
    if title.contains("automation") {
        level += 25;
    }
    if title.contains("ai") {
        level += 20;
    }
    level.clamp(0, 100) as u8
}

fn service_template(opportunity: &Opportunity, level: u8) -> String {
    format!(
        "# {}\n\n{}\n\n- Estimated value: ${:.0}\n- Confidence: {:.0}%\n- Automation level: {}%\n",
        opportunity.title, opportunity.description, opportunity.estimated_value, opportunity.confidence, level
    )
}

/// Build the service record for an opportunity
pub fn build_service(opportunity: &Opportunity) -> Service {
    let level = automation_level(opportunity);
    Service {
        id: generate_id("svc", &opportunity.title),
        title: opportunity.title.clone(),
        description: opportunity.description.clone(),
        price: opportunity.estimated_value,
        status: ServiceStatus::Active,
        opportunity_id: opportunity.id.clone(),
        template: service_template(opportunity, level),
        automation_level: level,
        created_at: Utc::now(),
    }
}

/// What one conversion pass did
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Services created in this pass
    pub created: Vec<Service>,
    /// Opportunities flipped to `converted` in this pass
    pub converted: Vec<String>,
    /// Opportunities left `detected`, with the reason
    pub failed: Vec<(String, String)>,
}

impl ConversionReport {
    pub fn services_created(&self) -> u32 {
        self.created.len() as u32
    }
}

/// Converts every `detected` opportunity in storage into a service
pub struct OpportunityConverter {
    store: Arc<dyn Store>,
    pass: Mutex<()>,
}

impl OpportunityConverter {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            pass: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Run one conversion pass
    ///
    /// Fails only if storage cannot be listed. Per-opportunity write failures
    /// leave that opportunity `detected` for the next pass.
    pub async fn convert_detected(&self) -> Result<ConversionReport, StoreError> {
        let _pass = self.pass.lock().await;
        debug!("OpportunityConverter::convert_detected: called");

        let opportunities = self.store.get_opportunities().await?;
        let mut served: HashSet<String> = self
            .store
            .list_services()
            .await?
            .into_iter()
            .map(|s| s.opportunity_id)
            .collect();

        let mut report = ConversionReport::default();
        for opportunity in opportunities.iter().filter(|o| o.is_detected()) {
            if !served.contains(&opportunity.id) {
                let service = build_service(opportunity);
                match self.store.create_service(service).await {
                    Ok(service) => {
                        debug!(opportunity = %opportunity.id, service = %service.id, "Service created");
                        served.insert(opportunity.id.clone());
                        report.created.push(service);
                    }
                    Err(e) => {
                        warn!(opportunity = %opportunity.id, error = %e, "Failed to create service, will retry");
                        report.failed.push((opportunity.id.clone(), e.to_string()));
                        continue;
                    }
                }
            } else {
                debug!(opportunity = %opportunity.id, "Service already exists, retrying status update");
            }

            let patch = OpportunityPatch::status(OpportunityStatus::Converted);
            match self.store.update_opportunity(&opportunity.id, patch).await {
                Ok(_) => report.converted.push(opportunity.id.clone()),
                Err(e) => {
                    warn!(opportunity = %opportunity.id, error = %e, "Failed to mark opportunity converted, will retry");
                    report.failed.push((opportunity.id.clone(), e.to_string()));
                }
            }
        }

        if !report.converted.is_empty() || !report.failed.is_empty() {
            info!(
                created = report.created.len(),
                converted = report.converted.len(),
                failed = report.failed.len(),
                "Conversion pass finished"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::mock::FaultyStore;
    use proptest::prelude::*;
    use std::sync::atomic::Ordering;

    fn opp(title: &str, value: f64, confidence: f64) -> Opportunity {
        Opportunity::new(title, "desc", value, confidence)
    }

    #[test]
    fn test_automation_level_examples() {
        assert_eq!(automation_level(&opp("Dashboard", 5_000.0, 50.0)), 50);
        assert_eq!(automation_level(&opp("Dashboard", 10_001.0, 50.0)), 70);
        assert_eq!(automation_level(&opp("Dashboard", 10_000.0, 90.0)), 50);
        assert_eq!(automation_level(&opp("Dashboard", 1.0, 90.5)), 65);
        assert_eq!(automation_level(&opp("Treasury Automation", 1.0, 1.0)), 75);
        assert_eq!(automation_level(&opp("AI Support Bot", 1.0, 1.0)), 70);
        assert_eq!(automation_level(&opp("AI Automation", 20_000.0, 99.0)), 100);
    }

    proptest! {
        #[test]
        fn automation_level_is_bounded(
            title in ".{0,40}",
            value in -1.0e9f64..1.0e9,
            confidence in -100.0f64..200.0,
        ) {
            let level = automation_level(&Opportunity::new(title, "", value, confidence));
            prop_assert!(level <= 100);
            prop_assert!(level >= 50);
        }
    }

    #[test]
    fn test_build_service_copies_fields() {
        let opportunity = opp("Mining Pool Monitor", 9_000.0, 88.0);
        let service = build_service(&opportunity);
        assert_eq!(service.title, opportunity.title);
        assert_eq!(service.description, opportunity.description);
        assert_eq!(service.price, 9_000.0);
        assert_eq!(service.status, ServiceStatus::Active);
        assert_eq!(service.opportunity_id, opportunity.id);
        assert!(service.template.contains("Mining Pool Monitor"));
    }

    #[tokio::test]
    async fn test_convert_twice_creates_one_service() {
        let store = Arc::new(MemoryStore::with_opportunities(vec![opp("API Gateway", 11_000.0, 95.0)]));
        let converter = OpportunityConverter::new(store.clone());

        let first = converter.convert_detected().await.unwrap();
        let second = converter.convert_detected().await.unwrap();

        assert_eq!(first.services_created(), 1);
        assert_eq!(first.converted.len(), 1);
        assert_eq!(second.services_created(), 0);
        assert!(second.converted.is_empty());
        assert_eq!(store.list_services().await.unwrap().len(), 1);
        assert!(
            store
                .get_opportunities()
                .await
                .unwrap()
                .iter()
                .all(|o| o.status == OpportunityStatus::Converted)
        );
    }

    #[tokio::test]
    async fn test_only_detected_are_converted() {
        let mut done = opp("Already Done", 1.0, 1.0);
        done.status = OpportunityStatus::Converted;
        let store = Arc::new(MemoryStore::with_opportunities(vec![done, opp("New One", 1.0, 1.0)]));
        let converter = OpportunityConverter::new(store.clone());

        let report = converter.convert_detected().await.unwrap();
        assert_eq!(report.services_created(), 1);
        assert_eq!(report.created[0].title, "New One");
    }

    #[tokio::test]
    async fn test_service_failure_leaves_detected() {
        let store = Arc::new(FaultyStore::new());
        store.inner.add_opportunity(opp("CLI", 1.0, 1.0)).await.unwrap();
        store.fail_create_service.store(true, Ordering::SeqCst);
        let converter = OpportunityConverter::new(store.clone());

        let report = converter.convert_detected().await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(store.get_opportunities().await.unwrap()[0].is_detected());
        assert!(store.list_services().await.unwrap().is_empty());

        store.fail_create_service.store(false, Ordering::SeqCst);
        let report = converter.convert_detected().await.unwrap();
        assert_eq!(report.services_created(), 1);
        assert!(!store.get_opportunities().await.unwrap()[0].is_detected());
    }

    #[tokio::test]
    async fn test_update_failure_does_not_duplicate_service() {
        let store = Arc::new(FaultyStore::new());
        store.inner.add_opportunity(opp("CLI", 1.0, 1.0)).await.unwrap();
        store.fail_update.store(true, Ordering::SeqCst);
        let converter = OpportunityConverter::new(store.clone());

        let report = converter.convert_detected().await.unwrap();
        assert_eq!(report.services_created(), 1);
        assert!(report.converted.is_empty());
        assert!(store.get_opportunities().await.unwrap()[0].is_detected());

        store.fail_update.store(false, Ordering::SeqCst);
        let report = converter.convert_detected().await.unwrap();
        assert_eq!(report.services_created(), 0);
        assert_eq!(report.converted.len(), 1);
        assert_eq!(store.list_services().await.unwrap().len(), 1);
        assert_eq!(store.create_service_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_error() {
        let store = Arc::new(FaultyStore::new());
        store.fail_listing.store(true, Ordering::SeqCst);
        let converter = OpportunityConverter::new(store);
        assert!(converter.convert_detected().await.is_err());
    }
}
