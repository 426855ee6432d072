mod rest;
mod waitlist;

#[cfg(test)]
pub mod memory;

pub use rest::RestPlanStore;
pub use waitlist::{validate_email, WaitlistClient};

use crate::config::Config;
use crate::error::StoreError;
use crate::plan::Plan;
use crate::session::SessionProvider;
use async_trait::async_trait;
use std::sync::Arc;

/// How to page through an owner's plans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub newest_first: bool,
}

impl ListQuery {
    pub fn recent(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            newest_first: true,
        }
    }

    pub fn all() -> Self {
        Self {
            limit: None,
            newest_first: true,
        }
    }
}

/// Plans returned by a listing. Rows this version cannot read are left out and counted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanListing {
    pub plans: Vec<Plan>,
    pub skipped: usize,
}

/// Remote record store holding plans per owner.
///
/// Every call is a live round trip; implementations never cache. Callers must
/// not assume partial success when an error comes back.
#[async_trait]
pub trait PlanStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create(&self, plan: &Plan) -> Result<Plan, StoreError>;

    /// One unreadable row never fails the whole listing; it is skipped
    async fn list(&self, owner_id: &str, query: ListQuery) -> Result<PlanListing, StoreError>;

    /// Deleting an id that does not exist succeeds
    async fn delete(&self, plan_id: &str) -> Result<(), StoreError>;
}

/// Checks every store runs before touching the network
pub fn validate_for_insert(plan: &Plan) -> Result<(), StoreError> {
    if plan.owner_id.trim().is_empty() {
        return Err(StoreError::Validation("El plan no tiene propietario.".to_string()));
    }
    if plan.name.trim().is_empty() {
        return Err(StoreError::Validation(
            "Ponle un nombre a tu plan para guardarlo.".to_string(),
        ));
    }
    Ok(())
}

/// Used when no remote is configured; every call fails without I/O
pub struct OfflineStore;

#[async_trait]
impl PlanStore for OfflineStore {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn create(&self, plan: &Plan) -> Result<Plan, StoreError> {
        validate_for_insert(plan)?;
        Err(offline())
    }

    async fn list(&self, _owner_id: &str, _query: ListQuery) -> Result<PlanListing, StoreError> {
        Err(offline())
    }

    async fn delete(&self, _plan_id: &str) -> Result<(), StoreError> {
        Err(offline())
    }
}

fn offline() -> StoreError {
    StoreError::Network("no remote store is configured".to_string())
}

/// Create a store based on the remote configuration
pub fn create_store(
    config: &Config,
    session: Arc<dyn SessionProvider>,
) -> Result<Arc<dyn PlanStore>, StoreError> {
    match &config.remote {
        Some(remote) => Ok(Arc::new(RestPlanStore::new(remote, session)?)),
        None => Ok(Arc::new(OfflineStore)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanDraft, LOCAL_OWNER};

    #[tokio::test]
    async fn test_validation_happens_before_io() {
        let mut plan = Plan::from_draft(&PlanDraft::default(), LOCAL_OWNER).unwrap();
        plan.owner_id = String::new();

        let err = OfflineStore.create(&plan).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        plan.owner_id = "user-1".to_string();
        let err = OfflineStore.create(&plan).await.unwrap_err();
        assert!(matches!(err, StoreError::Network(_)));
    }
}
