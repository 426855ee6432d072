//! In-process store with failure injection, for exercising sync policy

use super::{validate_for_insert, ListQuery, PlanListing, PlanStore};
use crate::error::StoreError;
use crate::plan::{sort_newest_first, Plan};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
pub struct MemoryPlanStore {
    plans: Mutex<Vec<Plan>>,
    failure: Mutex<Option<StoreError>>,
    server_clock: Mutex<Option<DateTime<Utc>>>,
    unreadable: Mutex<usize>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MemoryPlanStore {
    pub fn with_plans(plans: Vec<Plan>) -> Self {
        Self {
            plans: Mutex::new(plans),
            ..Self::default()
        }
    }

    /// Make every following call fail with `error` (None to recover)
    pub fn fail_with(&self, error: Option<StoreError>) {
        *self.failure.lock().unwrap() = error;
    }

    /// Stamp created records with this time instead of keeping the client's
    pub fn set_server_clock(&self, now: DateTime<Utc>) {
        *self.server_clock.lock().unwrap() = Some(now);
    }

    /// Report this many rows as unreadable on every listing
    pub fn set_unreadable(&self, rows: usize) {
        *self.unreadable.lock().unwrap() = rows;
    }

    /// Park listings until the returned gate is notified
    pub fn hold_listings(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn ids(&self) -> Vec<String> {
        self.plans.lock().unwrap().iter().map(|p| p.id.clone()).collect()
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, plan: &Plan) -> Result<Plan, StoreError> {
        validate_for_insert(plan)?;
        self.check_failure()?;

        let mut stored = plan.clone();
        if let Some(now) = *self.server_clock.lock().unwrap() {
            stored.created_at = now;
        }
        self.plans.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, owner_id: &str, query: ListQuery) -> Result<PlanListing, StoreError> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_failure()?;

        let mut plans: Vec<Plan> = self
            .plans
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        sort_newest_first(&mut plans);
        if !query.newest_first {
            plans.reverse();
        }
        if let Some(limit) = query.limit {
            plans.truncate(limit);
        }
        Ok(PlanListing {
            plans,
            skipped: *self.unreadable.lock().unwrap(),
        })
    }

    async fn delete(&self, plan_id: &str) -> Result<(), StoreError> {
        self.check_failure()?;
        self.plans.lock().unwrap().retain(|p| p.id != plan_id);
        Ok(())
    }
}
