//! Keeps the local plan cache and the remote store in step.
//!
//! Signed out, the cache is the only source of truth. Signed in, the remote
//! store is authoritative and the cache is an overwritable projection of its
//! most recent plans. Saves are two-phase: the local write happens first and
//! always lands; the remote write is a separate step with its own outcome.

use crate::cache::{LocalCache, ResumeSlot};
use crate::error::{CacheError, StoreError, SyncError};
use crate::plan::{sort_newest_first, Plan, PlanDraft, LOCAL_OWNER};
use crate::session::{Identity, SessionProvider};
use crate::store::{ListQuery, PlanListing, PlanStore};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Operations currently running, for disabling repeated triggers in the UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InFlight {
    pub generating: bool,
    pub saving: bool,
    pub loading: bool,
}

impl InFlight {
    /// What to tell the user while waiting, if anything is running
    pub fn describe(&self) -> Option<&'static str> {
        if self.saving {
            Some("Guardando en la nube...")
        } else if self.loading {
            Some("Cargando tus planes...")
        } else if self.generating {
            Some("Generando tu plan...")
        } else {
            None
        }
    }
}

/// Live in-flight state, readable from another task while an operation awaits
#[derive(Debug, Default)]
pub struct InFlightFlags {
    generating: AtomicBool,
    saving: AtomicBool,
    loading: AtomicBool,
}

impl InFlightFlags {
    pub fn snapshot(&self) -> InFlight {
        InFlight {
            generating: self.generating.load(Ordering::Relaxed),
            saving: self.saving.load(Ordering::Relaxed),
            loading: self.loading.load(Ordering::Relaxed),
        }
    }
}

/// Keeps a flag raised until dropped, error paths included
struct Busy<'a>(&'a AtomicBool);

impl<'a> Busy<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Relaxed);
        Self(flag)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// What applying an identity did to the plan list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// Local view replaced by the owner's most recent remote plans
    SignedIn { user_id: String, plans: usize },
    /// Local view and cache cleared
    SignedOut,
}

/// A plan written locally and waiting for its remote copy
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub plan: Plan,
    owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteWrite {
    /// Signed out; nothing to mirror
    LocalOnly,
    Synced(Plan),
    /// The plan stays in the local cache; no retry is scheduled
    Failed(StoreError),
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub plan: Plan,
    pub remote: RemoteWrite,
}

/// Proof that the user was asked before a delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteToken {
    pub token: String,
    pub plan_name: String,
}

pub struct PlanSynchronizer {
    cache: LocalCache,
    store: Arc<dyn PlanStore>,
    session: Arc<dyn SessionProvider>,
    recent_limit: usize,
    identity: Option<Identity>,
    plans: Vec<Plan>,
    in_flight: Arc<InFlightFlags>,
    pending_deletes: HashMap<String, String>,
    warning: Option<String>,
}

impl PlanSynchronizer {
    /// Start from whatever the local cache holds; call [`Self::bootstrap`] next
    pub fn new(
        cache: LocalCache,
        store: Arc<dyn PlanStore>,
        session: Arc<dyn SessionProvider>,
        recent_limit: usize,
    ) -> Self {
        let snapshot = cache.load();
        debug!(
            "Loaded {} cached plans from {:?} (store: {})",
            snapshot.plans.len(),
            cache.dir(),
            store.name()
        );
        Self {
            cache,
            store,
            session,
            recent_limit,
            identity: None,
            plans: snapshot.plans,
            in_flight: Arc::new(InFlightFlags::default()),
            pending_deletes: HashMap::new(),
            warning: snapshot.warning,
        }
    }

    /// Plans to show, newest first
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Shared handle on what is currently running
    pub fn in_flight(&self) -> Arc<InFlightFlags> {
        self.in_flight.clone()
    }

    /// A non-fatal problem the user should hear about, reported once
    pub fn take_warning(&mut self) -> Option<String> {
        self.warning.take()
    }

    /// Apply the session's current identity
    pub async fn bootstrap(&mut self) -> Result<Transition, SyncError> {
        let identity = self.session.current_identity();
        self.apply_identity(identity).await
    }

    /// Wait for the next identity change and apply it. None once the session is gone.
    pub async fn follow_session(
        &mut self,
        rx: &mut watch::Receiver<Option<Identity>>,
    ) -> Option<Result<Transition, SyncError>> {
        rx.changed().await.ok()?;
        let identity = rx.borrow_and_update().clone();
        Some(self.apply_identity(identity).await)
    }

    pub async fn apply_identity(
        &mut self,
        identity: Option<Identity>,
    ) -> Result<Transition, SyncError> {
        let previous = self.identity.as_ref().map(|i| i.user_id.clone());
        match (previous, identity) {
            (None, None) => {
                // A cache left behind by an expired session still holds its owner's plans
                if self.drop_foreign_plans()? {
                    info!("Cleared plans of a previous session");
                    Ok(Transition::SignedOut)
                } else {
                    Ok(Transition::Unchanged)
                }
            }
            (Some(prev), Some(next)) if prev == next.user_id => {
                // Same principal, possibly a refreshed token
                self.identity = Some(next);
                Ok(Transition::Unchanged)
            }
            (_, Some(next)) => {
                let user_id = next.user_id.clone();
                info!("Signed in as {}, refreshing plans", user_id);
                self.identity = Some(next);
                let plans = self.refresh().await?;
                Ok(Transition::SignedIn { user_id, plans })
            }
            (Some(prev), None) => {
                info!("{} signed out, clearing their plans", prev);
                self.identity = None;
                self.drop_foreign_plans()?;
                Ok(Transition::SignedOut)
            }
        }
    }

    /// Keep only plans created while signed out. Returns whether anything went.
    fn drop_foreign_plans(&mut self) -> Result<bool, SyncError> {
        let before = self.plans.len();
        self.plans.retain(Plan::is_local);
        self.pending_deletes.clear();
        if self.plans.len() == before {
            return Ok(false);
        }

        if self.plans.is_empty() {
            self.cache.clear()?;
        } else {
            self.cache.save(&self.plans)?;
        }
        Ok(true)
    }

    /// Re-read the source of truth into the view. Returns the number of plans shown.
    ///
    /// Signed in, the cache is overwritten with the remote list; plans that only
    /// existed locally are dropped. On failure the view is left untouched.
    pub async fn refresh(&mut self) -> Result<usize, SyncError> {
        let Some(owner) = self.identity.as_ref().map(|i| i.user_id.clone()) else {
            let snapshot = self.cache.load();
            self.plans = snapshot.plans;
            if snapshot.warning.is_some() {
                self.warning = snapshot.warning;
            }
            return Ok(self.plans.len());
        };

        let listing = self
            .fetch(&owner, ListQuery::recent(self.recent_limit))
            .await
            .inspect_err(|e| warn!("Failed to list remote plans: {}", e))?;
        let mut plans = self.take_listing(listing);
        sort_newest_first(&mut plans);
        self.plans = plans;
        self.persist();
        Ok(self.plans.len())
    }

    /// Every plan the owner has, for the dashboard. Does not touch the cache.
    pub async fn list_all(&mut self) -> Result<Vec<Plan>, SyncError> {
        let Some(owner) = self.identity.as_ref().map(|i| i.user_id.clone()) else {
            return Ok(self.plans.clone());
        };

        let listing = self.fetch(&owner, ListQuery::all()).await?;
        let mut plans = self.take_listing(listing);
        sort_newest_first(&mut plans);
        Ok(plans)
    }

    async fn fetch(&self, owner: &str, query: ListQuery) -> Result<PlanListing, StoreError> {
        let _loading = Busy::raise(&self.in_flight.loading);
        self.store.list(owner, query).await
    }

    fn take_listing(&mut self, listing: PlanListing) -> Vec<Plan> {
        if listing.skipped > 0 {
            self.warning = Some(format!(
                "{} planes de la nube no se pudieron leer y se omitieron.",
                listing.skipped
            ));
        }
        listing.plans
    }

    /// Fill a draft's outputs from its inputs
    pub fn generate(&self, draft: &mut PlanDraft) {
        let _generating = Busy::raise(&self.in_flight.generating);
        draft.regenerate();
    }

    /// Phase one of a save: a new plan goes into the view and the cache right away
    pub fn save_local(&mut self, draft: &PlanDraft) -> Result<PendingUpload, SyncError> {
        let owner = self.identity.as_ref().map(|i| i.user_id.clone());
        let plan = Plan::from_draft(draft, owner.as_deref().unwrap_or(LOCAL_OWNER))
            .map_err(SyncError::Validation)?;

        self.in_flight.saving.store(owner.is_some(), Ordering::Relaxed);
        self.plans.insert(0, plan.clone());
        sort_newest_first(&mut self.plans);
        if let Err(e) = self.cache.prepend(plan.clone()) {
            self.cache_write_failed(e);
        }
        debug!("Saved plan {} locally", plan.id);

        Ok(PendingUpload { plan, owner })
    }

    /// Phase two of a save: mirror the plan to the remote store
    pub async fn upload(&mut self, pending: PendingUpload) -> RemoteWrite {
        let Some(owner) = pending.owner else {
            return RemoteWrite::LocalOnly;
        };

        let result = self.store.create(&pending.plan).await;
        self.in_flight.saving.store(false, Ordering::Relaxed);

        let created = match result {
            Ok(created) => created,
            Err(e) => {
                warn!("Plan {} kept locally, remote save failed: {}", pending.plan.id, e);
                return RemoteWrite::Failed(e);
            }
        };

        // Remote wins: take its copy, then its view of the recent window
        if let Some(slot) = self.plans.iter_mut().find(|p| p.id == pending.plan.id) {
            *slot = created.clone();
        }
        sort_newest_first(&mut self.plans);
        self.persist();

        if self.identity.as_ref().map(|i| i.user_id.as_str()) == Some(owner.as_str()) {
            if let Err(e) = self.refresh().await {
                warn!("Saved remotely but could not refresh the list: {}", e);
            }
        }

        info!("Plan {} synced", created.id);
        RemoteWrite::Synced(created)
    }

    /// Both phases of a save
    pub async fn save(&mut self, draft: &PlanDraft) -> Result<SaveOutcome, SyncError> {
        let pending = self.save_local(draft)?;
        let plan = pending.plan.clone();
        let remote = self.upload(pending).await;
        Ok(SaveOutcome { plan, remote })
    }

    /// First step of a delete: hand out a single-use confirmation token
    pub fn request_delete(&mut self, plan_id: &str) -> Result<DeleteToken, SyncError> {
        let plan = self
            .plans
            .iter()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| SyncError::NotFound(plan_id.to_string()))?;

        let nonce: u64 = rand::random();
        let digest = Sha256::digest(format!("{}|{}", plan.id, nonce).as_bytes());
        let token = format!("{:x}", digest)[..12].to_string();

        self.pending_deletes.insert(token.clone(), plan.id.clone());
        Ok(DeleteToken {
            token,
            plan_name: plan.name.clone(),
        })
    }

    /// Second step of a delete. The token is spent even if the delete fails.
    pub async fn confirm_delete(&mut self, token: &str) -> Result<(), SyncError> {
        let plan_id = self
            .pending_deletes
            .remove(token)
            .ok_or(SyncError::InvalidToken)?;
        self.delete(&plan_id).await
    }

    /// Remove a plan. Signed in, the remote delete must succeed before anything
    /// local changes. Deleting an absent plan succeeds.
    pub async fn delete(&mut self, plan_id: &str) -> Result<(), SyncError> {
        if self.identity.is_some() {
            self.store
                .delete(plan_id)
                .await
                .inspect_err(|e| warn!("Remote delete of {} failed: {}", plan_id, e))?;
        }

        let before = self.plans.len();
        self.plans.retain(|p| p.id != plan_id);
        if self.plans.len() != before {
            self.persist();
            info!("Deleted plan {}", plan_id);
        }
        Ok(())
    }

    /// Park a plan so the next generator session starts from it
    pub fn stash_for_editing(&self, plan: &Plan) -> Result<(), SyncError> {
        self.cache.stash_resume(plan)?;
        Ok(())
    }

    pub fn take_resume(&self) -> Result<ResumeSlot, SyncError> {
        Ok(self.cache.take_resume()?)
    }

    fn persist(&mut self) {
        if let Err(e) = self.cache.save(&self.plans) {
            self.cache_write_failed(e);
        }
    }

    fn cache_write_failed(&mut self, e: CacheError) {
        warn!("Failed to write local plan cache: {}", e);
        self.warning = Some(format!("No pudimos guardar tus planes locales: {}", e));
    }
}
