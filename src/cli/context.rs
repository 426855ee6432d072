use crate::cache::LocalCache;
use crate::config::Config;
use crate::plan::Plan;
use crate::session::{SessionFile, SessionHandle};
use crate::store::create_store;
use crate::sync::{InFlightFlags, PlanSynchronizer, Transition};
use anyhow::{anyhow, bail};
use std::fmt::Display;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How long a remote call may run before the user is told about it
const PROGRESS_AFTER: Duration = Duration::from_millis(800);

/// Everything a command needs: config, stored session and the synchronizer
pub struct Context {
    pub config: Config,
    pub data_dir: PathBuf,
    pub session: Arc<SessionHandle>,
    pub session_file: SessionFile,
    pub sync: PlanSynchronizer,
    json: bool,
}

impl Context {
    pub fn open(config_path: &Path) -> anyhow::Result<Self> {
        info!("Loading config from {:?}", config_path);
        let config = Config::load_or_default(config_path)?;
        config.validate()?;

        let data_dir = config.data_dir()?;
        let session_file = SessionFile::new(&data_dir);
        let session = Arc::new(SessionHandle::new(session_file.load()));
        let store = create_store(&config, session.clone())?;
        let sync = PlanSynchronizer::new(
            LocalCache::new(&data_dir),
            store,
            session.clone(),
            config.recent_limit,
        );

        Ok(Self {
            config,
            data_dir,
            session,
            session_file,
            sync,
            json: false,
        })
    }

    /// Keep stdout for the JSON document; notices move to stderr
    pub fn json_output(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// A status line for the user
    pub fn notice(&self, message: impl Display) {
        if self.json {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    }

    /// Bring the plan list in line with the current session. A failed remote
    /// refresh is reported and the cached plans stay in view.
    pub async fn connect(&mut self) -> anyhow::Result<()> {
        let flags = self.sync.in_flight();
        let result = with_progress(flags, self.sync.bootstrap()).await;
        match result {
            Ok(Transition::SignedIn { user_id, plans }) => {
                info!("Synced {} plans for {}", plans, user_id)
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Could not refresh plans: {}", e);
                self.notice(format!("No pudimos sincronizar tus planes: {}", e));
            }
        }
        self.report_warning();
        Ok(())
    }

    pub fn report_warning(&mut self) {
        if let Some(warning) = self.sync.take_warning() {
            self.notice(format!("⚠️  {}", warning));
        }
    }

    /// Resolve a full id or unique id prefix among the plans in view
    pub fn resolve(&self, id: &str) -> anyhow::Result<Plan> {
        resolve_in(self.sync.plans(), id)
    }
}

/// Drive `work` to completion, saying once on stderr what it is waiting for
/// when a remote call holds it up
pub async fn with_progress<F: Future>(flags: Arc<InFlightFlags>, work: F) -> F::Output {
    tokio::pin!(work);
    let mut tick = tokio::time::interval(PROGRESS_AFTER);
    tick.tick().await;
    let mut announced = false;

    loop {
        tokio::select! {
            output = &mut work => return output,
            _ = tick.tick(), if !announced => {
                if let Some(message) = flags.snapshot().describe() {
                    eprintln!("{}", message);
                    announced = true;
                }
            }
        }
    }
}

pub fn resolve_in(plans: &[Plan], id: &str) -> anyhow::Result<Plan> {
    if let Some(plan) = plans.iter().find(|p| p.id == id) {
        return Ok(plan.clone());
    }

    let matches: Vec<&Plan> = plans.iter().filter(|p| p.id.starts_with(id)).collect();
    match matches.as_slice() {
        [plan] => Ok((*plan).clone()),
        [] => Err(anyhow!("No plan with id '{}'", id)),
        _ => bail!("Id prefix '{}' matches {} plans", id, matches.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanDraft, LOCAL_OWNER};

    fn plan_with_id(id: &str) -> Plan {
        let mut plan = Plan::from_draft(&PlanDraft::default(), LOCAL_OWNER).unwrap();
        plan.id = id.to_string();
        plan
    }

    #[test]
    fn test_resolve_by_prefix() {
        let plans = vec![plan_with_id("abc123"), plan_with_id("abd456"), plan_with_id("ab")];

        assert_eq!(resolve_in(&plans, "abc").unwrap().id, "abc123");
        assert_eq!(resolve_in(&plans, "ab").unwrap().id, "ab");
        assert!(resolve_in(&plans, "a").is_err());
        assert!(resolve_in(&plans, "zzz").is_err());
    }

    #[tokio::test]
    async fn test_with_progress_returns_work_output() {
        let flags = Arc::new(InFlightFlags::default());
        assert_eq!(with_progress(flags, async { 7 }).await, 7);
    }
}
