//! On-disk mirror of recent plans, plus the one-shot "resume editing" slot

use crate::error::CacheError;
use crate::plan::{sort_newest_first, Plan};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PLANS_FILE: &str = "plans.json";
const RESUME_FILE: &str = "current-plan.json";

/// Plans read from the cache, with a message for the user if something was off
#[derive(Debug, Default)]
pub struct CacheSnapshot {
    pub plans: Vec<Plan>,
    pub warning: Option<String>,
}

/// Result of consuming the resume slot
#[derive(Debug, Default)]
pub struct ResumeSlot {
    pub plan: Option<Plan>,
    pub warning: Option<String>,
}

enum Blob<T> {
    Missing,
    Parsed(T),
    Corrupt(String),
}

#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the cached plan list. Never fails: unreadable content degrades to empty.
    pub fn load(&self) -> CacheSnapshot {
        match read_blob::<Vec<serde_json::Value>>(&self.dir.join(PLANS_FILE)) {
            Blob::Missing => CacheSnapshot::default(),
            Blob::Corrupt(reason) => {
                warn!("Local plan cache is unreadable: {}", reason);
                CacheSnapshot {
                    plans: Vec::new(),
                    warning: Some("No pudimos leer tus planes locales.".to_string()),
                }
            }
            Blob::Parsed(values) => {
                let total = values.len();
                let mut plans: Vec<Plan> = values
                    .into_iter()
                    .filter_map(|value| serde_json::from_value::<Plan>(value).ok())
                    .filter(|plan| plan.payload.is_supported())
                    .collect();
                sort_newest_first(&mut plans);

                let dropped = total - plans.len();
                let warning = if dropped > 0 {
                    warn!("Skipped {} unreadable cached plans", dropped);
                    Some(format!(
                        "{} planes locales no se pudieron leer y se omitieron.",
                        dropped
                    ))
                } else {
                    None
                };
                CacheSnapshot { plans, warning }
            }
        }
    }

    /// Overwrite the cached list
    pub fn save(&self, plans: &[Plan]) -> Result<(), CacheError> {
        self.write_blob(PLANS_FILE, &plans)
    }

    /// Read, cons, write
    pub fn prepend(&self, plan: Plan) -> Result<(), CacheError> {
        let mut plans = self.load().plans;
        plans.insert(0, plan);
        self.save(&plans)
    }

    /// Forget the cached list entirely
    pub fn clear(&self) -> Result<(), CacheError> {
        remove_if_exists(&self.dir.join(PLANS_FILE))
    }

    /// Park a plan for the generator to pick up on its next start
    pub fn stash_resume(&self, plan: &Plan) -> Result<(), CacheError> {
        self.write_blob(RESUME_FILE, plan)
    }

    /// Take the parked plan, if any. The slot is cleared whether or not it parsed.
    pub fn take_resume(&self) -> Result<ResumeSlot, CacheError> {
        let path = self.dir.join(RESUME_FILE);
        let slot = match read_blob::<Plan>(&path) {
            Blob::Missing => return Ok(ResumeSlot::default()),
            Blob::Parsed(plan) => ResumeSlot {
                plan: Some(plan),
                warning: None,
            },
            Blob::Corrupt(reason) => {
                warn!("Resume slot is unreadable: {}", reason);
                ResumeSlot {
                    plan: None,
                    warning: Some("No pudimos cargar el plan solicitado.".to_string()),
                }
            }
        };
        remove_if_exists(&path)?;
        Ok(slot)
    }

    fn write_blob<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::CreateDir {
            path: self.dir.clone(),
            source: e,
        })?;

        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{}.tmp", file));
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| CacheError::Write {
                path: path.clone(),
                source: e,
            })?;
        debug!("Wrote {:?}", path);
        Ok(())
    }
}

fn read_blob<T: DeserializeOwned>(path: &Path) -> Blob<T> {
    match fs::read_to_string(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Blob::Missing,
        Err(e) => Blob::Corrupt(e.to_string()),
        Ok(content) if content.trim().is_empty() => Blob::Missing,
        Ok(content) => match serde_json::from_str(&content) {
            Ok(value) => Blob::Parsed(value),
            Err(e) => Blob::Corrupt(e.to_string()),
        },
    }
}

fn remove_if_exists(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
