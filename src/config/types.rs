use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Where the plan cache and session are kept (platform data dir if unset)
    #[serde(default = "default_data_dir")]
    pub data_dir: Option<PathBuf>,

    /// How many plans are mirrored locally when refreshing from the remote store
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    #[serde(default)]
    pub remote: Option<RemoteConfig>,

    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RemoteConfig {
    /// Project base url, e.g. https://xyz.supabase.co
    pub url: String,

    /// Public API key sent as `apikey`; LIFEPLAN_ANON_KEY takes precedence
    #[serde(default)]
    pub anon_key: String,

    #[serde(default = "default_table")]
    pub table: String,

    /// Table collecting PRO waitlist sign-ups
    #[serde(default = "default_waitlist_table")]
    pub waitlist_table: String,

    #[serde(default = "default_remote_timeout_sec")]
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ExportConfig {
    /// Page width in characters
    #[serde(default = "default_page_width")]
    pub page_width: usize,

    /// Page height in lines
    #[serde(default = "default_page_height")]
    pub page_height: usize,

    #[serde(default = "default_margin")]
    pub margin: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            margin: default_margin(),
        }
    }
}
