use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use framestack_types::Result;

use crate::error::{io_error, toml_de_error, toml_ser_error};

fn default_event_log_shards() -> u16 {
    16
}
fn default_cache_max_bytes() -> u64 {
    100 * 1024 * 1024
}
fn default_cache_default_ttl_secs() -> u64 {
    3600
}
fn default_trace_gap_secs() -> i64 {
    30
}
fn default_trace_max_len() -> usize {
    64
}
fn default_compress_age_hours() -> i64 {
    24
}
fn default_embedding_dim() -> usize {
    1536
}
fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_frame_inactivity_window_secs() -> i64 {
    3600
}
fn default_retrieval_default_limit() -> usize {
    50
}
fn default_token_budget_default() -> u64 {
    4000
}
fn default_oracle_concurrency() -> usize {
    4
}

/// Recognized configuration options (§6), loaded from a project-scoped
/// `config.toml` the way the teacher's own `Config` does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default = "default_event_log_shards")]
    pub event_log_shards: u16,
    #[serde(default = "default_cache_max_bytes")]
    pub cache_max_bytes: u64,
    #[serde(default = "default_cache_default_ttl_secs")]
    pub cache_default_ttl_secs: u64,
    #[serde(default = "default_trace_gap_secs")]
    pub trace_gap_secs: i64,
    #[serde(default = "default_trace_max_len")]
    pub trace_max_len: usize,
    #[serde(default = "default_compress_age_hours")]
    pub compress_age_hours: i64,
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    /// One of `local`, `remote`, `hybrid`. A `remote`/`hybrid` provider
    /// with no delegate wired falls back to local on every call, same as
    /// `framestack_providers::unconfigured_remote` (§9 open question: the
    /// remote transport is an out-of-scope external collaborator).
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,
    #[serde(default = "default_frame_inactivity_window_secs")]
    pub frame_inactivity_window_secs: i64,
    #[serde(default = "default_retrieval_default_limit")]
    pub retrieval_default_limit: usize,
    #[serde(default = "default_token_budget_default")]
    pub token_budget_default: u64,
    #[serde(default = "default_oracle_concurrency")]
    pub oracle_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            event_log_shards: default_event_log_shards(),
            cache_max_bytes: default_cache_max_bytes(),
            cache_default_ttl_secs: default_cache_default_ttl_secs(),
            trace_gap_secs: default_trace_gap_secs(),
            trace_max_len: default_trace_max_len(),
            compress_age_hours: default_compress_age_hours(),
            embedding_dim: default_embedding_dim(),
            embedding_provider: default_embedding_provider(),
            frame_inactivity_window_secs: default_frame_inactivity_window_secs(),
            retrieval_default_limit: default_retrieval_default_limit(),
            token_budget_default: default_token_budget_default(),
            oracle_concurrency: default_oracle_concurrency(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(io_error)?;
        toml::from_str(&content).map_err(toml_de_error)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = toml::to_string_pretty(self).map_err(toml_ser_error)?;
        std::fs::write(path, content).map_err(io_error)
    }

    pub fn resolved_db_path(&self, data_dir: &Path) -> PathBuf {
        self.db_path.clone().unwrap_or_else(|| data_dir.join("context.db"))
    }
}
