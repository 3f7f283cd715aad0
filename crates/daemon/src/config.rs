//! Daemon configuration from `SITEBATCH_*` environment variables

use anyhow::{Context, Result};
use sitebatch_api_rpc::RpcServerConfig;
use sitebatch_core::application::{EngineConfig, RetryPolicy};
use sitebatch_infra_artifact::SimulatorConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DB_PATH: &str = "~/.sitebatch/jobs.db";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db_path: String,
    pub rpc: RpcServerConfig,
    pub log_format: LogFormat,
    /// Daily rolling log files are written here when set
    pub log_dir: Option<PathBuf>,
    pub engine: EngineConfig,
    pub simulator: SimulatorConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("SITEBATCH_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let db_path = shellexpand::tilde(&db_path).into_owned();

        let defaults = RpcServerConfig::default();
        let rpc = RpcServerConfig {
            host: lookup("SITEBATCH_RPC_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "SITEBATCH_RPC_PORT")?.unwrap_or(defaults.port),
        };

        let log_format = match lookup("SITEBATCH_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let log_dir = lookup("SITEBATCH_LOG_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(|dir| PathBuf::from(shellexpand::tilde(&dir).into_owned()));

        let engine_defaults = EngineConfig::default();
        let retry = RetryPolicy::new(
            parse_var(&lookup, "SITEBATCH_MAX_ATTEMPTS")?
                .unwrap_or(engine_defaults.retry.max_attempts),
            parse_var(&lookup, "SITEBATCH_RETRY_BASE_DELAY_MS")?
                .unwrap_or(engine_defaults.retry.base_delay_ms),
            engine_defaults.retry.backoff_factor,
        );
        let engine = EngineConfig {
            immediate_delay_ms: parse_var(&lookup, "SITEBATCH_IMMEDIATE_DELAY_MS")?
                .unwrap_or(engine_defaults.immediate_delay_ms),
            retry,
        };

        let mut simulator = SimulatorConfig::default();
        if let Some(ms) = parse_var::<u64, _>(&lookup, "SITEBATCH_CREATOR_LATENCY_MS")? {
            simulator.latency = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "SITEBATCH_CREATOR_JITTER_MS")? {
            simulator.jitter = Duration::from_millis(ms);
        }

        Ok(Self {
            db_path,
            rpc,
            log_format,
            log_dir,
            engine,
            simulator,
        })
    }

    /// sqlx connection URL of the job database
    pub fn database_url(&self) -> String {
        if self.db_path.starts_with("sqlite:") {
            self.db_path.clone()
        } else {
            format!("sqlite://{}", self.db_path)
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} has an invalid value: {:?}", key, raw))
        })
        .transpose()
}
