//! Runtime configuration: parsing, validation, and loading.
//!
//! A small TOML file tunes a run:
//!
//! ```toml
//! [source]
//! dir = "data/northwind"    # JSON table exports
//!
//! [joins]
//! key_policy = "validate"   # or "fan_out"
//!
//! [cache]
//! ttl_secs = 3600           # 0 disables the result cache
//!
//! [logging]
//! filter = "info,sales_etl=debug"
//! ```
//!
//! Every section and key is optional. Unknown keys are rejected so typos
//! don't silently fall back to defaults.
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use sales_extract::sources::json_dir::DATA_DIR_ENV;
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_var_opt;
use toml::from_str;

use crate::fact::KeyPolicy;
use crate::pipeline::PipelineOptions;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct EtlConfig {
    /// Where the raw tables come from.
    pub source: SourceCfg,
    /// Fact builder join behaviour.
    pub joins: JoinsCfg,
    /// Result cache.
    pub cache: CacheCfg,
    /// Log filtering.
    pub logging: LoggingCfg,
}

/// `[source]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SourceCfg {
    /// Directory of `<table>.json` exports.
    pub dir: Option<PathBuf>,
}

/// `[joins]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct JoinsCfg {
    /// Duplicate-key handling.
    pub key_policy: KeyPolicy,
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct CacheCfg {
    /// Seconds a pipeline result stays fresh.
    pub ttl_secs: u64,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

impl CacheCfg {
    /// TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingCfg {
    /// `tracing_subscriber::EnvFilter` directive, used when `SALES_ETL_LOG`
    /// is unset.
    pub filter: String,
}

impl Default for LoggingCfg {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl EtlConfig {
    /// Options for [`Pipeline`](crate::pipeline::Pipeline).
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            key_policy: self.joins.key_policy,
        }
    }

    /// Pick the data directory: `cli` wins, then the environment
    /// (`NORTHWIND_DATA_DIR`), then `[source] dir`.
    pub fn resolve_source_dir(&self, cli: Option<PathBuf>) -> anyhow::Result<PathBuf> {
        if let Some(dir) = cli {
            return Ok(dir);
        }
        if let Some(dir) = get_env_var_opt(DATA_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        match &self.source.dir {
            Some(dir) => Ok(dir.clone()),
            None => bail!(
                "no data directory: pass --source, set {DATA_DIR_ENV}, or add [source] dir to the config"
            ),
        }
    }
}

/// Check values serde can't.
pub fn validate_config(cfg: &EtlConfig) -> anyhow::Result<()> {
    if cfg.logging.filter.trim().is_empty() {
        bail!("logging.filter cannot be empty");
    }
    if cfg.source.dir.as_ref().is_some_and(|d| d.as_os_str().is_empty()) {
        bail!("source.dir cannot be empty");
    }
    Ok(())
}

/// Parse a configuration TOML string and validate it.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<EtlConfig> {
    let cfg: EtlConfig = from_str(toml_str).context("failed to parse config TOML")?;
    validate_config(&cfg).context("invalid config")?;
    Ok(cfg)
}

/// Read a configuration TOML file from disk, parse, and validate it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<EtlConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_config_is_all_defaults() {
        let cfg = load_config_str("").unwrap();
        assert_eq!(cfg, EtlConfig::default());
        assert_eq!(cfg.joins.key_policy, KeyPolicy::Validate);
        assert_eq!(cfg.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(cfg.logging.filter, "info");
    }

    #[test]
    fn parses_every_section() {
        let cfg = load_config_str(
            r#"
            [source]
            dir = "/srv/northwind"

            [joins]
            key_policy = "fan_out"

            [cache]
            ttl_secs = 0

            [logging]
            filter = "warn,sales_etl=debug"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.source.dir, Some(PathBuf::from("/srv/northwind")));
        assert_eq!(cfg.pipeline_options().key_policy, KeyPolicy::FanOut);
        assert_eq!(cfg.cache.ttl(), Duration::ZERO);
        assert_eq!(cfg.logging.filter, "warn,sales_etl=debug");
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(load_config_str("[joins]\nkey_polcy = \"validate\"").is_err());
        assert!(load_config_str("[joins]\nkey_policy = \"explode\"").is_err());
        assert!(load_config_str("[logging]\nfilter = \"  \"").is_err());
        assert!(load_config_str("[source]\ndir = \"\"").is_err());
    }

    #[test]
    fn cli_dir_wins() {
        let cfg = load_config_str("[source]\ndir = \"/from/config\"").unwrap();
        let dir = cfg.resolve_source_dir(Some("/from/cli".into())).unwrap();
        assert_eq!(dir, PathBuf::from("/from/cli"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nttl_secs = 5").unwrap();
        let cfg = load_config_path(file.path()).unwrap();
        assert_eq!(cfg.cache.ttl_secs, 5);
        assert!(load_config_path(file.path().with_extension("missing")).is_err());
    }
}
