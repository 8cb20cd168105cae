//! Operator configuration with TOML file support.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use boostly_types::LedgerParams;
use boostly_utils::LogFormat;

use crate::error::ConfigError;

/// Configuration for the `boostly` binary.
///
/// Loaded from a TOML file via [`BoostlyConfig::from_toml_file`]; command
/// line flags and `BOOSTLY_*` environment variables override it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostlyConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB. Bounds how large the ledger can grow.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Ledger parameters, from the `[ledger]` table.
    #[serde(default)]
    pub ledger: LedgerParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./boostly_data")
}

fn default_map_size_mb() -> u64 {
    1024
}

fn default_log_level() -> String {
    "warn".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl Default for BoostlyConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            ledger: LedgerParams::default(),
        }
    }
}

impl BoostlyConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map_size_mb == 0 {
            return Err(ConfigError::Invalid("map_size_mb must be greater than 0".into()));
        }
        if self.ledger.monthly_send_limit.is_zero() {
            return Err(ConfigError::Invalid(
                "ledger.monthly_send_limit must be greater than 0".into(),
            ));
        }
        if self.ledger.voucher_rate == 0 {
            return Err(ConfigError::Invalid(
                "ledger.voucher_rate must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// LMDB map size in bytes.
    pub fn map_size_bytes(&self) -> usize {
        usize::try_from(self.map_size_mb)
            .unwrap_or(usize::MAX)
            .saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boostly_types::Credits;

    #[test]
    fn empty_file_gives_defaults() {
        let config = BoostlyConfig::from_toml_str("").unwrap();
        assert_eq!(config, BoostlyConfig::default());
        assert_eq!(config.ledger.monthly_send_limit, Credits::new(100));
        assert_eq!(config.ledger.starting_balance, Credits::new(100));
        assert_eq!(config.ledger.voucher_rate, 5);
        assert_eq!(config.map_size_bytes(), 1 << 30);
    }

    #[test]
    fn partial_ledger_table() {
        let config = BoostlyConfig::from_toml_str(
            r#"
            data_dir = "/var/lib/boostly"
            log_format = "json"

            [ledger]
            voucher_rate = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/boostly"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.ledger.voucher_rate, 7);
        assert_eq!(config.ledger.notification_limit, 50);
    }

    #[test]
    fn example_file_matches_defaults() {
        let config = BoostlyConfig::from_toml_str(include_str!("../boostly.example.toml")).unwrap();
        assert_eq!(config, BoostlyConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            BoostlyConfig::from_toml_str("map_size_mb = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BoostlyConfig::from_toml_str("[ledger]\nmonthly_send_limit = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BoostlyConfig::from_toml_str("log_format = \"xml\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = BoostlyConfig::default();
        config.ledger.starting_balance = Credits::new(250);
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[ledger]"));
        assert_eq!(BoostlyConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boostly.toml");
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();
        assert_eq!(
            BoostlyConfig::from_toml_file(&path).unwrap().log_level,
            "debug"
        );
        assert!(matches!(
            BoostlyConfig::from_toml_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
