//! Configuration types for the carline service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use chrono_tz::Tz;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub school: SchoolConfig,
    #[serde(default)]
    pub auto_clear: AutoClearConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Per-school settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolConfig {
    #[serde(default = "default_school_id")]
    pub id: String,
    #[serde(default = "default_school_name")]
    pub name: String,
    /// IANA timezone name used to compute the school day
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Cone count used when today's lane is created
    #[serde(default = "default_cone_count")]
    pub default_cone_count: u32,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            id: default_school_id(),
            name: default_school_name(),
            timezone: default_timezone(),
            default_cone_count: default_cone_count(),
        }
    }
}

impl SchoolConfig {
    /// Parse the configured timezone
    pub fn tz(&self) -> crate::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| crate::CarlineError::Timezone(self.timezone.clone()))
    }
}

/// Auto-clear timer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoClearConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// How long a car may sit in "sent" before it is completed automatically
    #[serde(default = "default_delay")]
    pub delay_seconds: u64,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
}

impl Default for AutoClearConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_seconds: default_delay(),
            check_interval_seconds: default_check_interval(),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

/// Document store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Optional JSON fixture loaded into the in-memory store at startup
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

fn default_school_id() -> String {
    "default".to_string()
}

fn default_school_name() -> String {
    "School".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_cone_count() -> u32 {
    4
}

fn default_delay() -> u64 {
    300
}

fn default_check_interval() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11118
}

impl Config {
    /// Reject settings the service cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        self.school.tz()?;
        if !(1..=crate::lane::MAX_CONES).contains(&self.school.default_cone_count) {
            return Err(crate::CarlineError::Config(format!(
                "school.default_cone_count must be between 1 and {}",
                crate::lane::MAX_CONES
            )));
        }
        if self.auto_clear.check_interval_seconds == 0 {
            return Err(crate::CarlineError::Config(
                "auto_clear.check_interval_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::CarlineError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
