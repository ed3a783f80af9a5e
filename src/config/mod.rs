use anyhow::{Context, Result};
use config::{Config, File, FileFormat};
use indexmap::IndexMap;
use log::{debug, LevelFilter};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{MeasurementType, Outlet, Schedule, Sensor};
use crate::protocol::CodeTable;

pub const DEFAULT_CONFIG_FILE: &str = "greenery.toml";

pub const POLLING_INTERVAL: &str = "polling interval minutes";
pub const FAHRENHEIT: &str = "store temperature fahrenheit";
pub const RF_TX_PIN: &str = "rf tx pin";
pub const RF_TX_BASE_CODE: &str = "rf tx base code";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub timeout_secs: u64,
    /// Pause after opening, while the board resets.
    pub boot_delay_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            timeout_secs: 5,
            boot_delay_ms: 2000,
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn boot_delay(&self) -> Duration {
        Duration::from_millis(self.boot_delay_ms)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProtocolConfig {
    pub codes: CodeTable,
    /// Whether humidity queries carry a sensor-model digit like temperature queries do.
    pub humidity_subtype: bool,
    /// Upper bound on response lines read for one command.
    pub max_response_lines: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            codes: CodeTable::default(),
            humidity_subtype: true,
            max_response_lines: 32,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Measurements are appended here, one JSON object per line.
    pub measurements: PathBuf,
    pub outlet_states: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            measurements: PathBuf::from("measurements.jsonl"),
            outlet_states: PathBuf::from("outlet-states.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Bool(b) => Some(i64::from(*b)),
            SettingValue::Integer(i) => Some(*i),
            SettingValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            SettingValue::Float(_) => None,
            SettingValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Integer(i) => Some(*i != 0),
            SettingValue::Float(f) => Some(*f != 0.0),
            SettingValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" => Some(true),
                "false" | "no" | "off" | "" => Some(false),
                other => other.parse::<i64>().ok().map(|i| i != 0),
            },
        }
    }
}

/// Name → value lookup for operator-editable settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Settings(IndexMap<String, SettingValue>);

impl Settings {
    pub fn get(&self, name: &str) -> Option<&SettingValue> {
        self.0.get(name)
    }

    pub fn set(&mut self, name: &str, value: SettingValue) {
        self.0.insert(name.to_string(), value);
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(SettingValue::as_i64)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(SettingValue::as_bool)
    }

    pub fn polling_interval(&self) -> Option<u32> {
        self.integer(POLLING_INTERVAL)
            .and_then(|v| u32::try_from(v).ok())
    }

    pub fn fahrenheit(&self) -> bool {
        self.flag(FAHRENHEIT).unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub measurement_types: Vec<MeasurementType>,
    #[serde(default)]
    pub sensors: Vec<Sensor>,
    #[serde(default)]
    pub outlets: Vec<Outlet>,
    /// `None` when the file has no schedule section at all.
    #[serde(default)]
    pub schedules: Option<Vec<Schedule>>,
}

impl AppConfig {
    pub fn get_log_level(&self) -> LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            "off" => LevelFilter::Off,
            _ => LevelFilter::Info, // Default to Info if invalid
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref();
        debug!("Loading configuration from {}", config_path.display());

        let config = Config::builder()
            .add_source(File::from(config_path).format(FileFormat::Toml))
            .build()
            .context(format!("Failed to load config from {}", config_path.display()))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize config")?;

        Ok(app_config)
    }
}
