//! setting config file
//! loaded from `config_{ENV}.toml`, overridable with `COE_BRIDGE__SECTION__KEY` env vars

use std::env;
use config::{Config, Environment, File, FileFormat};
use lazy_static::lazy_static;
use serde::Deserialize;

use super::error::{BridgeError, ErrorCode};
use crate::entity::bo::conf_entity_bo::{ConfEntityToSend, EntitiesToSendBo};
use crate::{info, warn};

const LOG_TAG: &str = "setting";

const ENV_PREFIX: &str = "COE_BRIDGE";

#[derive(Debug, Deserialize)]
pub struct Env {
    pub debug: bool,
    pub env: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Coe {
    /// address of the CoE relay, with or without scheme
    pub host: String,
    /// CAN bus ids polled for inbound channels
    #[serde(default)]
    pub can_ids: Vec<u8>,
    #[serde(default = "default_scan_interval")]
    pub scan_interval_minutes: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u64,
}

#[derive(Debug, Deserialize)]
pub struct Mqtt {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    /// base topic of the home automation state stream
    #[serde(default = "default_state_base_topic")]
    pub state_base_topic: String,
    /// base topic the inbound CoE channels are published under
    #[serde(default = "default_publish_base_topic")]
    pub publish_base_topic: String,
}

/// entities to send to the CoE server
#[derive(Debug, Default, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub analog: Vec<ConfEntityToSend>,
    #[serde(default)]
    pub digital: Vec<ConfEntityToSend>,
    /// flat entity list with free slot markers, from older configurations
    #[serde(default)]
    pub legacy: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub env: Env,
    pub coe: Coe,
    pub mqtt: Mqtt,
    #[serde(default)]
    pub entities: Entities,
}

const SCAN_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 1..=60;

fn default_scan_interval() -> u64 {
    1
}

fn default_refresh_interval() -> u64 {
    10
}

fn default_state_base_topic() -> String {
    String::from("homeassistant")
}

fn default_publish_base_topic() -> String {
    String::from("ta_coe")
}

impl Default for Settings {
    fn default() -> Self {
        let env = match env::var("ENV") {
            Ok(e) => e,
            Err(_) => {
                log::warn!("no ENV set, use default: 'dev'");
                String::from("dev")
            }
        };

        let file_path: String = format!("config_{}.toml", env);

        match Settings::from_file(file_path.as_str()) {
            Ok(settings) => settings,
            Err(e) => panic!("cannot load config file {}: {}", file_path, e)
        }
    }
}

impl Coe {
    /// scan interval 1..=60 minutes, refresh interval at least 1 minute
    pub fn validate(&self) -> Result<(), BridgeError> {
        if !SCAN_INTERVAL_RANGE.contains(&self.scan_interval_minutes) {
            return Err(BridgeError::new(
                ErrorCode::ConfigError,
                format!("coe.scan_interval_minutes must be within 1..=60, got {}", self.scan_interval_minutes),
            ));
        }
        if self.refresh_interval_minutes == 0 {
            return Err(BridgeError::new(
                ErrorCode::ConfigError,
                "coe.refresh_interval_minutes must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Settings {
    pub fn get<'a>() -> &'a Self {
        // lazily built process wide instance
        lazy_static! {
            static ref CACHE: Settings = Settings::default();
        }
        &CACHE
    }

    /// read a toml file and apply env var overrides
    pub fn from_file(file_path: &str) -> Result<Self, BridgeError> {
        let builder = Config::builder()
            .add_source(File::new(file_path, FileFormat::Toml))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));
        Self::build(builder)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, BridgeError> {
        let builder = Config::builder().add_source(File::from_str(content, FileFormat::Toml));
        Self::build(builder)
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self, BridgeError> {
        let settings = builder
            .build()
            .and_then(|c| c.try_deserialize::<Settings>())
            .map_err(|e| BridgeError::new(ErrorCode::ConfigError, format!("config file format invalid: {e}")))?;
        settings.coe.validate()?;
        Ok(settings)
    }

    /// configured entities in the current shape, migrated from the legacy list when needed
    pub fn entities_to_send(&self) -> Result<EntitiesToSendBo, BridgeError> {
        let entities = &self.entities;
        let bo = if entities.analog.is_empty() && entities.digital.is_empty() && !entities.legacy.is_empty() {
            info!(LOG_TAG, "migrating {} legacy entity entries", entities.legacy.len());
            EntitiesToSendBo::migrate_legacy_entities(&entities.legacy)
        } else {
            if !entities.legacy.is_empty() {
                warn!(LOG_TAG, "legacy entity list ignored, analog/digital lists are set");
            }
            EntitiesToSendBo {
                analog: entities.analog.clone(),
                digital: entities.digital.clone(),
            }
        };
        bo.validate()?;
        Ok(bo)
    }
}
