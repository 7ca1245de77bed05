//! CoE channel data transmission objects

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coe_client::units;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    Analog,
    Digital,
}

impl ChannelMode {
    pub fn all() -> [ChannelMode; 2] {
        [ChannelMode::Analog, ChannelMode::Digital]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelValue {
    Digital(bool),
    Analog(f64),
}

impl ChannelValue {
    pub fn as_bool(&self) -> bool {
        match self {
            ChannelValue::Digital(v) => *v,
            ChannelValue::Analog(v) => *v != 0.0,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            ChannelValue::Digital(v) => if *v { 1.0 } else { 0.0 },
            ChannelValue::Analog(v) => *v,
        }
    }
}

/// one channel on the CoE bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoeChannelDto {
    pub mode: ChannelMode,
    pub index: u32,
    pub value: ChannelValue,
    // protocol unit id as string, "" for v1 digital channels
    pub unit: String,
}

impl CoeChannelDto {
    pub fn analog(index: u32, value: f64, unit: &str) -> Self {
        CoeChannelDto {
            mode: ChannelMode::Analog,
            index,
            value: ChannelValue::Analog(value),
            unit: unit.to_string(),
        }
    }

    pub fn digital(index: u32, value: bool, unit: &str) -> Self {
        CoeChannelDto {
            mode: ChannelMode::Digital,
            index,
            value: ChannelValue::Digital(value),
            unit: unit.to_string(),
        }
    }

    /// display name of the unit id
    pub fn get_unit(&self) -> &'static str {
        units::unit_name(self.unit.as_str())
    }
}

/// one entry of a `/receive/{can_id}` answer
#[derive(Debug, Clone, Deserialize)]
pub struct ReceivedChannelDto {
    pub value: Value,
    pub unit: Value,
}

/// `/receive/{can_id}` answer
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveDataDto {
    #[serde(default)]
    pub digital: Vec<ReceivedChannelDto>,
    #[serde(default)]
    pub analog: Vec<ReceivedChannelDto>,
    pub last_update_unix: Option<f64>,
}
