//! inbound CoE channel republished as local sensor state

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InboundKind {
    Sensor,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboundChannelBo {
    pub can_id: u8,
    pub kind: InboundKind,
    pub index: u32,
    // formatted value, "on"/"off"/"yes"/"no" for switch like units
    pub value: String,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<&'static str>,
    pub name: String,
    pub unique_id: String,
}
