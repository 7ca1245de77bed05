//! test doubles shared by the unit tests

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::coe_client::traits::CoeClient;
use crate::common::error::{BridgeError, CoeError};
use crate::entity::bo::conf_entity_bo::{ConfEntityToSend, EntitiesToSendBo};
use crate::entity::bo::inbound_channel_bo::InboundChannelBo;
use crate::entity::dto::coe_channel_dto::{ChannelMode, CoeChannelDto};
use crate::entity::dto::home_state_dto::HomeStateDto;
use crate::entity::dto::server_config_dto::ServerConfigDto;
use crate::home_bus::traits::{ChannelPublisher, StateSource};

#[derive(Debug, Clone, PartialEq)]
pub enum CoeCall {
    Update(u8),
    GetServerConfig,
    SendAnalog { channels: Vec<CoeChannelDto>, page: u8 },
    SendDigital { channels: Vec<CoeChannelDto>, second_half: bool },
    SendAnalogV2(Vec<CoeChannelDto>),
    SendDigitalV2(Vec<CoeChannelDto>),
}

impl CoeCall {
    pub fn is_send(&self) -> bool {
        !matches!(self, CoeCall::Update(_) | CoeCall::GetServerConfig)
    }
}

/// CoeClient that records every call
pub struct RecordingCoeClient {
    coe_version: u8,
    calls: Mutex<Vec<CoeCall>>,
    channels: HashMap<(u8, ChannelMode), BTreeMap<u32, CoeChannelDto>>,
    fail_sends: bool,
    fail_updates: bool,
}

impl RecordingCoeClient {
    pub fn new(coe_version: u8) -> Self {
        RecordingCoeClient {
            coe_version,
            calls: Mutex::new(Vec::new()),
            channels: HashMap::new(),
            fail_sends: false,
            fail_updates: false,
        }
    }

    pub fn with_channels(mut self, can_id: u8, mode: ChannelMode, channels: Vec<CoeChannelDto>) -> Self {
        let map = channels.into_iter().map(|c| (c.index, c)).collect();
        self.channels.insert((can_id, mode), map);
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn calls(&self) -> Vec<CoeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn send_calls(&self) -> Vec<CoeCall> {
        self.calls().into_iter().filter(|c| c.is_send()).collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: CoeCall) -> Result<(), CoeError> {
        let is_send = call.is_send();
        self.calls.lock().unwrap().push(call);
        if is_send && self.fail_sends {
            return Err(CoeError("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CoeClient for RecordingCoeClient {
    async fn update(&self, can_id: u8) -> Result<(), CoeError> {
        self.record(CoeCall::Update(can_id))?;
        if self.fail_updates {
            return Err(CoeError("connection refused".to_string()));
        }
        Ok(())
    }

    fn get_channels(&self, can_id: u8, mode: ChannelMode) -> BTreeMap<u32, CoeChannelDto> {
        self.channels.get(&(can_id, mode)).cloned().unwrap_or_default()
    }

    async fn get_server_config(&self) -> Result<ServerConfigDto, CoeError> {
        self.record(CoeCall::GetServerConfig)?;
        Ok(ServerConfigDto { coe_version: self.coe_version })
    }

    async fn send_analog_values(&self, channels: &[CoeChannelDto], page: u8) -> Result<(), CoeError> {
        self.record(CoeCall::SendAnalog { channels: channels.to_vec(), page })
    }

    async fn send_digital_values(&self, channels: &[CoeChannelDto], second_half: bool) -> Result<(), CoeError> {
        self.record(CoeCall::SendDigital { channels: channels.to_vec(), second_half })
    }

    async fn send_analog_values_v2(&self, channels: &[CoeChannelDto]) -> Result<(), CoeError> {
        self.record(CoeCall::SendAnalogV2(channels.to_vec()))
    }

    async fn send_digital_values_v2(&self, channels: &[CoeChannelDto]) -> Result<(), CoeError> {
        self.record(CoeCall::SendDigitalV2(channels.to_vec()))
    }
}

/// StateSource backed by a map, remembers which entities were read
#[derive(Default)]
pub struct MemoryStateSource {
    states: Mutex<HashMap<String, HomeStateDto>>,
    reads: Mutex<Vec<String>>,
}

impl MemoryStateSource {
    pub fn new() -> Self {
        MemoryStateSource::default()
    }

    pub fn set(&self, entity_id: &str, state: &str, unit: Option<&str>) {
        self.states
            .lock()
            .unwrap()
            .insert(entity_id.to_string(), HomeStateDto::new(entity_id, state, unit));
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

impl StateSource for MemoryStateSource {
    fn get_state(&self, entity_id: &str) -> Option<HomeStateDto> {
        self.reads.lock().unwrap().push(entity_id.to_string());
        self.states.lock().unwrap().get(entity_id).cloned()
    }
}

/// ChannelPublisher that keeps the records
#[derive(Default)]
pub struct RecordingPublisher {
    records: Mutex<Vec<InboundChannelBo>>,
}

impl RecordingPublisher {
    pub fn records(&self) -> Vec<InboundChannelBo> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelPublisher for RecordingPublisher {
    async fn publish_channel(&self, record: &InboundChannelBo) -> Result<(), BridgeError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// `count` entities `{domain}.test{n}` with ids 1..=count
pub fn dummy_entities(domain: &str, count: u32) -> Vec<ConfEntityToSend> {
    (0..count)
        .map(|i| ConfEntityToSend::new(i + 1, format!("{}.test{}", domain, i).as_str()))
        .collect()
}

pub fn analog_only(analog: Vec<ConfEntityToSend>) -> EntitiesToSendBo {
    EntitiesToSendBo { analog, digital: vec![] }
}

pub fn digital_only(digital: Vec<ConfEntityToSend>) -> EntitiesToSendBo {
    EntitiesToSendBo { analog: vec![], digital }
}
