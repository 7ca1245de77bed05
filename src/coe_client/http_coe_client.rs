//! CoE relay add-on over http
//! - `GET /receive/{can_id}` inbound channels
//! - `POST /send/analog`, `POST /send/digital` v1 pages
//! - `POST /v2/send/analog`, `POST /v2/send/digital` v2 indexed channels
//! - `GET /config` relay configuration

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::traits::CoeClient;
use crate::common::error::CoeError;
use crate::common::http::HttpConnection;
use crate::entity::dto::coe_channel_dto::{ChannelMode, CoeChannelDto, ReceiveDataDto, ReceivedChannelDto};
use crate::entity::dto::server_config_dto::ServerConfigDto;
use crate::debug;

const LOG_TAG: &str = "coe_http";

const RECEIVE_PATH: &str = "/receive";
const SEND_ANALOG_PATH: &str = "/send/analog";
const SEND_DIGITAL_PATH: &str = "/send/digital";
const SEND_ANALOG_PATH_V2: &str = "/v2/send/analog";
const SEND_DIGITAL_PATH_V2: &str = "/v2/send/digital";
const CONFIG_PATH: &str = "/config";

type ChannelCache = HashMap<u8, HashMap<ChannelMode, BTreeMap<u32, CoeChannelDto>>>;

pub struct HttpCoeClient {
    con: HttpConnection,
    channels: Mutex<ChannelCache>,
}

impl HttpCoeClient {
    pub fn new(host: &str) -> Self {
        HttpCoeClient {
            con: HttpConnection::new(host),
            channels: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CoeClient for HttpCoeClient {
    async fn update(&self, can_id: u8) -> Result<(), CoeError> {
        let raw = self.con.api_get(format!("{}/{}", RECEIVE_PATH, can_id).as_str()).await?;
        let parsed = parse_receive_data(raw)?;
        debug!(
            LOG_TAG,
            "received CAN {}: {} analog, {} digital channels",
            can_id,
            parsed.get(&ChannelMode::Analog).map_or(0, |c| c.len()),
            parsed.get(&ChannelMode::Digital).map_or(0, |c| c.len())
        );
        let mut guard = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(can_id, parsed);
        Ok(())
    }

    fn get_channels(&self, can_id: u8, mode: ChannelMode) -> BTreeMap<u32, CoeChannelDto> {
        let guard = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .get(&can_id)
            .and_then(|modes| modes.get(&mode))
            .cloned()
            .unwrap_or_default()
    }

    async fn get_server_config(&self) -> Result<ServerConfigDto, CoeError> {
        let raw = self.con.api_get(CONFIG_PATH).await?;
        serde_json::from_value(raw).map_err(|e| CoeError(format!("malformed server config: {e}")))
    }

    async fn send_analog_values(&self, channels: &[CoeChannelDto], page: u8) -> Result<(), CoeError> {
        self.con.api_post(SEND_ANALOG_PATH, v1_analog_body(channels, page)).await?;
        Ok(())
    }

    async fn send_digital_values(&self, channels: &[CoeChannelDto], second_half: bool) -> Result<(), CoeError> {
        self.con.api_post(SEND_DIGITAL_PATH, v1_digital_body(channels, second_half)).await?;
        Ok(())
    }

    async fn send_analog_values_v2(&self, channels: &[CoeChannelDto]) -> Result<(), CoeError> {
        self.con.api_post(SEND_ANALOG_PATH_V2, v2_body(channels)).await?;
        Ok(())
    }

    async fn send_digital_values_v2(&self, channels: &[CoeChannelDto]) -> Result<(), CoeError> {
        self.con.api_post(SEND_DIGITAL_PATH_V2, v2_body(channels)).await?;
        Ok(())
    }
}

fn v1_values(channels: &[CoeChannelDto]) -> Vec<Value> {
    channels
        .iter()
        .map(|c| json!({ "value": c.value, "unit": c.unit }))
        .collect()
}

fn v1_analog_body(channels: &[CoeChannelDto], page: u8) -> Value {
    json!({ "values": v1_values(channels), "page": page })
}

fn v1_digital_body(channels: &[CoeChannelDto], second_half: bool) -> Value {
    json!({ "values": v1_values(channels), "second_page": second_half })
}

fn v2_body(channels: &[CoeChannelDto]) -> Value {
    let values: Vec<Value> = channels
        .iter()
        .map(|c| json!({ "index": c.index, "value": c.value, "unit": c.unit }))
        .collect();
    json!({ "values": values })
}

/// channels of a receive answer, indexed from 1 in list order
fn parse_receive_data(raw: Value) -> Result<HashMap<ChannelMode, BTreeMap<u32, CoeChannelDto>>, CoeError> {
    let data: ReceiveDataDto =
        serde_json::from_value(raw).map_err(|e| CoeError(format!("malformed receive data: {e}")))?;

    let mut result = HashMap::new();
    result.insert(ChannelMode::Analog, to_channels(ChannelMode::Analog, &data.analog)?);
    result.insert(ChannelMode::Digital, to_channels(ChannelMode::Digital, &data.digital)?);
    Ok(result)
}

fn to_channels(mode: ChannelMode, raw: &[ReceivedChannelDto]) -> Result<BTreeMap<u32, CoeChannelDto>, CoeError> {
    let mut channels = BTreeMap::new();
    for (i, channel) in raw.iter().enumerate() {
        let index = i as u32 + 1;
        let unit = match &channel.unit {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            other => return Err(CoeError(format!("channel {} has invalid unit {}", index, other))),
        };
        let dto = match mode {
            ChannelMode::Analog => {
                let value = match &channel.value {
                    Value::Number(n) => n.as_f64().unwrap_or(0.0),
                    Value::Bool(b) => if *b { 1.0 } else { 0.0 },
                    other => return Err(CoeError(format!("analog channel {} has invalid value {}", index, other))),
                };
                CoeChannelDto::analog(index, value, unit.as_str())
            }
            ChannelMode::Digital => {
                let value = match &channel.value {
                    Value::Bool(b) => *b,
                    Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
                    other => return Err(CoeError(format!("digital channel {} has invalid value {}", index, other))),
                };
                CoeChannelDto::digital(index, value, unit.as_str())
            }
        };
        channels.insert(index, dto);
    }
    Ok(channels)
}
