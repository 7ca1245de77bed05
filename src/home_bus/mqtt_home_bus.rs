//! home automation bus over MQTT
//! reads the `mqtt_statestream` layout: `{base}/{domain}/{object_id}/state` carries the raw state,
//! `{base}/{domain}/{object_id}/unit_of_measurement` the json encoded unit.
//! inbound CoE channels are published retained to `{publish_base}/can{can_id}/{analog|digital}/{index}`

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use paho_mqtt::AsyncReceiver;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::traits::{ChannelPublisher, StateSource};
use crate::common::error::{BridgeError, ErrorCode};
use crate::common::mqtt::MqttConnection;
use crate::common::setting::Mqtt;
use crate::entity::bo::inbound_channel_bo::{InboundChannelBo, InboundKind};
use crate::entity::dto::home_state_dto::{HomeStateDto, StateChangedDto};
use crate::{debug, info, trace, warn};

const LOG_TAG: &str = "mqtt_home_bus";

const STATE_ATTR: &str = "state";
const UNIT_ATTR: &str = "unit_of_measurement";

#[derive(Default)]
struct BusCache {
    states: HashMap<String, HomeStateDto>,
    units: HashMap<String, String>,
}

pub struct MqttHomeBus {
    con: MqttConnection,
    state_base_topic: String,
    publish_base_topic: String,
    cache: Mutex<BusCache>,
    // woken on every cached state
    state_arrived: Notify,
}

impl MqttHomeBus {
    fn new(con: MqttConnection, state_base_topic: &str, publish_base_topic: &str) -> Self {
        MqttHomeBus {
            con,
            state_base_topic: state_base_topic.trim_end_matches('/').to_string(),
            publish_base_topic: publish_base_topic.trim_end_matches('/').to_string(),
            cache: Mutex::new(BusCache::default()),
            state_arrived: Notify::new(),
        }
    }

    /// connect, subscribe the watched entities and start forwarding their changes
    pub async fn start(
        setting: &Mqtt,
        entity_ids: Vec<String>,
        event_tx: mpsc::Sender<StateChangedDto>,
        token: CancellationToken,
    ) -> Result<(Arc<Self>, JoinHandle<()>), BridgeError> {
        let client_id = format!("{}-{}", setting.client_id, Uuid::new_v4().simple());
        let mut con = MqttConnection::new(setting.broker_host.as_str(), setting.broker_port, client_id.as_str());
        let stream = con.connect().await.map_err(mqtt_error)?;

        let bus = Arc::new(MqttHomeBus::new(
            con,
            setting.state_base_topic.as_str(),
            setting.publish_base_topic.as_str(),
        ));

        for entity_id in &entity_ids {
            for attr in [STATE_ATTR, UNIT_ATTR] {
                let topic = state_topic(bus.state_base_topic.as_str(), entity_id, attr);
                bus.con.subscribe(topic.as_str()).await.map_err(mqtt_error)?;
            }
        }
        info!(LOG_TAG, "watching {} entities under {}", entity_ids.len(), bus.state_base_topic);

        let handle = tokio::spawn(listen(bus.clone(), stream, event_tx, token));
        Ok((bus, handle))
    }

    /// wait until every entity has a cached state, retained statestream messages
    /// arrive shortly after subscribing. false when the timeout hit first
    pub async fn wait_for_states(&self, entity_ids: &[String], timeout: Duration) -> bool {
        let all_cached = async {
            loop {
                let arrived = self.state_arrived.notified();
                if self.missing_states(entity_ids) == 0 {
                    return;
                }
                arrived.await;
            }
        };

        match tokio::time::timeout(timeout, all_cached).await {
            Ok(()) => true,
            Err(_) => {
                warn!(LOG_TAG, "{} entities have no state yet", self.missing_states(entity_ids));
                false
            }
        }
    }

    fn missing_states(&self, entity_ids: &[String]) -> usize {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        entity_ids.iter().filter(|id| !cache.states.contains_key(id.as_str())).count()
    }

    pub async fn disconnect(&self) -> Result<(), BridgeError> {
        self.con.disconnect().await.map_err(mqtt_error)
    }

    /// update the cache, a state message yields a change notification
    fn handle_message(&self, topic: &str, payload: &str) -> Option<StateChangedDto> {
        let (entity_id, attr) = parse_state_topic(self.state_base_topic.as_str(), topic)?;
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());

        match attr.as_str() {
            STATE_ATTR => {
                let unit = cache.units.get(&entity_id).map(|u| u.as_str());
                let state = HomeStateDto::new(entity_id.as_str(), payload.trim(), unit);
                cache.states.insert(entity_id.clone(), state.clone());
                self.state_arrived.notify_waiters();
                Some(StateChangedDto { entity_id, new_state: Some(state) })
            }
            UNIT_ATTR => {
                // a changed unit re-sends the cached state with it
                let unit = decode_attribute(payload);
                cache.units.insert(entity_id.clone(), unit.clone());
                let state = cache.states.get_mut(&entity_id)?;
                if state.unit_of_measurement.as_deref() == Some(unit.as_str()) {
                    return None;
                }
                state.unit_of_measurement = Some(unit);
                let state = state.clone();
                Some(StateChangedDto { entity_id, new_state: Some(state) })
            }
            _ => None,
        }
    }
}

impl StateSource for MqttHomeBus {
    fn get_state(&self, entity_id: &str) -> Option<HomeStateDto> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.states.get(entity_id).cloned()
    }
}

#[async_trait]
impl ChannelPublisher for MqttHomeBus {
    async fn publish_channel(&self, record: &InboundChannelBo) -> Result<(), BridgeError> {
        let topic = channel_topic(self.publish_base_topic.as_str(), record);
        let payload = serde_json::to_string(record).map_err(|e| {
            BridgeError::new(ErrorCode::MqttError, format!("cannot encode channel record: {e}"))
        })?;
        trace!(LOG_TAG, "publish {}: {}", topic, payload);
        self.con.publish(topic.as_str(), payload.as_str(), true).await.map_err(mqtt_error)
    }
}

async fn listen(
    bus: Arc<MqttHomeBus>,
    mut stream: AsyncReceiver<Option<paho_mqtt::Message>>,
    event_tx: mpsc::Sender<StateChangedDto>,
    token: CancellationToken,
) {
    info!(LOG_TAG, "state listener started");
    loop {
        let message = tokio::select! {
            _ = token.cancelled() => break,
            message = stream.next() => message,
        };

        match message {
            Some(Some(msg)) => {
                let payload = msg.payload_str();
                if let Some(event) = bus.handle_message(msg.topic(), payload.as_ref()) {
                    debug!(LOG_TAG, "state of {} is now {:?}", event.entity_id, event.new_state.as_ref().map(|s| &s.state));
                    if event_tx.send(event).await.is_err() {
                        warn!(LOG_TAG, "state change receiver dropped");
                        break;
                    }
                }
            }
            Some(None) => {
                warn!(LOG_TAG, "connection lost, waiting for reconnect");
            }
            None => {
                warn!(LOG_TAG, "message stream closed");
                break;
            }
        }
    }
    info!(LOG_TAG, "state listener stopped");
}

fn mqtt_error(e: paho_mqtt::Error) -> BridgeError {
    BridgeError::new(ErrorCode::MqttError, format!("mqtt error: {e}"))
}

/// `{base}/{domain}/{object_id}/{attr}`
fn state_topic(base: &str, entity_id: &str, attr: &str) -> String {
    match entity_id.split_once('.') {
        Some((domain, object_id)) => format!("{}/{}/{}/{}", base, domain, object_id, attr),
        None => format!("{}/{}/{}", base, entity_id, attr),
    }
}

/// entity id and attribute of a statestream topic
fn parse_state_topic(base: &str, topic: &str) -> Option<(String, String)> {
    let rest = topic.strip_prefix(base)?.strip_prefix('/')?;
    let parts: Vec<&str> = rest.split('/').collect();
    match parts[..] {
        [domain, object_id, attr] if !domain.is_empty() && !object_id.is_empty() => {
            Some((format!("{}.{}", domain, object_id), attr.to_string()))
        }
        _ => None,
    }
}

fn channel_topic(base: &str, record: &InboundChannelBo) -> String {
    let mode = match record.kind {
        InboundKind::Sensor => "analog",
        InboundKind::Binary => "digital",
    };
    format!("{}/can{}/{}/{}", base, record.can_id, mode, record.index)
}

/// attributes are json encoded, fall back to the raw text
fn decode_attribute(payload: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Null) => String::new(),
        Ok(other) => other.to_string(),
        Err(_) => payload.trim().to_string(),
    }
}
