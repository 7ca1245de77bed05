//! polls the CoE relay and republishes the received channels locally

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::coe_client::traits::CoeClient;
use crate::common::error::BridgeError;
use crate::entity::bo::inbound_channel_bo::{InboundChannelBo, InboundKind};
use crate::entity::dto::coe_channel_dto::{ChannelMode, CoeChannelDto};
use crate::home_bus::traits::ChannelPublisher;
use crate::{debug, error, info};

const LOG_TAG: &str = "inbound_coordinator";

pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

const STATE_CLASS_TOTAL: &str = "total";
const STATE_CLASS_MEASUREMENT: &str = "measurement";

const DEVICE_CLASS_MAP: [(&str, &str); 26] = [
    ("°C", "temperature"),
    ("K", "temperature"),
    ("A", "current"),
    ("mA", "current"),
    ("kWh", "energy"),
    ("MWh", "energy"),
    ("km/h", "speed"),
    ("m/s", "speed"),
    ("Hz", "frequency"),
    ("km", "distance"),
    ("m", "distance"),
    ("mm", "distance"),
    ("cm", "distance"),
    ("%", "humidity"),
    ("kg", "weight"),
    ("t", "weight"),
    ("g", "weight"),
    ("l", "water"),
    ("lx", "illuminance"),
    ("W", "power"),
    ("kW", "power"),
    ("mbar", "pressure"),
    ("bar", "pressure"),
    ("Pa", "pressure"),
    ("V", "voltage"),
    ("W/m²", "irradiance"),
];

fn device_class(unit: &str) -> Option<&'static str> {
    DEVICE_CLASS_MAP
        .iter()
        .find(|(u, _)| *u == unit)
        .map(|(_, class)| *class)
}

fn state_class(device_class: Option<&str>) -> &'static str {
    match device_class {
        Some("energy") | Some("water") => STATE_CLASS_TOTAL,
        _ => STATE_CLASS_MEASUREMENT,
    }
}

/// value and display unit, switch like units become words
pub fn format_input(channel: &CoeChannelDto) -> (String, String) {
    let unit = channel.get_unit();
    match unit {
        "On/Off" => {
            let value = if channel.value.as_bool() { "on" } else { "off" };
            (value.to_string(), String::new())
        }
        "No/Yes" => {
            let value = if channel.value.as_bool() { "yes" } else { "no" };
            (value.to_string(), String::new())
        }
        _ => (channel.value.as_f64().to_string(), unit.to_string()),
    }
}

fn to_record(can_id: u8, mode: ChannelMode, channel: &CoeChannelDto) -> InboundChannelBo {
    let (value, unit) = format_input(channel);
    let index = channel.index;
    match mode {
        ChannelMode::Analog => {
            let device_class = device_class(unit.as_str());
            InboundChannelBo {
                can_id,
                kind: InboundKind::Sensor,
                index,
                value,
                unit: if unit == "l" { "L".to_string() } else { unit },
                is_on: None,
                device_class,
                state_class: Some(state_class(device_class)),
                name: format!("CoE Analog - CAN{} {}", can_id, index),
                unique_id: format!("ta-coe-analog-can{}-{}", can_id, index),
            }
        }
        ChannelMode::Digital => {
            let is_on = value == "on" || value == "yes";
            InboundChannelBo {
                can_id,
                kind: InboundKind::Binary,
                index,
                value,
                unit,
                is_on: Some(is_on),
                device_class: None,
                state_class: None,
                name: format!("CoE Digital - CAN{} {}", can_id, index),
                unique_id: format!("ta-coe-digital-can{}-{}", can_id, index),
            }
        }
    }
}

pub struct InboundCoordinator {
    coe: Arc<dyn CoeClient>,
    publisher: Arc<dyn ChannelPublisher>,
    can_ids: Vec<u8>,
    interval: Duration,
}

impl InboundCoordinator {
    pub fn new(
        coe: Arc<dyn CoeClient>,
        publisher: Arc<dyn ChannelPublisher>,
        can_ids: Vec<u8>,
        interval: Duration,
    ) -> Self {
        debug!(LOG_TAG, "used update interval: {:?}", interval);
        InboundCoordinator {
            coe,
            publisher,
            can_ids,
            interval,
        }
    }

    /// fetch every configured CAN id, analog channels first
    pub async fn refresh(&self) -> Result<Vec<InboundChannelBo>, BridgeError> {
        debug!(LOG_TAG, "try to update CoE");
        let mut records = Vec::new();
        for can_id in self.can_ids.iter() {
            self.coe.update(*can_id).await?;
            for mode in ChannelMode::all() {
                for channel in self.coe.get_channels(*can_id, mode).values() {
                    records.push(to_record(*can_id, mode, channel));
                }
            }
        }
        Ok(records)
    }

    pub async fn refresh_and_publish(&self) -> Result<usize, BridgeError> {
        let records = self.refresh().await?;
        for record in records.iter() {
            self.publisher.publish_channel(record).await?;
        }
        debug!(LOG_TAG, "published {} inbound channels", records.len());
        Ok(records.len())
    }
}

/// republish on every scan interval until cancelled, the first refresh runs at load
pub fn inbound_polling_task(coordinator: Arc<InboundCoordinator>, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(LOG_TAG, "inbound polling started for CAN ids {:?}", coordinator.can_ids);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(coordinator.interval) => {}
            }

            if let Err(e) = coordinator.refresh_and_publish().await {
                error!(LOG_TAG, "cannot update CoE data: {}", e);
            }
        }
        info!(LOG_TAG, "inbound polling stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ErrorCode;
    use crate::test_util::{CoeCall, RecordingCoeClient, RecordingPublisher};

    fn make_coordinator(client: RecordingCoeClient, can_ids: Vec<u8>) -> (Arc<RecordingCoeClient>, Arc<RecordingPublisher>, InboundCoordinator) {
        let client = Arc::new(client);
        let publisher = Arc::new(RecordingPublisher::default());
        let coordinator = InboundCoordinator::new(client.clone(), publisher.clone(), can_ids, DEFAULT_SCAN_INTERVAL);
        (client, publisher, coordinator)
    }

    #[test]
    fn test_format_switch_units() {
        assert_eq!(format_input(&CoeChannelDto::digital(1, true, "43")), ("on".to_string(), String::new()));
        assert_eq!(format_input(&CoeChannelDto::digital(1, false, "43")), ("off".to_string(), String::new()));
        assert_eq!(format_input(&CoeChannelDto::digital(1, true, "44")), ("yes".to_string(), String::new()));
        assert_eq!(format_input(&CoeChannelDto::analog(1, 0.0, "44")), ("no".to_string(), String::new()));
    }

    #[test]
    fn test_format_measurement() {
        assert_eq!(format_input(&CoeChannelDto::analog(1, 21.5, "1")), ("21.5".to_string(), "°C".to_string()));
        assert_eq!(format_input(&CoeChannelDto::analog(1, 3.0, "999")), ("3".to_string(), String::new()));
    }

    #[test]
    fn test_analog_record() {
        let record = to_record(2, ChannelMode::Analog, &CoeChannelDto::analog(3, 12.5, "11"));
        assert_eq!(record.kind, InboundKind::Sensor);
        assert_eq!(record.unit, "kWh");
        assert_eq!(record.device_class, Some("energy"));
        assert_eq!(record.state_class, Some(STATE_CLASS_TOTAL));
        assert_eq!(record.name, "CoE Analog - CAN2 3");
        assert_eq!(record.unique_id, "ta-coe-analog-can2-3");

        let record = to_record(2, ChannelMode::Analog, &CoeChannelDto::analog(4, 20.0, "1"));
        assert_eq!(record.device_class, Some("temperature"));
        assert_eq!(record.state_class, Some(STATE_CLASS_MEASUREMENT));
    }

    #[test]
    fn test_litre_is_displayed_upper_case() {
        let unit_id = crate::coe_client::units::unit_id_from_name("l");
        let record = to_record(1, ChannelMode::Analog, &CoeChannelDto::analog(1, 100.0, unit_id));
        assert_eq!(record.unit, "L");
        assert_eq!(record.device_class, Some("water"));
        assert_eq!(record.state_class, Some(STATE_CLASS_TOTAL));
    }

    #[test]
    fn test_digital_record() {
        let record = to_record(1, ChannelMode::Digital, &CoeChannelDto::digital(7, true, "44"));
        assert_eq!(record.kind, InboundKind::Binary);
        assert_eq!(record.value, "yes");
        assert_eq!(record.is_on, Some(true));
        assert_eq!(record.name, "CoE Digital - CAN1 7");
        assert_eq!(record.unique_id, "ta-coe-digital-can1-7");

        let record = to_record(1, ChannelMode::Digital, &CoeChannelDto::digital(8, false, "43"));
        assert_eq!(record.is_on, Some(false));
    }

    #[tokio::test]
    async fn test_refresh_every_can_id() {
        let client = RecordingCoeClient::new(2)
            .with_channels(1, ChannelMode::Analog, vec![CoeChannelDto::analog(1, 4.0, "1")])
            .with_channels(1, ChannelMode::Digital, vec![CoeChannelDto::digital(1, true, "43")])
            .with_channels(5, ChannelMode::Digital, vec![CoeChannelDto::digital(2, false, "43")]);
        let (client, publisher, coordinator) = make_coordinator(client, vec![1, 5]);

        assert_eq!(coordinator.refresh_and_publish().await.unwrap(), 3);

        assert_eq!(client.calls(), vec![CoeCall::Update(1), CoeCall::Update(5)]);
        let records = publisher.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].kind, InboundKind::Sensor);
        assert_eq!(records[1].unique_id, "ta-coe-digital-can1-1");
        assert_eq!(records[2].unique_id, "ta-coe-digital-can5-2");
    }

    #[tokio::test]
    async fn test_refresh_failure_is_returned() {
        let (_, publisher, coordinator) = make_coordinator(RecordingCoeClient::new(2).failing_updates(), vec![1]);

        let err = coordinator.refresh_and_publish().await.unwrap_err();

        assert_eq!(err.code, ErrorCode::CoeTransportError);
        assert!(publisher.records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_task_repeats_until_cancelled() {
        let (client, _, coordinator) = make_coordinator(RecordingCoeClient::new(2).failing_updates(), vec![1]);
        let token = CancellationToken::new();
        let handle = inbound_polling_task(Arc::new(coordinator), token.clone());

        tokio::time::sleep(Duration::from_secs(121)).await;
        assert_eq!(client.calls().len(), 2);

        token.cancel();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(client.calls().len(), 2);
    }
}
