//! sender variant selected from the CoE server config

use std::sync::Arc;

use tokio::sync::Mutex;

use super::sender_state::SenderState;
use super::sender_v1::StateSenderV1;
use super::sender_v2::StateSenderV2;
use crate::coe_client::traits::CoeClient;
use crate::common::error::{BridgeError, ErrorCode};
use crate::entity::bo::conf_entity_bo::EntitiesToSendBo;
use crate::info;

const LOG_TAG: &str = "sender_protocol";

/// the sender is shared by the observer and the refresh task, each update
/// holds the lock from recording the value until the send returns
pub type SharedSender = Arc<Mutex<SenderProtocol>>;

pub enum SenderProtocol {
    V1(StateSenderV1),
    V2(StateSenderV2),
}

impl SenderProtocol {
    /// pick the sender matching the server's CoE version
    pub fn select(coe_version: u8, coe: Arc<dyn CoeClient>, entities: &EntitiesToSendBo) -> Result<Self, BridgeError> {
        match coe_version {
            1 => {
                StateSenderV1::check_slot_ceiling(entities)?;
                info!(LOG_TAG, "CoE server speaks v1, sending paged values");
                Ok(SenderProtocol::V1(StateSenderV1::new(coe, entities)))
            }
            2 => {
                info!(LOG_TAG, "CoE server speaks v2, sending indexed values");
                Ok(SenderProtocol::V2(StateSenderV2::new(coe, entities)))
            }
            other => Err(BridgeError::new(
                ErrorCode::UnsupportedProtocol,
                format!("unsupported CoE version {}", other),
            )),
        }
    }

    pub fn into_shared(self) -> SharedSender {
        Arc::new(Mutex::new(self))
    }

    pub fn version(&self) -> u8 {
        match self {
            SenderProtocol::V1(_) => 1,
            SenderProtocol::V2(_) => 2,
        }
    }

    pub fn state(&self) -> &SenderState {
        match self {
            SenderProtocol::V1(sender) => sender.state(),
            SenderProtocol::V2(sender) => sender.state(),
        }
    }

    pub fn has_entities(&self) -> bool {
        match self {
            SenderProtocol::V1(sender) => sender.has_entities(),
            SenderProtocol::V2(sender) => sender.has_entities(),
        }
    }

    pub fn update_digital_manuel(&mut self, entity_id: &str, state: bool) -> Result<(), BridgeError> {
        match self {
            SenderProtocol::V1(sender) => sender.update_digital_manuel(entity_id, state),
            SenderProtocol::V2(sender) => sender.update_digital_manuel(entity_id, state),
        }
    }

    pub fn update_analog_manuel(&mut self, entity_id: &str, value: f64, unit: &str) -> Result<(), BridgeError> {
        match self {
            SenderProtocol::V1(sender) => sender.update_analog_manuel(entity_id, value, unit),
            SenderProtocol::V2(sender) => sender.update_analog_manuel(entity_id, value, unit),
        }
    }

    pub async fn update_digital(&mut self, entity_id: &str, state: bool) -> Result<(), BridgeError> {
        match self {
            SenderProtocol::V1(sender) => sender.update_digital(entity_id, state).await,
            SenderProtocol::V2(sender) => sender.update_digital(entity_id, state).await,
        }
    }

    pub async fn update_analog(&mut self, entity_id: &str, value: f64, unit: &str) -> Result<(), BridgeError> {
        match self {
            SenderProtocol::V1(sender) => sender.update_analog(entity_id, value, unit).await,
            SenderProtocol::V2(sender) => sender.update_analog(entity_id, value, unit).await,
        }
    }

    pub async fn update(&self) -> Result<(), BridgeError> {
        match self {
            SenderProtocol::V1(sender) => sender.update().await,
            SenderProtocol::V2(sender) => sender.update().await,
        }
    }
}
