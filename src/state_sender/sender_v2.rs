//! CoE sender for protocol v2
//! channels are addressed by their 1-based index, nothing is padded

use std::sync::Arc;

use crate::coe_client::traits::CoeClient;
use crate::coe_client::units;
use crate::common::error::BridgeError;
use crate::entity::bo::conf_entity_bo::EntitiesToSendBo;
use crate::entity::dto::coe_channel_dto::CoeChannelDto;
use super::sender_state::SenderState;
use crate::debug;

const LOG_TAG: &str = "sender_v2";

// On/Off
pub const DIGITAL_UNIT: &str = "43";

pub struct StateSenderV2 {
    coe: Arc<dyn CoeClient>,
    state: SenderState,
}

impl StateSenderV2 {
    pub fn new(coe: Arc<dyn CoeClient>, entities: &EntitiesToSendBo) -> Self {
        StateSenderV2 {
            coe,
            state: SenderState::new(entities),
        }
    }

    pub fn state(&self) -> &SenderState {
        &self.state
    }

    pub fn has_entities(&self) -> bool {
        self.state.has_entities()
    }

    pub fn update_digital_manuel(&mut self, entity_id: &str, state: bool) -> Result<(), BridgeError> {
        self.state.update_digital_manuel(entity_id, state).map(|_| ())
    }

    pub fn update_analog_manuel(&mut self, entity_id: &str, value: f64, unit: &str) -> Result<(), BridgeError> {
        self.state.update_analog_manuel(entity_id, value, unit).map(|_| ())
    }

    /// unit id for a display unit, 46 is sent as 1
    pub fn convert_unit_to_id(unit: &str) -> &'static str {
        units::to_v2_unit_id(units::unit_id_from_name(unit))
    }

    pub async fn update_digital(&mut self, entity_id: &str, state: bool) -> Result<(), BridgeError> {
        let slot = self.state.update_digital_manuel(entity_id, state)?;

        debug!(LOG_TAG, "send digital update to server: {}", entity_id);

        let channel = CoeChannelDto::digital(slot as u32 + 1, state, DIGITAL_UNIT);
        self.coe.send_digital_values_v2(&[channel]).await?;
        Ok(())
    }

    pub async fn update_analog(&mut self, entity_id: &str, value: f64, unit: &str) -> Result<(), BridgeError> {
        let slot = self.state.update_analog_manuel(entity_id, value, unit)?;

        debug!(LOG_TAG, "send analog update to server: {}", entity_id);

        let channel = CoeChannelDto::analog(slot as u32 + 1, value, Self::convert_unit_to_id(unit));
        self.coe.send_analog_values_v2(&[channel]).await?;
        Ok(())
    }

    /// send every known value, one batch per class
    pub async fn update(&self) -> Result<(), BridgeError> {
        debug!(LOG_TAG, "send all {} values to server", self.state.entity_count());

        let analog_channels: Vec<CoeChannelDto> = self
            .state
            .analog_states()
            .iter()
            .map(|(slot, state)| {
                CoeChannelDto::analog(*slot as u32 + 1, state.value, Self::convert_unit_to_id(state.unit.as_str()))
            })
            .collect();

        let digital_channels: Vec<CoeChannelDto> = self
            .state
            .digital_states()
            .iter()
            .map(|(slot, value)| CoeChannelDto::digital(*slot as u32 + 1, *value, DIGITAL_UNIT))
            .collect();

        if !analog_channels.is_empty() {
            self.coe.send_analog_values_v2(&analog_channels).await?;
        }

        if !digital_channels.is_empty() {
            self.coe.send_digital_values_v2(&digital_channels).await?;
        }
        Ok(())
    }
}
