//! CoE sender for protocol v1
//! 32 analog and 32 digital slots, analog is sent in 8 pages of 4 channels,
//! digital in 2 halves of 16 channels. Unset slots are zero padded.

use std::sync::Arc;

use crate::coe_client::traits::CoeClient;
use crate::coe_client::units;
use crate::common::error::{BridgeError, ErrorCode};
use crate::entity::bo::conf_entity_bo::{EntitiesToSendBo, EntityKind};
use crate::entity::dto::coe_channel_dto::CoeChannelDto;
use super::sender_state::SenderState;
use crate::debug;

const LOG_TAG: &str = "sender_v1";

pub const SLOT_COUNT: usize = 32;
const DIGITAL_HALF_SIZE: usize = 16;
const ANALOG_PAGE_SIZE: usize = 4;
const ANALOG_PAGE_COUNT: usize = SLOT_COUNT / ANALOG_PAGE_SIZE;
// changes from this slot on go out with the second digital half
const SECOND_HALF_FROM_SLOT: usize = 15;
const DIGITAL_UNIT: &str = "";

pub struct StateSenderV1 {
    coe: Arc<dyn CoeClient>,
    state: SenderState,
}

impl StateSenderV1 {
    pub fn new(coe: Arc<dyn CoeClient>, entities: &EntitiesToSendBo) -> Self {
        let mut state = SenderState::new(entities);
        for entity in &entities.digital {
            state.init_digital_slot(entity.id.saturating_sub(1) as usize);
        }
        for entity in &entities.analog {
            state.init_analog_slot(entity.id.saturating_sub(1) as usize);
        }
        StateSenderV1 { coe, state }
    }

    /// v1 servers only know 32 slots per class
    pub fn check_slot_ceiling(entities: &EntitiesToSendBo) -> Result<(), BridgeError> {
        for kind in [EntityKind::Analog, EntityKind::Digital] {
            if let Some(max_id) = entities.max_id(kind) {
                if max_id as usize > SLOT_COUNT {
                    return Err(BridgeError::new(
                        ErrorCode::ConfigError,
                        format!("{:?} slot id {} exceeds the {} slots of CoE v1", kind, max_id, SLOT_COUNT),
                    ));
                }
            }
        }
        Ok(())
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

    /// unit id for a display unit, °C goes out as 46
    pub fn convert_unit_to_id(unit: &str) -> &'static str {
        units::to_v1_unit_id(units::unit_id_from_name(unit))
    }

    fn build_digital_page(&self) -> Vec<CoeChannelDto> {
        let states = self.state.digital_states();
        (0..SLOT_COUNT)
            .map(|slot| {
                let value = states.get(&slot).copied().unwrap_or(false);
                CoeChannelDto::digital(slot as u32, value, DIGITAL_UNIT)
            })
            .collect()
    }

    fn build_analog_page(&self) -> Vec<CoeChannelDto> {
        let states = self.state.analog_states();
        (0..SLOT_COUNT)
            .map(|slot| match states.get(&slot) {
                Some(state) => CoeChannelDto::analog(slot as u32, state.value, Self::convert_unit_to_id(state.unit.as_str())),
                None => CoeChannelDto::analog(slot as u32, 0.0, units::UNKNOWN_UNIT_ID),
            })
            .collect()
    }

    fn ensure_in_page_range(entity_id: &str, slot: usize) -> Result<(), BridgeError> {
        if slot >= SLOT_COUNT {
            return Err(BridgeError::new(
                ErrorCode::ConfigError,
                format!("slot {} of {} is outside the CoE v1 pages", slot + 1, entity_id),
            ));
        }
        Ok(())
    }

    /// store the value and send the digital half holding its slot
    pub async fn update_digital(&mut self, entity_id: &str, state: bool) -> Result<(), BridgeError> {
        let slot = self.state.slot(entity_id)?;
        Self::ensure_in_page_range(entity_id, slot)?;
        self.state.update_digital_manuel(entity_id, state)?;

        let page = self.build_digital_page();

        debug!(LOG_TAG, "send digital update to server: {}", entity_id);

        if slot >= SECOND_HALF_FROM_SLOT {
            self.coe.send_digital_values(&page[DIGITAL_HALF_SIZE..], true).await?;
        } else {
            self.coe.send_digital_values(&page[..DIGITAL_HALF_SIZE], false).await?;
        }
        Ok(())
    }

    /// store the value and send the analog page holding its slot
    pub async fn update_analog(&mut self, entity_id: &str, value: f64, unit: &str) -> Result<(), BridgeError> {
        let slot = self.state.slot(entity_id)?;
        Self::ensure_in_page_range(entity_id, slot)?;
        self.state.update_analog_manuel(entity_id, value, unit)?;

        let page = self.build_analog_page();

        debug!(LOG_TAG, "send analog update to server: {}", entity_id);

        let page_nr = slot / ANALOG_PAGE_SIZE;
        let (first, last) = analog_page_bounds(page_nr);
        self.coe.send_analog_values(&page[first..last], (page_nr + 1) as u8).await?;
        Ok(())
    }

    /// send every analog page and both digital halves
    pub async fn update(&self) -> Result<(), BridgeError> {
        debug!(LOG_TAG, "send all {} values to server", self.state.entity_count());

        let analog_page = self.build_analog_page();
        for page_nr in 0..ANALOG_PAGE_COUNT {
            let (first, last) = analog_page_bounds(page_nr);
            self.coe
                .send_analog_values(&analog_page[first..last], (page_nr + 1) as u8)
                .await?;
        }

        let digital_page = self.build_digital_page();
        self.coe.send_digital_values(&digital_page[..DIGITAL_HALF_SIZE], false).await?;
        self.coe.send_digital_values(&digital_page[DIGITAL_HALF_SIZE..], true).await?;
        Ok(())
    }
}

/// slice bounds of a 0-based analog page, the first page always starts at 0
fn analog_page_bounds(page_nr: usize) -> (usize, usize) {
    let first = if page_nr == 0 { 0 } else { page_nr * ANALOG_PAGE_SIZE };
    (first, (page_nr + 1) * ANALOG_PAGE_SIZE)
}
