//! channel index and last known values shared by both protocol variants

use std::collections::{BTreeMap, HashMap};

use crate::common::error::{BridgeError, ErrorCode};
use crate::entity::bo::analog_value_bo::AnalogValueBo;
use crate::entity::bo::conf_entity_bo::EntitiesToSendBo;
use crate::{debug, error};

const LOG_TAG: &str = "sender_state";

/// maps every configured entity to its 0-based slot (configured id - 1)
#[derive(Debug, Clone)]
pub struct ChannelIndexer {
    index_from_entity_id: HashMap<String, usize>,
    has_entities: bool,
}

impl ChannelIndexer {
    pub fn new(entities: &EntitiesToSendBo) -> Self {
        let mut index_from_entity_id = HashMap::new();
        for entity in entities.analog.iter().chain(entities.digital.iter()) {
            index_from_entity_id.insert(entity.entity_id.clone(), entity.id.saturating_sub(1) as usize);
        }
        ChannelIndexer {
            index_from_entity_id,
            has_entities: !entities.is_empty(),
        }
    }

    /// slot of a configured entity, an unknown entity is a wiring bug
    pub fn slot(&self, entity_id: &str) -> Result<usize, BridgeError> {
        match self.index_from_entity_id.get(entity_id) {
            Some(slot) => Ok(*slot),
            None => {
                error!(LOG_TAG, "entity {} has no channel slot", entity_id);
                Err(BridgeError::new(
                    ErrorCode::EntityNotIndexed,
                    format!("entity {} is not configured to be sent", entity_id),
                ))
            }
        }
    }

    pub fn has_entities(&self) -> bool {
        self.has_entities
    }
}

/// last known values per slot
#[derive(Debug, Clone)]
pub struct SenderState {
    indexer: ChannelIndexer,
    digital_states: BTreeMap<usize, bool>,
    analog_states: BTreeMap<usize, AnalogValueBo>,
    entity_count: usize,
}

impl SenderState {
    pub fn new(entities: &EntitiesToSendBo) -> Self {
        SenderState {
            indexer: ChannelIndexer::new(entities),
            digital_states: BTreeMap::new(),
            analog_states: BTreeMap::new(),
            entity_count: entities.len(),
        }
    }

    pub fn has_entities(&self) -> bool {
        self.indexer.has_entities()
    }

    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    pub fn slot(&self, entity_id: &str) -> Result<usize, BridgeError> {
        self.indexer.slot(entity_id)
    }

    /// store a digital value without sending, returns its slot
    pub fn update_digital_manuel(&mut self, entity_id: &str, state: bool) -> Result<usize, BridgeError> {
        debug!(LOG_TAG, "update digital value without update {}: {}", entity_id, state);
        let slot = self.indexer.slot(entity_id)?;
        self.digital_states.insert(slot, state);
        Ok(slot)
    }

    /// store an analog value without sending, returns its slot
    pub fn update_analog_manuel(&mut self, entity_id: &str, value: f64, unit: &str) -> Result<usize, BridgeError> {
        debug!(LOG_TAG, "update analog value without update {}: {} {}", entity_id, value, unit);
        let slot = self.indexer.slot(entity_id)?;
        self.analog_states.insert(slot, AnalogValueBo::new(value, unit));
        Ok(slot)
    }

    pub(super) fn init_digital_slot(&mut self, slot: usize) {
        self.digital_states.insert(slot, false);
    }

    pub(super) fn init_analog_slot(&mut self, slot: usize) {
        self.analog_states.insert(slot, AnalogValueBo::empty());
    }

    pub fn digital_states(&self) -> &BTreeMap<usize, bool> {
        &self.digital_states
    }

    pub fn analog_states(&self) -> &BTreeMap<usize, AnalogValueBo> {
        &self.analog_states
    }
}
