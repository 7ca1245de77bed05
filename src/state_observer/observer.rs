//! watches the configured local entities and forwards their values to the CoE sender

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::error::BridgeError;
use crate::entity::bo::analog_value_bo::AnalogValueBo;
use crate::entity::bo::conf_entity_bo::{classify_entity, EntitiesToSendBo, EntityKind};
use crate::entity::dto::home_state_dto::{HomeStateDto, StateChangedDto};
use crate::home_bus::traits::StateSource;
use crate::state_sender::protocol::SharedSender;
use crate::{debug, error, info, trace, warn};

const LOG_TAG: &str = "state_observer";

pub const STATE_ON: &str = "on";
pub const INVALID_STATES: [&str; 2] = ["unavailable", "unknown"];

pub fn is_state_valid(state: &str) -> bool {
    !INVALID_STATES.contains(&state)
}

/// last value forwarded per entity, kept per class, analog values with their unit
#[derive(Debug, Default)]
struct ObservedStates {
    digital: HashMap<String, bool>,
    analog: HashMap<String, AnalogValueBo>,
}

pub struct StateObserver {
    source: Arc<dyn StateSource>,
    sender: SharedSender,
    entity_ids: Vec<String>,
    watched: HashSet<String>,
    states: ObservedStates,
}

impl StateObserver {
    pub fn new(source: Arc<dyn StateSource>, sender: SharedSender, entities: &EntitiesToSendBo) -> Self {
        let entity_ids = entities.entity_ids();
        let watched = entity_ids.iter().cloned().collect();
        StateObserver {
            source,
            sender,
            entity_ids,
            watched,
            states: ObservedStates::default(),
        }
    }

    /// read every configured entity once, record the values without sending,
    /// then push everything with a single full update
    pub async fn get_all_states(&mut self) -> Result<(), BridgeError> {
        debug!(LOG_TAG, "update all states");

        let mut sender = self.sender.lock().await;
        for entity_id in self.entity_ids.iter() {
            let state = match self.source.get_state(entity_id) {
                Some(state) if is_state_valid(state.state.as_str()) => state,
                _ => {
                    trace!(LOG_TAG, "no valid state for {}, skip", entity_id);
                    continue;
                }
            };

            match classify_entity(entity_id) {
                Some(EntityKind::Analog) => {
                    let Some(value) = parse_analog(&state) else {
                        continue;
                    };
                    self.states.analog.insert(entity_id.clone(), AnalogValueBo::new(value, state.unit()));
                    sender.update_analog_manuel(entity_id, value, state.unit())?;
                }
                Some(EntityKind::Digital) => {
                    let value = state.state == STATE_ON;
                    self.states.digital.insert(entity_id.clone(), value);
                    sender.update_digital_manuel(entity_id, value)?;
                }
                None => {}
            }
        }

        sender.update().await
    }

    /// forward one state change, invalid and repeated values are dropped
    pub async fn handle_state_change(&mut self, event: StateChangedDto) -> Result<(), BridgeError> {
        if !self.watched.contains(&event.entity_id) {
            trace!(LOG_TAG, "{} is not watched, ignore", event.entity_id);
            return Ok(());
        }

        let new_state = match event.new_state {
            Some(state) => state,
            None => return Ok(()),
        };

        if !is_state_valid(new_state.state.as_str()) {
            debug!(LOG_TAG, "ignore state {} of {}", new_state.state, event.entity_id);
            return Ok(());
        }

        let entity_id = event.entity_id;
        match classify_entity(entity_id.as_str()) {
            Some(EntityKind::Analog) => {
                let Some(value) = parse_analog(&new_state) else {
                    return Ok(());
                };
                let observed = AnalogValueBo::new(value, new_state.unit());
                if self.states.analog.get(&entity_id) == Some(&observed) {
                    trace!(LOG_TAG, "{} unchanged", entity_id);
                    return Ok(());
                }

                debug!(LOG_TAG, "handle new state {}: {} {}", entity_id, new_state.state, observed.unit);
                self.states.analog.insert(entity_id.clone(), observed);
                self.sender
                    .lock()
                    .await
                    .update_analog(entity_id.as_str(), value, new_state.unit())
                    .await
            }
            Some(EntityKind::Digital) => {
                let value = new_state.state == STATE_ON;
                if self.states.digital.get(&entity_id) == Some(&value) {
                    trace!(LOG_TAG, "{} unchanged", entity_id);
                    return Ok(());
                }

                debug!(LOG_TAG, "handle new state {}: {}", entity_id, new_state.state);
                self.states.digital.insert(entity_id.clone(), value);
                self.sender.lock().await.update_digital(entity_id.as_str(), value).await
            }
            None => Ok(()),
        }
    }

    /// handle change events until cancelled, failures of single events are logged
    pub async fn run(mut self, mut events: mpsc::Receiver<StateChangedDto>, token: CancellationToken) {
        info!(LOG_TAG, "state observer started, watching {} entities", self.entity_ids.len());
        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            if let Err(e) = self.handle_state_change(event).await {
                error!(LOG_TAG, "cannot forward state change: {}", e);
            }
        }
        info!(LOG_TAG, "state observer stopped");
    }
}

fn parse_analog(state: &HomeStateDto) -> Option<f64> {
    match state.state.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(LOG_TAG, "state {} of {} is not a number, skip", state.state, state.entity_id);
            None
        }
    }
}
