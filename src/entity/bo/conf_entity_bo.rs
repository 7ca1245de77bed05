//! entities configured to be sent to the CoE server

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::common::error::{BridgeError, ErrorCode};

pub const DIGITAL_DOMAINS: [&str; 2] = ["binary_sensor", "input_boolean"];
pub const ANALOG_DOMAINS: [&str; 3] = ["sensor", "number", "input_number"];

pub const FREE_SLOT_MARKER_ANALOG: &str = "--FREE_SLOT_MARKER_A--";
pub const FREE_SLOT_MARKER_DIGITAL: &str = "--FREE_SLOT_MARKER_D--";

/// binding of one local entity to a 1-based slot id of its channel class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfEntityToSend {
    pub id: u32,
    pub entity_id: String,
}

impl ConfEntityToSend {
    pub fn new(id: u32, entity_id: &str) -> Self {
        ConfEntityToSend { id, entity_id: entity_id.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Analog,
    Digital,
}

/// the part of an entity id before the first dot
pub fn entity_domain(entity_id: &str) -> &str {
    match entity_id.find('.') {
        Some(pos) => &entity_id[..pos],
        None => entity_id,
    }
}

pub fn classify_entity(entity_id: &str) -> Option<EntityKind> {
    let domain = entity_domain(entity_id);
    if DIGITAL_DOMAINS.contains(&domain) {
        Some(EntityKind::Digital)
    } else if ANALOG_DOMAINS.contains(&domain) {
        Some(EntityKind::Analog)
    } else {
        None
    }
}

/// the two ordered entity lists, slot ids are assigned per class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitiesToSendBo {
    #[serde(default)]
    pub analog: Vec<ConfEntityToSend>,
    #[serde(default)]
    pub digital: Vec<ConfEntityToSend>,
}

impl EntitiesToSendBo {
    pub fn is_empty(&self) -> bool {
        self.analog.is_empty() && self.digital.is_empty()
    }

    pub fn len(&self) -> usize {
        self.analog.len() + self.digital.len()
    }

    pub fn list(&self, kind: EntityKind) -> &[ConfEntityToSend] {
        match kind {
            EntityKind::Analog => &self.analog,
            EntityKind::Digital => &self.digital,
        }
    }

    /// analog entity ids first, then digital
    pub fn entity_ids(&self) -> Vec<String> {
        self.analog
            .iter()
            .chain(self.digital.iter())
            .map(|e| e.entity_id.clone())
            .collect()
    }

    pub fn max_id(&self, kind: EntityKind) -> Option<u32> {
        self.list(kind).iter().map(|e| e.id).max()
    }

    /// ids start at 1 and are unique per class, every entity appears once
    /// and belongs to a domain of its class
    pub fn validate(&self) -> Result<(), BridgeError> {
        let mut seen_entities: HashSet<&str> = HashSet::new();
        for kind in [EntityKind::Analog, EntityKind::Digital] {
            let mut seen_ids: HashSet<u32> = HashSet::new();
            for entity in self.list(kind) {
                if entity.id == 0 {
                    return Err(config_error(format!("slot id of {} must start at 1", entity.entity_id)));
                }
                if !seen_ids.insert(entity.id) {
                    return Err(config_error(format!("{:?} slot id {} is used twice", kind, entity.id)));
                }
                if !seen_entities.insert(entity.entity_id.as_str()) {
                    return Err(config_error(format!("entity {} is configured twice", entity.entity_id)));
                }
                if classify_entity(entity.entity_id.as_str()) != Some(kind) {
                    return Err(config_error(format!(
                        "entity {} cannot be sent as {:?} channel",
                        entity.entity_id, kind
                    )));
                }
            }
        }
        Ok(())
    }

    /// convert the flat legacy list, free slot markers keep a slot of their class empty
    pub fn migrate_legacy_entities(legacy: &[String]) -> Self {
        let mut bo = EntitiesToSendBo::default();
        let mut analog_id = 1;
        let mut digital_id = 1;

        for entity_id in legacy {
            if entity_id == FREE_SLOT_MARKER_ANALOG {
                analog_id += 1;
                continue;
            }
            if entity_id == FREE_SLOT_MARKER_DIGITAL {
                digital_id += 1;
                continue;
            }

            match classify_entity(entity_id.as_str()) {
                Some(EntityKind::Digital) => {
                    bo.digital.push(ConfEntityToSend::new(digital_id, entity_id));
                    digital_id += 1;
                }
                Some(EntityKind::Analog) => {
                    bo.analog.push(ConfEntityToSend::new(analog_id, entity_id));
                    analog_id += 1;
                }
                None => {}
            }
        }
        bo
    }
}

fn config_error(msg: String) -> BridgeError {
    BridgeError::new(ErrorCode::ConfigError, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_entity() {
        assert_eq!(classify_entity("binary_sensor.door"), Some(EntityKind::Digital));
        assert_eq!(classify_entity("input_boolean.away"), Some(EntityKind::Digital));
        assert_eq!(classify_entity("input_number.offset"), Some(EntityKind::Analog));
        assert_eq!(classify_entity("light.kitchen"), None);
        assert_eq!(classify_entity("nodot"), None);
    }

    #[test]
    fn test_duplicate_id_in_class_is_rejected() {
        let bo = EntitiesToSendBo {
            analog: vec![ConfEntityToSend::new(2, "sensor.a"), ConfEntityToSend::new(2, "sensor.b")],
            digital: vec![],
        };
        assert_eq!(bo.validate().unwrap_err().code, ErrorCode::ConfigError);
    }

    #[test]
    fn test_same_id_in_both_classes_is_fine() {
        let bo = EntitiesToSendBo {
            analog: vec![ConfEntityToSend::new(1, "sensor.a")],
            digital: vec![ConfEntityToSend::new(1, "binary_sensor.b")],
        };
        assert!(bo.validate().is_ok());
    }

    #[test]
    fn test_zero_id_is_rejected() {
        let bo = EntitiesToSendBo {
            analog: vec![],
            digital: vec![ConfEntityToSend::new(0, "binary_sensor.b")],
        };
        assert!(bo.validate().is_err());
    }

    #[test]
    fn test_entity_in_both_classes_is_rejected() {
        let bo = EntitiesToSendBo {
            analog: vec![ConfEntityToSend::new(1, "sensor.a")],
            digital: vec![ConfEntityToSend::new(1, "sensor.a")],
        };
        assert!(bo.validate().is_err());
    }

    #[test]
    fn test_migrate_keeps_free_slots() {
        let legacy: Vec<String> = vec![
            "binary_sensor.a",
            FREE_SLOT_MARKER_DIGITAL,
            "sensor.b",
            "binary_sensor.c",
            FREE_SLOT_MARKER_ANALOG,
            FREE_SLOT_MARKER_ANALOG,
            "number.d",
            "light.ignored",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let bo = EntitiesToSendBo::migrate_legacy_entities(&legacy);

        assert_eq!(
            bo.digital,
            vec![ConfEntityToSend::new(1, "binary_sensor.a"), ConfEntityToSend::new(3, "binary_sensor.c")]
        );
        assert_eq!(
            bo.analog,
            vec![ConfEntityToSend::new(1, "sensor.b"), ConfEntityToSend::new(4, "number.d")]
        );
        assert!(bo.validate().is_ok());
    }

    #[test]
    fn test_entity_ids_order() {
        let bo = EntitiesToSendBo {
            analog: vec![ConfEntityToSend::new(1, "sensor.a")],
            digital: vec![ConfEntityToSend::new(1, "binary_sensor.b")],
        };
        assert_eq!(bo.entity_ids(), vec!["sensor.a".to_string(), "binary_sensor.b".to_string()]);
        assert_eq!(bo.max_id(EntityKind::Digital), Some(1));
        assert_eq!(bo.len(), 2);
    }
}
