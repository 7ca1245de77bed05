//! local home automation state as seen by the bridge

/// current state of one local entity
#[derive(Debug, Clone, PartialEq)]
pub struct HomeStateDto {
    pub entity_id: String,
    // raw state string, e.g. "on", "21.5", "unavailable"
    pub state: String,
    pub unit_of_measurement: Option<String>,
}

impl HomeStateDto {
    pub fn new(entity_id: &str, state: &str, unit_of_measurement: Option<&str>) -> Self {
        HomeStateDto {
            entity_id: entity_id.to_string(),
            state: state.to_string(),
            unit_of_measurement: unit_of_measurement.map(|u| u.to_string()),
        }
    }

    pub fn unit(&self) -> &str {
        self.unit_of_measurement.as_deref().unwrap_or("")
    }
}

/// state change notification for a watched entity
#[derive(Debug, Clone, PartialEq)]
pub struct StateChangedDto {
    pub entity_id: String,
    // None when the entity was removed
    pub new_state: Option<HomeStateDto>,
}
