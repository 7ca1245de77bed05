//! local home automation bus
//! - read current entity states
//! - receive state change notifications
//! - publish inbound CoE channels as local sensor state

pub mod traits;
pub mod mqtt_home_bus;
