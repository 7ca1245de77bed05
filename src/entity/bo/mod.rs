pub mod conf_entity_bo;
pub mod analog_value_bo;
pub mod inbound_channel_bo;
