pub mod coe_channel_dto;
pub mod server_config_dto;
pub mod home_state_dto;
