use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::common::error::CoeError;
use crate::entity::dto::coe_channel_dto::{ChannelMode, CoeChannelDto};
use crate::entity::dto::server_config_dto::ServerConfigDto;

/// the CoE relay as seen by the bridge
#[async_trait]
pub trait CoeClient: Send + Sync {
    /// fetch the channels of one CAN id and cache them
    async fn update(&self, can_id: u8) -> Result<(), CoeError>;

    /// cached channels of the last `update`, keyed by 1-based channel index
    fn get_channels(&self, can_id: u8, mode: ChannelMode) -> BTreeMap<u32, CoeChannelDto>;

    async fn get_server_config(&self) -> Result<ServerConfigDto, CoeError>;

    /// v1: one page of 4 analog channels, page numbers start at 1
    async fn send_analog_values(&self, channels: &[CoeChannelDto], page: u8) -> Result<(), CoeError>;

    /// v1: one half of 16 digital channels
    async fn send_digital_values(&self, channels: &[CoeChannelDto], second_half: bool) -> Result<(), CoeError>;

    /// v2: any number of analog channels addressed by index
    async fn send_analog_values_v2(&self, channels: &[CoeChannelDto]) -> Result<(), CoeError>;

    /// v2: any number of digital channels addressed by index
    async fn send_digital_values_v2(&self, channels: &[CoeChannelDto]) -> Result<(), CoeError>;
}
