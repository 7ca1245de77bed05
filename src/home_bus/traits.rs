use async_trait::async_trait;

use crate::common::error::BridgeError;
use crate::entity::bo::inbound_channel_bo::InboundChannelBo;
use crate::entity::dto::home_state_dto::HomeStateDto;

/// current state of local entities
pub trait StateSource: Send + Sync {
    fn get_state(&self, entity_id: &str) -> Option<HomeStateDto>;
}

/// sink for inbound CoE channels
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    async fn publish_channel(&self, record: &InboundChannelBo) -> Result<(), BridgeError>;
}
