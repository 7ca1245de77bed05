use serde::{Deserialize, Serialize};

/// CoE relay configuration, only the protocol version matters here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfigDto {
    pub coe_version: u8,
}
