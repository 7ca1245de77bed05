//! outbound channel sending
//! - slot index per configured entity
//! - v1: fixed 32 slot pages, only the page holding the change is sent
//! - v2: every change is sent alone with its 1-based channel index
//! - the protocol variant is picked once from the server config

pub mod sender_state;
pub mod sender_v1;
pub mod sender_v2;
pub mod protocol;
