//! CoE relay client
//! - the CoeClient trait the senders and the inbound coordinator talk to
//! - the http implementation against the CoE relay add-on
//! - the protocol unit table

pub mod traits;
pub mod units;
pub mod http_coe_client;
