pub mod inbound_coordinator;
pub mod refresh_task;
