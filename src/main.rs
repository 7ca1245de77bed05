mod bridge;
mod coe_client;
mod common;
mod entity;
mod home_bus;
mod state_observer;
mod state_sender;
mod workers;
#[cfg(test)]
mod test_util;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use bridge::integration::Integration;
use coe_client::http_coe_client::HttpCoeClient;
use common::logger::init_logger;
use common::setting::Settings;
use home_bus::mqtt_home_bus::MqttHomeBus;

const LOG_TAG: &str = "main";

// pending state changes between the bus listener and the observer
const EVENT_BUFFER: usize = 256;

// how long the startup sync waits for the retained entity states
const STARTUP_STATE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // env file
    dotenv().ok();

    // config
    let settings = Settings::get();

    // logger
    init_logger()?;
    info!(LOG_TAG, "config loaded, env: {:?}", settings.env.env);
    debug!(LOG_TAG, "config: {:?}", settings);

    let entities = settings.entities_to_send()?;
    let coe = Arc::new(HttpCoeClient::new(settings.coe.host.as_str()));

    let token = CancellationToken::new();
    let entity_ids = entities.entity_ids();
    // holds the retained state and unit events queued before the observer runs
    let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER.max(entity_ids.len() * 2));
    let (bus, bus_handle) = MqttHomeBus::start(&settings.mqtt, entity_ids.clone(), event_tx, token.clone()).await?;
    if !bus.wait_for_states(&entity_ids, STARTUP_STATE_TIMEOUT).await {
        warn!(LOG_TAG, "startup sync goes ahead with missing states, they are sent on their first change");
    }

    let integration = Integration::load(&settings.coe, entities, coe, bus.clone(), bus.clone(), event_rx).await?;

    // wait for ctrl-c
    let (stop_tx, mut stop_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;
    stop_rx.recv().await;
    info!(LOG_TAG, "stop signal received, shutting down");

    integration.unload().await;
    token.cancel();
    if let Err(e) = bus_handle.await {
        error!(LOG_TAG, "state listener did not stop cleanly: {}", e);
    }
    if let Err(e) = bus.disconnect().await {
        warn!(LOG_TAG, "cannot disconnect from broker: {}", e);
    }
    Ok(())
}
