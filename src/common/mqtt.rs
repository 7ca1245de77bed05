//! MQTT connection

use std::sync::{Arc, Mutex};

use paho_mqtt;
use paho_mqtt::AsyncReceiver;
use crate::{error, info};

const LOG_TAG : &str = "mqtt";

// inbound message buffer of the paho stream
const STREAM_BUFFER: usize = 64;

pub struct MqttConnection {
    /// broker host
    host: String,

    /// broker port
    port: u16,

    // client_id
    client_id: String,

    /// connected client
    client: Option<paho_mqtt::AsyncClient>,

    /// topics restored after every reconnect, the session is not kept by the broker
    subscriptions: Arc<Mutex<Vec<String>>>,
}

impl MqttConnection {
    pub fn new(host: &str, port: u16, client_id: &str) -> Self {
        MqttConnection {
            host: host.to_string(),
            port,
            client_id: client_id.to_string(),
            client: None,
            subscriptions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// connect to the broker
    /// returns the stream of inbound messages, `None` items mark a lost connection
    pub async fn connect(&mut self) -> Result<AsyncReceiver<Option<paho_mqtt::Message>>, paho_mqtt::Error> {
        let create_opts = paho_mqtt::CreateOptionsBuilder::new()
            .server_uri(format!("tcp://{}:{}", self.host.as_str(), self.port))
            .client_id(self.client_id.as_str())
            .finalize();

        let mut client = paho_mqtt::AsyncClient::new(create_opts)?;
        let stream = client.get_stream(STREAM_BUFFER);

        let conn_opts = paho_mqtt::ConnectOptionsBuilder::new()
            .keep_alive_interval(std::time::Duration::from_secs(20))
            .clean_session(true)
            .automatic_reconnect(std::time::Duration::from_secs(1), std::time::Duration::from_secs(30))
            .finalize();

        client.set_connection_lost_callback(|_cli| {
            error!(LOG_TAG, "*** mqtt Connection lost ***");
        });

        let subscriptions = self.subscriptions.clone();
        client.set_connected_callback(move |cli| {
            let topics = subscriptions.lock().unwrap_or_else(|e| e.into_inner()).clone();
            if topics.is_empty() {
                return;
            }
            info!(LOG_TAG, "connected, restoring {} subscriptions", topics.len());
            let qos = vec![0; topics.len()];
            let _ = cli.subscribe_many(&topics, &qos);
        });

        if let Err(e) = client.connect(conn_opts).await {
            error!(LOG_TAG, "cannot connect to mqtt server: {:?}", e);
            return Err(e);
        }
        info!(LOG_TAG, "connected to tcp://{}:{} as {}", self.host, self.port, self.client_id);

        self.client = Some(client);

        Ok(stream)
    }

    pub async fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<(), paho_mqtt::Error> {
        let msg = if retained {
            paho_mqtt::Message::new_retained(topic, payload, 0)
        } else {
            paho_mqtt::Message::new(topic, payload, 0)
        };
        if let Some(client) = &self.client {
            client.publish(msg).await?;
        } else {
            error!(LOG_TAG, "mqtt publish failed, no connection");
        }

        Ok(())
    }

    pub async fn subscribe(&self, topic: &str) -> Result<(), paho_mqtt::Error> {
        if let Some(client) = &self.client {
            client.subscribe(topic, 0).await?;
            self.remember_subscription(topic);
        } else {
            error!(LOG_TAG, "mqtt subscribe failed, no connection");
        }

        Ok(())
    }

    fn remember_subscription(&self, topic: &str) {
        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
        if !subscriptions.iter().any(|t| t == topic) {
            subscriptions.push(topic.to_string());
        }
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub async fn disconnect(&self) -> Result<(), paho_mqtt::Error> {
        if let Some(client) = &self.client {
            client.disconnect(None).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriptions_are_kept_once() {
        let con = MqttConnection::new("127.0.0.1", 1883, "test");
        con.remember_subscription("homeassistant/sensor/a/state");
        con.remember_subscription("homeassistant/sensor/a/unit_of_measurement");
        con.remember_subscription("homeassistant/sensor/a/state");

        assert_eq!(
            con.subscriptions(),
            vec!["homeassistant/sensor/a/state", "homeassistant/sensor/a/unit_of_measurement"]
        );
    }

    #[tokio::test]
    async fn test_subscribe_without_connection_is_not_kept() {
        let con = MqttConnection::new("127.0.0.1", 1883, "test");
        con.subscribe("homeassistant/sensor/a/state").await.unwrap();
        assert!(con.subscriptions().is_empty());
    }
}
