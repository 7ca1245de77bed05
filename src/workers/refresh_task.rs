//! periodic full resync of all sender values

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::state_sender::protocol::SharedSender;
use crate::{debug, error, info};

const LOG_TAG: &str = "refresh_task";

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub struct RefreshTask {
    sender: SharedSender,
    interval: Duration,
    running: Option<(CancellationToken, JoinHandle<()>)>,
}

impl RefreshTask {
    pub fn new(sender: SharedSender, interval: Duration) -> Self {
        RefreshTask {
            sender,
            interval,
            running: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.running.is_some()
    }

    pub fn start(&mut self) {
        debug!(LOG_TAG, "try to start refresh task");
        if self.is_started() {
            return;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(refresh_loop(self.sender.clone(), self.interval, token.clone()));
        self.running = Some((token, handle));
    }

    /// cancel the pending wait and wait for the loop to exit,
    /// no update is sent after this returns
    pub async fn stop(&mut self) {
        debug!(LOG_TAG, "try to stop refresh task");
        if let Some((token, handle)) = self.running.take() {
            token.cancel();
            if let Err(e) = handle.await {
                error!(LOG_TAG, "refresh task did not stop cleanly: {}", e);
            }
            info!(LOG_TAG, "refresh task stopped");
        }
    }
}

async fn refresh_loop(sender: SharedSender, interval: Duration, token: CancellationToken) {
    info!(LOG_TAG, "refresh task started, interval: {:?}", interval);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let sender = sender.lock().await;
        if !sender.has_entities() {
            continue;
        }
        if let Err(e) = sender.update().await {
            error!(LOG_TAG, "periodic refresh failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::entity::bo::conf_entity_bo::EntitiesToSendBo;
    use crate::state_sender::protocol::SenderProtocol;
    use crate::test_util::{digital_only, dummy_entities, RecordingCoeClient};

    fn make_task(entities: &EntitiesToSendBo) -> (Arc<RecordingCoeClient>, RefreshTask) {
        let client = Arc::new(RecordingCoeClient::new(1));
        let sender = SenderProtocol::select(1, client.clone(), entities).unwrap().into_shared();
        (client, RefreshTask::new(sender, DEFAULT_REFRESH_INTERVAL))
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_update_after_stop() {
        let (client, mut task) = make_task(&digital_only(dummy_entities("binary_sensor", 2)));
        task.start();

        tokio::time::sleep(Duration::from_secs(601)).await;
        assert_eq!(client.send_calls().len(), 10);

        task.stop().await;
        assert!(!task.is_started());

        tokio::time::sleep(Duration::from_secs(1200)).await;
        assert_eq!(client.send_calls().len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_before_first_interval() {
        let (client, mut task) = make_task(&digital_only(dummy_entities("binary_sensor", 1)));
        task.start();

        tokio::time::sleep(Duration::from_secs(599)).await;
        assert!(client.calls().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(client.send_calls().len(), 10);
        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_are_idempotent() {
        let (client, mut task) = make_task(&digital_only(dummy_entities("binary_sensor", 1)));

        task.stop().await;
        task.start();
        task.start();
        assert!(task.is_started());

        tokio::time::sleep(Duration::from_secs(601)).await;
        assert_eq!(client.send_calls().len(), 10);

        task.stop().await;
        task.stop().await;
        assert!(!task.is_started());
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_update_without_entities() {
        let (client, mut task) = make_task(&EntitiesToSendBo::default());
        task.start();

        tokio::time::sleep(Duration::from_secs(1201)).await;
        assert!(client.calls().is_empty());
        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_running() {
        let entities = digital_only(dummy_entities("binary_sensor", 1));
        let client = Arc::new(RecordingCoeClient::new(1).failing_sends());
        let sender = SenderProtocol::select(1, client.clone(), &entities).unwrap().into_shared();
        let mut task = RefreshTask::new(sender, DEFAULT_REFRESH_INTERVAL);
        task.start();

        tokio::time::sleep(Duration::from_secs(1201)).await;
        // first send of each tick fails and aborts that tick
        assert_eq!(client.send_calls().len(), 2);
        task.stop().await;
    }
}
