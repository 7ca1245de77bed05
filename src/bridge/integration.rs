//! one loaded bridge instance, owns the sender, observer, refresh task and inbound polling

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::coe_client::traits::CoeClient;
use crate::common::error::BridgeError;
use crate::common::setting::Coe;
use crate::entity::bo::conf_entity_bo::EntitiesToSendBo;
use crate::entity::dto::home_state_dto::StateChangedDto;
use crate::home_bus::traits::{ChannelPublisher, StateSource};
use crate::state_observer::observer::StateObserver;
use crate::state_sender::protocol::{SenderProtocol, SharedSender};
use crate::workers::inbound_coordinator::{inbound_polling_task, InboundCoordinator};
use crate::workers::refresh_task::RefreshTask;
use crate::{error, info};

const LOG_TAG: &str = "integration";

pub struct Integration {
    sender: SharedSender,
    refresh_task: RefreshTask,
    token: CancellationToken,
    observer_handle: JoinHandle<()>,
    inbound_handle: JoinHandle<()>,
}

impl Integration {
    pub async fn load(
        setting: &Coe,
        entities: EntitiesToSendBo,
        coe: Arc<dyn CoeClient>,
        source: Arc<dyn StateSource>,
        publisher: Arc<dyn ChannelPublisher>,
        events: mpsc::Receiver<StateChangedDto>,
    ) -> Result<Self, BridgeError> {
        setting.validate()?;

        // 1. first inbound refresh, a dead relay fails the load
        let coordinator = Arc::new(InboundCoordinator::new(
            coe.clone(),
            publisher,
            setting.can_ids.clone(),
            Duration::from_secs(setting.scan_interval_minutes * 60),
        ));
        let published = coordinator.refresh_and_publish().await?;
        info!(LOG_TAG, "first refresh published {} inbound channels", published);

        // 2. pick the sender for the relay's protocol version
        let server_config = coe.get_server_config().await?;
        let sender = SenderProtocol::select(server_config.coe_version, coe, &entities)?.into_shared();

        // 3. startup sync and periodic refresh
        let mut observer = StateObserver::new(source, sender.clone(), &entities);
        let mut refresh_task = RefreshTask::new(
            sender.clone(),
            Duration::from_secs(setting.refresh_interval_minutes * 60),
        );
        if !entities.is_empty() {
            observer.get_all_states().await?;
            refresh_task.start();
        } else {
            info!(LOG_TAG, "no entities configured to send");
        }

        // 4. background loops
        let token = CancellationToken::new();
        let observer_handle = tokio::spawn(observer.run(events, token.clone()));
        let inbound_handle = inbound_polling_task(coordinator, token.clone());

        info!(LOG_TAG, "bridge loaded, {} entities to send", entities.len());
        Ok(Integration {
            sender,
            refresh_task,
            token,
            observer_handle,
            inbound_handle,
        })
    }

    pub fn sender(&self) -> SharedSender {
        self.sender.clone()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh_task.is_started()
    }

    pub async fn unload(mut self) {
        self.refresh_task.stop().await;
        self.token.cancel();
        for (name, handle) in [("observer", self.observer_handle), ("inbound polling", self.inbound_handle)] {
            if let Err(e) = handle.await {
                error!(LOG_TAG, "{} did not stop cleanly: {}", name, e);
            }
        }
        info!(LOG_TAG, "bridge unloaded");
    }
}
