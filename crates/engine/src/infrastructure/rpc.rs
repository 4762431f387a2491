//! In-process RPC network.
//!
//! One privileged executor task processes calls to completion, one at a time,
//! in arrival order. Participants receive broadcasts on their own channels.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;

use itempiles_domain::UserId;
use itempiles_shared::{Broadcast, PileResponse, PrivilegedCall, ResponseResult, ServerMessage};

use crate::infrastructure::ports::{RpcError, RpcHandler, RpcPort};

/// Executor queue depth. Callers wait for space rather than fail.
const EXECUTOR_QUEUE: usize = 64;

/// Per-participant broadcast buffer. A full buffer drops the broadcast.
const PARTICIPANT_QUEUE: usize = 256;

type Envelope = (PrivilegedCall, oneshot::Sender<ResponseResult>);

pub struct LocalRpc {
    executor: RwLock<Option<mpsc::Sender<Envelope>>>,
    participants: RwLock<HashMap<UserId, mpsc::Sender<Broadcast>>>,
    /// Copy of every broadcast for an outer transport
    mirror: RwLock<Option<mpsc::Sender<ServerMessage>>>,
}

impl LocalRpc {
    pub fn new() -> Self {
        Self {
            executor: RwLock::new(None),
            participants: RwLock::new(HashMap::new()),
            mirror: RwLock::new(None),
        }
    }

    /// Install the privileged executor, replacing any previous one.
    pub async fn register_executor(&self, handler: Arc<dyn RpcHandler>) -> JoinHandle<()> {
        let (tx, mut rx) = mpsc::channel::<Envelope>(EXECUTOR_QUEUE);
        let task = tokio::spawn(async move {
            while let Some((call, reply)) = rx.recv().await {
                let handler_name = call.handler();
                let result = handler.handle(call).await;
                if reply.send(result).is_err() {
                    tracing::debug!(handler = %handler_name, "Caller went away before reply");
                }
            }
            tracing::info!("Executor stopped");
        });
        *self.executor.write().await = Some(tx);
        tracing::info!("Executor registered");
        task
    }

    pub async fn unregister_executor(&self) {
        if self.executor.write().await.take().is_some() {
            tracing::info!("Executor unregistered");
        }
    }

    pub async fn register_participant(&self, user_id: UserId) -> mpsc::Receiver<Broadcast> {
        let (tx, rx) = mpsc::channel(PARTICIPANT_QUEUE);
        tracing::debug!(user_id = %user_id, "Participant registered");
        self.participants.write().await.insert(user_id, tx);
        rx
    }

    pub async fn unregister_participant(&self, user_id: &UserId) {
        if self.participants.write().await.remove(user_id).is_some() {
            tracing::debug!(user_id = %user_id, "Participant unregistered");
        }
    }

    pub async fn set_mirror(&self, sender: mpsc::Sender<ServerMessage>) {
        *self.mirror.write().await = Some(sender);
    }

    async fn deliver(&self, participants: Option<&[UserId]>, broadcast: Broadcast) {
        {
            let all = self.participants.read().await;
            for (user_id, sender) in all.iter() {
                if participants.is_some_and(|wanted| !wanted.contains(user_id)) {
                    continue;
                }
                if let Err(e) = sender.try_send(broadcast.clone()) {
                    tracing::warn!(
                        user_id = %user_id,
                        handler = %broadcast.handler(),
                        "Failed to deliver broadcast: {}",
                        e
                    );
                }
            }
        }

        if let Some(mirror) = self.mirror.read().await.as_ref() {
            let message = ServerMessage::Broadcast {
                participants: participants.map(<[UserId]>::to_vec),
                broadcast,
            };
            if let Err(e) = mirror.try_send(message) {
                tracing::warn!("Failed to mirror broadcast: {}", e);
            }
        }
    }
}

impl Default for LocalRpc {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcPort for LocalRpc {
    async fn execute_as_privileged(&self, call: PrivilegedCall) -> Result<PileResponse, RpcError> {
        let sender = self
            .executor
            .read()
            .await
            .clone()
            .ok_or(RpcError::CoordinatorUnavailable)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        sender
            .send((call, reply_tx))
            .await
            .map_err(|_| RpcError::CoordinatorUnavailable)?;

        match reply_rx.await.map_err(|_| RpcError::CoordinatorUnavailable)? {
            ResponseResult::Success { data } => Ok(data),
            ResponseResult::Error { code, message } => Err(RpcError::remote(code, message)),
        }
    }

    async fn execute_for_everyone(&self, broadcast: Broadcast) -> Result<(), RpcError> {
        self.deliver(None, broadcast).await;
        Ok(())
    }

    async fn execute_for_participants(
        &self,
        participants: &[UserId],
        broadcast: Broadcast,
    ) -> Result<(), RpcError> {
        self.deliver(Some(participants), broadcast).await;
        Ok(())
    }
}
