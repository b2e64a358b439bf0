//! Coordinator actor.
//!
//! The actor owns the `Coordinator` and processes its mailbox one message at
//! a time, so cooldown and quota checks are serialized across every page
//! context that holds a `CoordinatorHandle`.

use crate::coordinator::engine::Coordinator;
use crate::detector::IntentSink;
use crate::domain::{Clock, CoordinatorError, Decision, DownloadIntent, UserId, UserRecord};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use ractor::concurrency::JoinHandle;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::{oneshot, watch};

/// Messages that can be sent to the coordinator actor.
pub enum CoordinatorMessage {
    /// Decide a download intent and reply with the decision.
    Decide {
        intent: DownloadIntent,
        /// Epoch millis at which the handle accepted the intent.
        received_at: i64,
        reply: oneshot::Sender<Decision>,
    },
    /// Get the current user record.
    GetUserRecord(oneshot::Sender<UserRecord>),
    /// External approval: upgrade the user to Premium.
    Approve(UserId, oneshot::Sender<Result<UserRecord, CoordinatorError>>),
    /// Payment submitted: move a free user to Pending.
    MarkPending(oneshot::Sender<Result<UserRecord, CoordinatorError>>),
}

/// The coordinator actor.
pub struct CoordinatorActor;

#[async_trait]
impl Actor for CoordinatorActor {
    type Msg = CoordinatorMessage;
    type State = Coordinator;
    type Arguments = Coordinator;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        coordinator: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        Ok(coordinator)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            CoordinatorMessage::Decide {
                intent,
                received_at,
                reply,
            } => {
                let decision = state.decide_received(intent, received_at).await;
                if reply.send(decision).is_err() {
                    tracing::debug!("Decision reply channel closed");
                }
            }
            CoordinatorMessage::GetUserRecord(reply) => {
                if reply.send(state.record().clone()).is_err() {
                    tracing::debug!("Record reply channel closed");
                }
            }
            CoordinatorMessage::Approve(user_id, reply) => {
                if reply.send(state.approve(&user_id)).is_err() {
                    tracing::debug!("Approve reply channel closed");
                }
            }
            CoordinatorMessage::MarkPending(reply) => {
                if reply.send(state.mark_pending()).is_err() {
                    tracing::debug!("Mark-pending reply channel closed");
                }
            }
        }

        Ok(())
    }
}

/// Cloneable entry point to the coordinator actor.
#[derive(Clone)]
pub struct CoordinatorHandle {
    actor: ActorRef<CoordinatorMessage>,
    snapshot_rx: watch::Receiver<UserRecord>,
    clock: Arc<dyn Clock>,
}

impl CoordinatorHandle {
    /// Spawns the actor around `coordinator`.
    ///
    /// `snapshot_rx` is the receiver returned by `Coordinator::new`.
    pub async fn spawn(
        coordinator: Coordinator,
        snapshot_rx: watch::Receiver<UserRecord>,
    ) -> Result<(Self, JoinHandle<()>), CoordinatorError> {
        let clock = coordinator.clock();
        let (actor, join) = CoordinatorActor::spawn(None, CoordinatorActor, coordinator)
            .await
            .map_err(|e| CoordinatorError::Unavailable {
                message: format!("failed to spawn coordinator: {}", e),
            })?;
        Ok((
            Self {
                actor,
                snapshot_rx,
                clock,
            },
            join,
        ))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> CoordinatorMessage,
    ) -> Result<T, CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        self.actor
            .send_message(build(tx))
            .map_err(|_| mailbox_closed())?;
        rx.await.map_err(|_| reply_dropped())
    }

    /// Submits a download intent and returns a future for the decision.
    ///
    /// The arrival time is stamped and the intent enqueued when this is
    /// called, not when the returned future is first polled.
    pub fn decide(
        &self,
        intent: DownloadIntent,
    ) -> impl Future<Output = Result<Decision, CoordinatorError>> + Send + 'static {
        let received_at = self.clock.now_millis();
        let (reply, rx) = oneshot::channel();
        let sent = self
            .actor
            .send_message(CoordinatorMessage::Decide {
                intent,
                received_at,
                reply,
            })
            .map_err(|_| mailbox_closed());
        async move {
            sent?;
            rx.await.map_err(|_| reply_dropped())
        }
    }

    /// Reads the coordinator's current record.
    pub async fn user_record(&self) -> Result<UserRecord, CoordinatorError> {
        self.request(CoordinatorMessage::GetUserRecord).await
    }

    /// Upgrades `user_id` to Premium.
    pub async fn approve(&self, user_id: &UserId) -> Result<UserRecord, CoordinatorError> {
        let user_id = user_id.clone();
        self.request(|tx| CoordinatorMessage::Approve(user_id, tx))
            .await?
    }

    /// Moves a free user to Pending.
    pub async fn mark_pending(&self) -> Result<UserRecord, CoordinatorError> {
        self.request(CoordinatorMessage::MarkPending).await?
    }

    /// Snapshot stream of the user record, updated after every persisted change.
    pub fn subscribe(&self) -> watch::Receiver<UserRecord> {
        self.snapshot_rx.clone()
    }

    /// Stops the actor. Pending requests fail with `Unavailable`.
    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

fn mailbox_closed() -> CoordinatorError {
    CoordinatorError::Unavailable {
        message: "coordinator mailbox closed".to_string(),
    }
}

fn reply_dropped() -> CoordinatorError {
    CoordinatorError::Unavailable {
        message: "coordinator dropped the reply".to_string(),
    }
}

#[async_trait]
impl IntentSink for CoordinatorHandle {
    async fn submit(&self, intent: DownloadIntent) -> Decision {
        match self.decide(intent).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!("Download intent not delivered: {}", e);
                Decision::Error
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/actor_tests.rs"]
mod tests;
