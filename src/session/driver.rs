//! Async runtime around [`Store`].
//!
//! One task owns the store and applies actions in the order they arrive
//! on its channel. Effects the stages request are carried out here:
//! refresh calls run in spawned tasks and report back through the same
//! channel, and the single refresh timer is a task whose handle is kept
//! so logout can abort it.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use super::action::Action;
use super::api::AuthApi;
use super::persist::PersistedState;
use super::stage::Effect;
use super::state::ClientState;
use super::store::Store;
use crate::clock::Clock;

#[derive(Debug, Error)]
#[error("Session runtime has stopped")]
pub struct SessionClosed;

pub enum SessionCommand {
    Dispatch(Action),
    Snapshot(oneshot::Sender<ClientState>),
    Persist(oneshot::Sender<PersistedState>),
}

#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn dispatch(&self, action: Action) -> Result<(), SessionClosed> {
        self.tx
            .send(SessionCommand::Dispatch(action))
            .await
            .map_err(|_| SessionClosed)
    }

    pub async fn snapshot(&self) -> Result<ClientState, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Snapshot(tx))
            .await
            .map_err(|_| SessionClosed)?;
        rx.await.map_err(|_| SessionClosed)
    }

    pub async fn persisted(&self) -> Result<PersistedState, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Persist(tx))
            .await
            .map_err(|_| SessionClosed)?;
        rx.await.map_err(|_| SessionClosed)
    }
}

struct SessionDriver {
    store: Store,
    auth_api: Arc<dyn AuthApi>,
    clock: Arc<dyn Clock>,
    // weak, so the loop ends once every handle is dropped
    feedback: mpsc::WeakSender<SessionCommand>,
    refresh_timer: Option<AbortHandle>,
}

/// Starts the session runtime. The task exits when every
/// [`SessionHandle`] has been dropped.
pub fn spawn_session(
    store: Store,
    auth_api: Arc<dyn AuthApi>,
    clock: Arc<dyn Clock>,
) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(64);
    let driver = SessionDriver {
        store,
        auth_api,
        clock,
        feedback: tx.downgrade(),
        refresh_timer: None,
    };
    let task = tokio::spawn(driver.run(rx));
    (SessionHandle { tx }, task)
}

impl SessionDriver {
    async fn run(mut self, mut rx: mpsc::Receiver<SessionCommand>) {
        info!("Session runtime started");
        // restored sessions may already have effects queued
        self.run_effects();

        while let Some(cmd) = rx.recv().await {
            match cmd {
                SessionCommand::Dispatch(action) => {
                    self.store.dispatch(action);
                    self.run_effects();
                }
                SessionCommand::Snapshot(reply) => {
                    let _ = reply.send(self.store.state().clone());
                }
                SessionCommand::Persist(reply) => {
                    let _ = reply.send(self.store.persisted());
                }
            }
        }

        self.cancel_timer();
        info!("Session runtime stopped");
    }

    fn run_effects(&mut self) {
        for effect in self.store.take_effects() {
            match effect {
                Effect::RefreshToken { token } => self.spawn_refresh(token),
                Effect::ScheduleRefresh { at } => {
                    let delay = (at - self.clock.now()).to_std().unwrap_or(Duration::ZERO);
                    self.schedule_refresh(delay);
                }
                Effect::CancelRefresh => self.cancel_timer(),
            }
        }
    }

    fn spawn_refresh(&self, token: String) {
        let Some(tx) = self.feedback.upgrade() else {
            return;
        };
        let api = Arc::clone(&self.auth_api);
        tokio::spawn(async move {
            let action = match api.refresh(&token).await {
                Ok(grant) => Action::RefreshSuccess {
                    token: grant.token,
                    expires_at: grant.expires_at,
                },
                Err(e) => {
                    warn!(error = %e, "Token refresh call failed");
                    Action::RefreshFailure {
                        error: e.to_string(),
                    }
                }
            };
            let _ = tx.send(SessionCommand::Dispatch(action)).await;
        });
    }

    fn schedule_refresh(&mut self, delay: Duration) {
        self.cancel_timer();
        let feedback = self.feedback.clone();
        debug!(?delay, "Refresh timer armed");

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = feedback.upgrade() {
                let _ = tx.send(SessionCommand::Dispatch(Action::RefreshTimerFired)).await;
            }
        });
        self.refresh_timer = Some(task.abort_handle());
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.refresh_timer.take() {
            timer.abort();
            debug!("Refresh timer cancelled");
        }
    }
}
