use std::sync::Arc;

use engine::OpponentDescriptor;
use tokio::sync::{mpsc, oneshot, watch};

use super::commands::*;
use super::snapshot::{ExchangeView, GameView};

/// Cheap, cloneable handle to the session actor.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
    view_rx: watch::Receiver<GameView>,
    descriptor: Arc<OpponentDescriptor>,
}

impl SessionHandle {
    pub(crate) fn new(
        cmd_tx: mpsc::Sender<SessionCommand>,
        view_rx: watch::Receiver<GameView>,
        descriptor: Arc<OpponentDescriptor>,
    ) -> Self {
        Self {
            cmd_tx,
            view_rx,
            descriptor,
        }
    }

    /// Play the client's move and the opponent's reply as one unit.
    /// Exchanges queue behind each other in arrival order.
    pub async fn apply_move_exchange(
        &self,
        input: MoveInput,
    ) -> Result<ExchangeView, ExchangeError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Exchange { input, reply: tx })
            .await?;
        rx.await
            .map_err(|_| ExchangeError::Internal("Reply dropped".into()))?
    }

    /// The latest published view. Never waits for an exchange in flight.
    pub fn current_view(&self) -> GameView {
        self.view_rx.borrow().clone()
    }

    pub async fn reset(&self) -> Result<GameView, ExchangeError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Reset { reply: tx }).await?;
        rx.await
            .map_err(|_| ExchangeError::Internal("Reply dropped".into()))
    }

    /// Identity and options the opponent reported at startup.
    pub fn opponent_descriptor(&self) -> &OpponentDescriptor {
        &self.descriptor
    }

    /// Wait for queued exchanges to finish, then stop the opponent.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(SessionCommand::Shutdown { done: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), ExchangeError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| ExchangeError::Internal("Session actor closed".into()))
    }
}
