use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use super::commands::SessionCommand;
use super::snapshot::GameView;
use super::state::SessionState;

/// The main session actor loop.
/// Owns all mutable state and processes commands one at a time.
pub(crate) async fn run_session_actor(
    state: SessionState,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    view_tx: watch::Sender<GameView>,
) {
    run_session_actor_inner(state, cmd_rx, view_tx)
        .instrument(tracing::info_span!("session"))
        .await;
}

async fn run_session_actor_inner(
    mut state: SessionState,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    view_tx: watch::Sender<GameView>,
) {
    tracing::info!(game_id = %state.game_id, "Session actor started");

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            SessionCommand::Exchange { input, reply } => {
                let result = state.apply_move_exchange(&input).await;
                if let Err(e) = &result {
                    tracing::info!(kind = e.kind(), "Exchange rejected: {}", e);
                }
                // The client move may be committed even when the exchange failed.
                view_tx.send_if_modified(|current| {
                    let next = state.view();
                    if *current == next {
                        return false;
                    }
                    *current = next;
                    true
                });
                let _ = reply.send(result);
            }
            SessionCommand::Reset { reply } => {
                let view = state.reset();
                view_tx.send_replace(view.clone());
                let _ = reply.send(view);
            }
            SessionCommand::Shutdown { done } => {
                tracing::info!("Session actor shutting down");
                state.opponent.quit().await;
                let _ = done.send(());
                return;
            }
        }
    }

    tracing::info!("All session handles dropped");
    state.opponent.quit().await;
}
