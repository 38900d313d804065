pub mod actor;
pub mod commands;
pub mod handle;
pub mod snapshot;
pub mod state;

use std::sync::Arc;

use engine::Opponent;
use tokio::sync::{mpsc, watch};

use actor::run_session_actor;
pub use commands::{Committed, ExchangeError, MoveInput};
pub use handle::SessionHandle;
pub use snapshot::{ExchangeView, GameView};
pub use state::SessionSettings;
use state::SessionState;

/// Start the single game session and its actor task.
///
/// The opponent must already have completed its handshake; its descriptor
/// is captured here and served unchanged for the life of the session.
pub fn spawn_session(opponent: Box<dyn Opponent>, settings: SessionSettings) -> SessionHandle {
    let descriptor = Arc::new(opponent.descriptor().clone());
    let state = SessionState::new(opponent, settings);

    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (view_tx, view_rx) = watch::channel(state.view());

    tokio::spawn(run_session_actor(state, cmd_rx, view_tx));

    SessionHandle::new(cmd_tx, view_rx, descriptor)
}
