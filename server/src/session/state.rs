use std::time::Duration;

use chess::{format_uci_move, Game, Notation, NotationError};
use engine::{EngineInfo, GoParams, Opponent, SearchOutcome, UciError};
use uuid::Uuid;

use super::commands::{Committed, ExchangeError, MoveInput};
use super::snapshot::{ExchangeView, GameView};

/// Timing for opponent searches.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub move_time: Duration,
    /// Extra time allowed past `move_time` before the reply counts as lost.
    pub search_grace: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            move_time: Duration::from_millis(1000),
            search_grace: Duration::from_secs(5),
        }
    }
}

/// The opponent's reply to one client move.
struct Reply {
    best_move: String,
    ponder: Option<String>,
    info: EngineInfo,
}

/// Internal mutable state, owned entirely by the session actor. No locks.
pub(crate) struct SessionState {
    pub game_id: String,
    pub game: Game,
    pub opponent: Box<dyn Opponent>,
    pub settings: SessionSettings,
    /// Why the last exchange lost its reply. Published in the view until a
    /// later client move is committed.
    pub last_fault: Option<String>,
    /// Send `ucinewgame` before the next search.
    pub needs_new_game: bool,
}

impl SessionState {
    pub fn new(opponent: Box<dyn Opponent>, settings: SessionSettings) -> Self {
        Self {
            game_id: Uuid::new_v4().to_string(),
            game: Game::new(),
            opponent,
            settings,
            last_fault: None,
            // The engine handshake already started a fresh game.
            needs_new_game: false,
        }
    }

    pub fn view(&self) -> GameView {
        GameView {
            opponent_fault: self.last_fault.clone(),
            ..GameView::of(&self.game_id, &self.game)
        }
    }

    /// Discard the game and start over from the standard position.
    pub fn reset(&mut self) -> GameView {
        self.game = Game::new();
        self.game_id = Uuid::new_v4().to_string();
        self.last_fault = None;
        self.needs_new_game = true;
        tracing::info!(game_id = %self.game_id, "New game started");
        self.view()
    }

    /// Validate and commit the client's move, then obtain and commit the
    /// opponent's reply.
    pub async fn apply_move_exchange(
        &mut self,
        input: &MoveInput,
    ) -> Result<ExchangeView, ExchangeError> {
        if let Some(outcome) = self.game.outcome() {
            return Err(ExchangeError::GameOver(outcome.to_string()));
        }

        let mv = self
            .game
            .decode(input.notation(), input.text())
            .map_err(|e| match e {
                NotationError::Illegal(text) => ExchangeError::IllegalMove(text),
                NotationError::Malformed(_) | NotationError::Ambiguous(_) => {
                    ExchangeError::InvalidNotation(format!("{} ({})", e, input.notation()))
                }
            })?;
        let entry = self
            .game
            .make_move(mv)
            .map_err(|e| ExchangeError::IllegalMove(e.to_string()))?;
        tracing::info!(client_move = %entry.uci, san = %entry.san, "Client move applied");
        if let Some(reason) = self.last_fault.take() {
            tracing::debug!(%reason, "Clearing previous opponent fault");
        }

        if self.game.is_over() {
            return Ok(ExchangeView {
                best_move: None,
                ponder: None,
                game: self.view(),
                info: EngineInfo::default(),
            });
        }

        match self.request_reply().await {
            Ok(reply) => Ok(ExchangeView {
                best_move: Some(reply.best_move),
                ponder: reply.ponder,
                game: self.view(),
                info: reply.info,
            }),
            Err(reason) => {
                tracing::warn!(%reason, "Opponent failed to reply");
                self.last_fault = Some(reason.clone());
                Err(ExchangeError::OpponentFault {
                    reason,
                    committed: Committed::ClientMove,
                })
            }
        }
    }

    async fn request_reply(&mut self) -> Result<Reply, String> {
        let start_fen = self.game.start_position().fen().to_string();
        let moves = self.game.uci_history();
        let params = GoParams::movetime(self.settings.move_time.as_millis() as u64);
        let deadline = self.settings.move_time + self.settings.search_grace;

        let search = search_position(
            self.opponent.as_mut(),
            &mut self.needs_new_game,
            &start_fen,
            &moves,
            &params,
        );

        let outcome = tokio::time::timeout(deadline, search)
            .await
            .map_err(|_| format!("no reply within {} ms", deadline.as_millis()))?
            .map_err(|e| e.to_string())?;

        let best = outcome
            .best_move
            .ok_or_else(|| "opponent reported no move in a playable position".to_string())?;
        let text = format_uci_move(best);
        let mv = self
            .game
            .decode(Notation::Uci, &text)
            .map_err(|_| format!("opponent move {} is not legal", text))?;
        let entry = self.game.make_move(mv).map_err(|e| e.to_string())?;
        tracing::info!(best_move = %entry.uci, san = %entry.san, "Opponent move applied");

        Ok(Reply {
            best_move: entry.uci,
            ponder: outcome.ponder.map(format_uci_move),
            info: outcome.info,
        })
    }
}

async fn search_position(
    opponent: &mut dyn Opponent,
    needs_new_game: &mut bool,
    start_fen: &str,
    moves: &[String],
    params: &GoParams,
) -> Result<SearchOutcome, UciError> {
    if *needs_new_game {
        opponent.new_game().await?;
        *needs_new_game = false;
    }
    opponent.set_position(start_fen, moves).await?;
    opponent.search(params).await
}
