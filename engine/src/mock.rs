//! Scripted [`Opponent`] for testing code that drives an engine.

use crate::uci::{parse_uci_move, UciError};
use crate::{EngineInfo, GoParams, Opponent, OpponentDescriptor, SearchOutcome, UciOption};
use async_trait::async_trait;
use chess::{Game, Notation};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock does when asked to search.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer `bestmove <uci>`; the text is not checked for legality.
    BestMove(String),
    /// Answer `bestmove <uci> ponder <uci>`.
    BestMoveWithPonder(String, String),
    /// Answer `bestmove (none)`.
    NoMove,
    /// Fail the search with a protocol error.
    Fail(String),
    /// Never answer.
    Hang,
}

/// Mock opponent - only compiled in test mode or with the mock feature.
///
/// Searches consume scripted replies in order; once the script is empty the
/// mock plays the first legal move of the position it was given.
pub struct MockOpponent {
    descriptor: OpponentDescriptor,
    replies: VecDeque<MockReply>,
    call_log: Arc<Mutex<Vec<String>>>,
    delay: Duration,
    position: Option<(String, Vec<String>)>,
    searching: bool,
}

/// Shared view into a [`MockOpponent`] after it has been moved elsewhere.
#[derive(Clone)]
pub struct MockHandle {
    call_log: Arc<Mutex<Vec<String>>>,
}

impl Default for MockOpponent {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOpponent {
    pub fn new() -> Self {
        Self {
            descriptor: OpponentDescriptor {
                name: Some("MockFish".to_string()),
                author: Some("playfish".to_string()),
                options: Vec::new(),
            },
            replies: VecDeque::new(),
            call_log: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
            position: None,
            searching: false,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.descriptor.name = Some(name.to_string());
        self
    }

    pub fn with_option(mut self, option: UciOption) -> Self {
        self.descriptor.options.push(option);
        self
    }

    pub fn with_replies(mut self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        self.replies.extend(replies);
        self
    }

    /// Sleep this long before answering every search.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            call_log: self.call_log.clone(),
        }
    }

    fn record(&self, call: String) {
        lock(&self.call_log).push(call);
    }

    fn first_legal_move(&self) -> Result<Option<String>, UciError> {
        let (fen, moves) = self
            .position
            .as_ref()
            .ok_or_else(|| UciError::Protocol("search without position".to_string()))?;
        let mut game = Game::from_fen(fen).map_err(|e| UciError::Protocol(e.to_string()))?;
        for text in moves {
            let mv = game
                .decode(Notation::Uci, text)
                .map_err(|e| UciError::Protocol(e.to_string()))?;
            game.make_move(mv)
                .map_err(|e| UciError::Protocol(e.to_string()))?;
        }
        Ok(game.legal_moves_uci().into_iter().next())
    }
}

impl MockHandle {
    /// Every command received so far, rendered as the UCI line it stands for.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.call_log).clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        lock(&self.call_log)
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Opponent for MockOpponent {
    fn descriptor(&self) -> &OpponentDescriptor {
        &self.descriptor
    }

    async fn new_game(&mut self) -> Result<(), UciError> {
        self.resync().await?;
        self.record("ucinewgame".to_string());
        self.position = None;
        Ok(())
    }

    async fn set_position(&mut self, fen: &str, moves: &[String]) -> Result<(), UciError> {
        self.resync().await?;
        let mut call = format!("position fen {}", fen);
        if !moves.is_empty() {
            call.push_str(" moves ");
            call.push_str(&moves.join(" "));
        }
        self.record(call);
        self.position = Some((fen.to_string(), moves.to_vec()));
        Ok(())
    }

    async fn search(&mut self, params: &GoParams) -> Result<SearchOutcome, UciError> {
        self.resync().await?;
        self.record(params.to_command());
        self.searching = true;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self.replies.pop_front();
        let mut ponder = None;
        let best_move = match scripted {
            Some(MockReply::BestMove(text)) => Some(text),
            Some(MockReply::BestMoveWithPonder(text, reply)) => {
                ponder = Some(reply);
                Some(text)
            }
            Some(MockReply::NoMove) => None,
            Some(MockReply::Fail(message)) => {
                self.searching = false;
                return Err(UciError::Protocol(message));
            }
            Some(MockReply::Hang) => {
                std::future::pending::<()>().await;
                None
            }
            None => self.first_legal_move()?,
        };
        self.searching = false;

        let best_move = best_move.map(|text| parse_uci_move(&text)).transpose()?;
        let ponder = ponder.map(|text| parse_uci_move(&text)).transpose()?;
        Ok(SearchOutcome {
            best_move,
            ponder,
            info: EngineInfo {
                depth: Some(1),
                pv: best_move.map(chess::format_uci_move).into_iter().collect(),
                ..Default::default()
            },
        })
    }

    async fn resync(&mut self) -> Result<(), UciError> {
        if self.searching {
            self.record("stop".to_string());
            self.searching = false;
        }
        Ok(())
    }

    async fn quit(&mut self) {
        self.record("quit".to_string());
    }
}
