//! The search opponent: a UCI engine behind the [`Opponent`] trait.

#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod process;
pub mod uci;

pub use process::{EngineConfig, UciEngine};
pub use uci::{UciError, UciMessage};

use async_trait::async_trait;
use cozy_chess::Move;
use serde::Serialize;

/// A search-capable opponent reached through a request/response channel.
///
/// The opponent keeps no authoritative game state: callers send the full
/// position before every search.
#[async_trait]
pub trait Opponent: Send {
    /// Identity and options reported during the handshake.
    fn descriptor(&self) -> &OpponentDescriptor;

    /// Tell the opponent that the next position belongs to a different game.
    async fn new_game(&mut self) -> Result<(), UciError>;

    /// Set the position to search: a start FEN plus moves in UCI notation.
    async fn set_position(&mut self, fen: &str, moves: &[String]) -> Result<(), UciError>;

    /// Search the current position and wait for the chosen move.
    async fn search(&mut self, params: &GoParams) -> Result<SearchOutcome, UciError>;

    /// Bring the channel back to a known idle state after an aborted search.
    async fn resync(&mut self) -> Result<(), UciError>;

    /// Terminate the opponent. The channel is unusable afterwards.
    async fn quit(&mut self);
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub movetime: Option<u64>, // Move time in milliseconds
    pub depth: Option<u8>,     // Search depth
    pub infinite: bool,        // Search until "stop"
}

impl GoParams {
    pub fn movetime(ms: u64) -> Self {
        Self {
            movetime: Some(ms),
            ..Default::default()
        }
    }

    /// Render as a UCI `go` command; with nothing set, one second of thinking.
    pub fn to_command(&self) -> String {
        if let Some(movetime) = self.movetime {
            format!("go movetime {}", movetime)
        } else if let Some(depth) = self.depth {
            format!("go depth {}", depth)
        } else if self.infinite {
            "go infinite".to_string()
        } else {
            "go movetime 1000".to_string()
        }
    }
}

/// Result of one search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// `None` when the engine answered `bestmove (none)`.
    pub best_move: Option<Move>,
    pub ponder: Option<Move>,
    /// The last informative `info` line seen during the search.
    pub info: EngineInfo,
}

/// Engine analysis information
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seldepth: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    /// Principal variation in UCI notation
    pub pv: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multipv: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currmove: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashfull: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nps: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
}

impl EngineInfo {
    /// Whether the line carries an evaluation worth reporting.
    pub fn is_informative(&self) -> bool {
        self.score.is_some() || !self.pv.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Score {
    #[serde(rename = "cp")]
    Centipawns(i32),
    #[serde(rename = "mate")]
    Mate(i8), // Negative for being mated
}

/// What the engine reported about itself during the handshake.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpponentDescriptor {
    pub name: Option<String>,
    pub author: Option<String>,
    pub options: Vec<UciOption>,
}

impl OpponentDescriptor {
    pub fn option(&self, name: &str) -> Option<&UciOption> {
        self.options
            .iter()
            .find(|opt| opt.name.eq_ignore_ascii_case(name))
    }
}

/// One `option` line from the engine, plus the value we set, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UciOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: UciOptionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vars: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UciOptionKind {
    Check,
    Spin,
    Combo,
    Button,
    String,
}

impl std::str::FromStr for UciOptionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "check" => Ok(Self::Check),
            "spin" => Ok(Self::Spin),
            "combo" => Ok(Self::Combo),
            "button" => Ok(Self::Button),
            "string" => Ok(Self::String),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_command_precedence() {
        assert_eq!(GoParams::movetime(250).to_command(), "go movetime 250");
        let depth = GoParams {
            depth: Some(12),
            ..Default::default()
        };
        assert_eq!(depth.to_command(), "go depth 12");
        let infinite = GoParams {
            infinite: true,
            ..Default::default()
        };
        assert_eq!(infinite.to_command(), "go infinite");
        assert_eq!(GoParams::default().to_command(), "go movetime 1000");
    }

    #[test]
    fn test_score_serializes_tagged() {
        let info = EngineInfo {
            depth: Some(8),
            score: Some(Score::Mate(-3)),
            pv: vec!["e2e4".to_string()],
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["score"], serde_json::json!({"mate": -3}));
        assert_eq!(json["depth"], 8);
        assert!(json.get("nodes").is_none());
    }
}
