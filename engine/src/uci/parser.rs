use crate::{EngineInfo, Score, UciOption, UciOptionKind};
use cozy_chess::Move;

/// Incoming message from UCI engine
#[derive(Debug, Clone)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)`, sent when there is nothing to play.
    BestMove { mv: Option<Move>, ponder: Option<Move> },
    Info(EngineInfo),
    Option(UciOption),
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, crate::UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(crate::UciError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"bestmove") => {
            let mv = match tokens.get(1) {
                Some(&"(none)") | Some(&"0000") => None,
                Some(token) => Some(parse_uci_move(token)?),
                None => return Err(crate::UciError::MalformedMessage(line.to_string())),
            };
            let ponder = if tokens.len() >= 4 && tokens[2] == "ponder" {
                parse_uci_move(tokens[3]).ok()
            } else {
                None
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..]))),

        Some(&"option") => parse_option_line(&tokens[1..])
            .map(UciMessage::Option)
            .ok_or_else(|| crate::UciError::MalformedMessage(line.to_string())),

        _ => Err(crate::UciError::UnknownMessage(line.to_string())),
    }
}

/// Parse an "info" line from the engine
fn parse_info_line(tokens: &[&str]) -> EngineInfo {
    let mut info = EngineInfo::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "seldepth" => {
                i += 1;
                info.seldepth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                info.time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nps" => {
                i += 1;
                info.nps = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value_str) = tokens.get(i) {
                        info.score = match score_type {
                            "cp" => value_str.parse().ok().map(Score::Centipawns),
                            "mate" => value_str.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
            }
            "pv" => {
                // Collect all moves until next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    if parse_uci_move(tokens[i]).is_ok() {
                        info.pv.push(tokens[i].to_string());
                    }
                    i += 1;
                }
                continue;
            }
            "multipv" => {
                i += 1;
                info.multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "currmove" => {
                i += 1;
                info.currmove = tokens
                    .get(i)
                    .filter(|s| parse_uci_move(s).is_ok())
                    .map(|s| s.to_string());
            }
            "hashfull" => {
                i += 1;
                info.hashfull = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "string" => {
                // The rest of the line is free text
                info.string = Some(tokens[i + 1..].join(" "));
                break;
            }
            _ => {}
        }
        i += 1;
    }

    info
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "cpuload"
            | "string"
    )
}

/// Parse the body of an `option` line. Names and values may contain spaces.
fn parse_option_line(tokens: &[&str]) -> Option<UciOption> {
    let mut name: Vec<&str> = Vec::new();
    let mut kind = None;
    let mut default: Option<Vec<&str>> = None;
    let mut min = None;
    let mut max = None;
    let mut vars: Vec<Vec<&str>> = Vec::new();

    let mut current = "";
    for &token in tokens {
        match token {
            "name" | "type" | "default" | "min" | "max" => {
                current = token;
                if token == "default" {
                    default = Some(Vec::new());
                }
                continue;
            }
            "var" => {
                current = token;
                vars.push(Vec::new());
                continue;
            }
            _ => {}
        }
        match current {
            "name" => name.push(token),
            "type" => kind = token.parse::<UciOptionKind>().ok(),
            "default" => default.get_or_insert_with(Vec::new).push(token),
            "min" => min = token.parse().ok(),
            "max" => max = token.parse().ok(),
            "var" => {
                if let Some(var) = vars.last_mut() {
                    var.push(token);
                }
            }
            _ => return None,
        }
    }

    if name.is_empty() {
        return None;
    }
    Some(UciOption {
        name: name.join(" "),
        kind: kind?,
        default: default.map(|words| match words.join(" ") {
            s if s == "<empty>" => String::new(),
            s => s,
        }),
        min,
        max,
        vars: vars.into_iter().map(|words| words.join(" ")).collect(),
        value: None,
    })
}

/// Parse UCI move format (e2e4, e7e8q) without castling translation
pub fn parse_uci_move(s: &str) -> Result<Move, crate::UciError> {
    chess::uci::parse_uci_move(s).map_err(|_| crate::UciError::InvalidMove(s.to_string()))
}
