use std::collections::BTreeMap;
use std::fmt;

use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Move, Position, PositionError};

/// Where a game starts, as it is spelled on a UCI `position` line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StartPosition {
    #[default]
    Default,
    /// `FEN` tag value, kept verbatim.
    Fen(String),
}

impl fmt::Display for StartPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("startpos"),
            Self::Fen(fen) => write!(f, "fen {fen}"),
        }
    }
}

/// A half-move of the mainline: a real move or a null move (`--`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ply {
    Move(Move),
    Null,
}

impl Ply {
    /// Advance `board` by this ply. A null move only passes the turn and
    /// fails when that would leave the side not to move in check.
    pub fn play(&self, board: Chess) -> Result<Chess, PositionError<Chess>> {
        match self {
            Self::Move(mv) => {
                let mut board = board;
                board.play_unchecked(mv.clone());
                Ok(board)
            }
            Self::Null => board.swap_turn(),
        }
    }

    pub fn to_uci(&self, mode: CastlingMode) -> String {
        match self {
            Self::Move(mv) => mv.to_uci(mode).to_string(),
            Self::Null => UciMove::Null.to_string(),
        }
    }
}

/// A mainline ply and the comment that follows it.
#[derive(Debug, Clone)]
pub struct MoveNode {
    pub ply: Ply,
    pub san: String,
    pub comment: Option<String>,
}

/// One decoded PGN game.
#[derive(Debug, Clone)]
pub struct GameRecord {
    /// 1-based position of the game in its file.
    pub index: usize,
    pub headers: BTreeMap<String, String>,
    pub start: StartPosition,
    pub start_board: Chess,
    pub castling_mode: CastlingMode,
    pub mainline: Vec<MoveNode>,
    /// Non-fatal decode diagnostics, in the order they were found.
    pub notes: Vec<String>,
    /// Set when an unplayable move cut the mainline short.
    pub truncated: bool,
}

impl GameRecord {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}
