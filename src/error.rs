use std::io;
use std::path::PathBuf;

use shakmaty::fen::ParseFenError;
use shakmaty::{Chess, PositionError};
use thiserror::Error;

pub const USAGE: &str = "Usage: crash_replay <pgn_file> <white|black>\n   \
                         or: crash_replay <white|black> <pgn_file>";

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("{}", USAGE)]
    Usage,
    #[error("Second argument must be 'white' or 'black' (or first).")]
    MissingColor,
    #[error("PGN file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid FEN in game {game}: '{fen}' ({source})")]
    Fen {
        game: usize,
        fen: String,
        #[source]
        source: ParseFenError,
    },
    #[error("Illegal starting position in game {game}: '{fen}' ({source})")]
    Position {
        game: usize,
        fen: String,
        #[source]
        source: Box<PositionError<Chess>>,
    },
    #[error("Cannot replay ply {ply} of game {game}: {source}")]
    Replay {
        game: usize,
        ply: usize,
        #[source]
        source: Box<PositionError<Chess>>,
    },
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl ReplayError {
    /// Argument and missing-file errors are user mistakes reported on stdout;
    /// everything else is a fault.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Usage | Self::MissingColor | Self::FileNotFound(_)
        )
    }
}
