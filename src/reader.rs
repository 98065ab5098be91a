use super::error::ReplayError;
use super::replay::Replayer;
use super::types::GameRecord;
use super::visitor::GameVisitor;

use log::{debug, info};
use pgn_reader::Reader;
use shakmaty::Color;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub type PgnInput = Box<dyn Read>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub games: usize,
    pub moves: usize,
    pub searches: usize,
}

pub fn open_input_stream(path: &Path) -> Result<PgnInput, ReplayError> {
    if !path.exists() {
        return Err(ReplayError::FileNotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(file))
}

/// Games decoded one at a time from a PGN stream.
pub struct GameStream {
    pgn_reader: Reader<PgnInput>,
    visitor: GameVisitor,
    path: PathBuf,
}

impl GameStream {
    pub fn new(input: PgnInput, path: impl Into<PathBuf>) -> Self {
        Self {
            pgn_reader: Reader::new(input),
            visitor: GameVisitor::new(),
            path: path.into(),
        }
    }

    pub fn next_game(&mut self) -> Result<Option<GameRecord>, ReplayError> {
        match self.pgn_reader.read_game(&mut self.visitor) {
            Ok(Some(game)) => game.map(Some),
            Ok(None) => Ok(None),
            Err(source) => Err(ReplayError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Iterator for GameStream {
    type Item = Result<GameRecord, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_game().transpose()
    }
}

/// Replay every game of `games`. Unplayable moves only cut their own game
/// short; a bad starting position or a read failure aborts the run.
pub fn replay_stream<W: Write>(
    games: GameStream,
    side: Color,
    out: W,
) -> Result<ReplaySummary, ReplayError> {
    let mut replayer = Replayer::new(out, side);
    let mut summary = ReplaySummary::default();

    replayer.prelude()?;
    for game in games {
        let game = game?;
        if !game.notes.is_empty() {
            debug!("game {}: {}", game.index, game.notes.join("; "));
        }

        let game_summary = replayer.replay_game(&game)?;
        debug!(
            "game {} ({}): {} moves, {} node-limited searches",
            game.index,
            game.header("Event").unwrap_or("?"),
            game_summary.moves,
            game_summary.searches
        );

        summary.moves += game_summary.moves;
        summary.searches += game_summary.searches;
    }
    summary.games = replayer.games();

    Ok(summary)
}

pub fn replay_file<W: Write>(
    path: &Path,
    side: Color,
    out: W,
) -> Result<ReplaySummary, ReplayError> {
    let input = open_input_stream(path)?;
    let summary = replay_stream(GameStream::new(input, path), side, out)?;

    info!(
        "replayed {} game(s) from '{}' as {:?}: {} moves, {} node-limited searches",
        summary.games,
        path.display(),
        side,
        summary.moves,
        summary.searches
    );
    Ok(summary)
}
