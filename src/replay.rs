use super::error::ReplayError;
use super::nodes::extract_node_count;
use super::types::GameRecord;

use log::debug;
use shakmaty::{Color, Position};
use smallvec::SmallVec;
use std::io::{self, Write};

/// Depth of the open-ended search issued once a game has been replayed.
pub const FINAL_SEARCH_DEPTH: u32 = 64;
pub const GAME_SEPARATOR: &str = "# --- next game ---";

type MoveList = SmallVec<[String; 128]>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameSummary {
    pub moves: usize,
    /// `go nodes` commands written for the game.
    pub searches: usize,
}

/// Writes the UCI command stream that replays games from one side's seat.
pub struct Replayer<W: Write> {
    out: W,
    side: Color,
    games: usize,
}

impl<W: Write> Replayer<W> {
    pub fn new(out: W, side: Color) -> Self {
        Self {
            out,
            side,
            games: 0,
        }
    }

    pub fn prelude(&mut self) -> io::Result<()> {
        writeln!(self.out, "uci")?;
        writeln!(self.out, "ucinewgame")
    }

    /// Emit `position`/`go nodes` for every move of the replayed side whose
    /// comment carries a node budget, then the full game with `go depth`.
    pub fn replay_game(&mut self, game: &GameRecord) -> Result<GameSummary, ReplayError> {
        if self.games > 0 {
            writeln!(self.out)?;
            writeln!(self.out, "{GAME_SEPARATOR}")?;
            writeln!(self.out, "ucinewgame")?;
        }
        self.games += 1;

        let mut board = game.start_board.clone();
        let mut moves = MoveList::new();
        let mut summary = GameSummary::default();

        for (idx, node) in game.mainline.iter().enumerate() {
            if board.turn() == self.side
                && let Some(nodes) = extract_node_count(node.comment.as_deref())
            {
                debug!(
                    "game {} ply {} ({}): go nodes {}",
                    game.index,
                    idx + 1,
                    node.san,
                    nodes
                );
                writeln!(self.out, "position {}{}", game.start, moves_fragment(&moves))?;
                writeln!(self.out, "go nodes {nodes}")?;
                summary.searches += 1;
            }

            board = node.ply.play(board).map_err(|source| ReplayError::Replay {
                game: game.index,
                ply: idx + 1,
                source: Box::new(source),
            })?;
            moves.push(node.ply.to_uci(game.castling_mode));
        }
        summary.moves = moves.len();

        // The final line keeps the marker even when nothing was played.
        writeln!(self.out, "position {} moves {}", game.start, moves.join(" "))?;
        writeln!(self.out, "go depth {FINAL_SEARCH_DEPTH}")?;
        self.out.flush()?;

        Ok(summary)
    }

    pub fn games(&self) -> usize {
        self.games
    }
}

fn moves_fragment(moves: &[String]) -> String {
    if moves.is_empty() {
        String::new()
    } else {
        format!(" moves {}", moves.join(" "))
    }
}
