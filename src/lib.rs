mod args;
mod error;
pub mod logging;
mod nodes;
mod reader;
mod replay;
mod types;
mod visitor;

pub use args::{ReplayArgs, normalize_args, parse_side};
pub use error::{ReplayError, USAGE};
pub use nodes::{NodeCount, extract_node_count};
pub use reader::{
    GameStream, PgnInput, ReplaySummary, open_input_stream, replay_file, replay_stream,
};
pub use replay::{FINAL_SEARCH_DEPTH, GAME_SEPARATOR, GameSummary, Replayer};
pub use types::{GameRecord, MoveNode, Ply, StartPosition};
pub use visitor::GameVisitor;
