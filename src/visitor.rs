use super::error::ReplayError;
use super::types::{GameRecord, MoveNode, Ply, StartPosition};

use log::warn;
use pgn_reader::{RawComment, RawTag, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::{CastlingMode, Chess};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::mem;
use std::ops::ControlFlow;

/// Streaming PGN visitor (pgn-reader).
///
/// Resolves every mainline SAN against a running `Chess` board and hangs
/// each `{ ... }` comment on the move it follows. Variations are skipped.
/// An unplayable move ends the mainline: the moves before it are kept and
/// everything after it in that game is dropped. A bad `FEN` tag fails the
/// whole game.
pub struct GameVisitor {
    game_index: usize,
    headers: BTreeMap<String, String>,
    start: StartPosition,
    start_board: Chess,
    pos: Chess,
    castling_mode: CastlingMode,
    mainline: Vec<MoveNode>,
    pending_comment: String,
    skipped_variations: usize,
    truncated: bool,
    notes: Vec<String>,
}

impl Default for GameVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl GameVisitor {
    pub fn new() -> Self {
        Self {
            game_index: 0,
            headers: BTreeMap::new(),
            start: StartPosition::Default,
            start_board: Chess::default(),
            pos: Chess::default(),
            castling_mode: CastlingMode::Standard,
            mainline: Vec::new(),
            pending_comment: String::new(),
            skipped_variations: 0,
            truncated: false,
            notes: Vec::new(),
        }
    }

    fn is_chess960(variant: &str) -> bool {
        let variant = variant.to_ascii_lowercase();
        variant.contains("960") || variant.contains("fischer")
    }

    fn setup_start_position(&mut self) -> Result<(), ReplayError> {
        self.castling_mode = match self.headers.get("Variant") {
            Some(variant) if Self::is_chess960(variant) => CastlingMode::Chess960,
            _ => CastlingMode::Standard,
        };

        let Some(fen) = self.headers.get("FEN") else {
            self.start = StartPosition::Default;
            self.start_board = Chess::default();
            self.pos = Chess::default();
            return Ok(());
        };

        let parsed = Fen::from_ascii(fen.as_bytes()).map_err(|source| ReplayError::Fen {
            game: self.game_index,
            fen: fen.clone(),
            source,
        })?;
        // Chess960 accepts every castling-rights spelling a standard setup can use.
        let board: Chess = parsed
            .into_position(CastlingMode::Chess960)
            .map_err(|source| ReplayError::Position {
                game: self.game_index,
                fen: fen.clone(),
                source: Box::new(source),
            })?;

        self.start = StartPosition::Fen(fen.clone());
        self.start_board = board.clone();
        self.pos = board;
        Ok(())
    }

    fn truncate(&mut self, san_plus: &SanPlus, reason: impl Display) {
        let note = format!(
            "illegal move {san_plus} at ply {} ({reason}), rest of mainline ignored",
            self.mainline.len() + 1
        );
        warn!("game {}: {}", self.game_index, note);
        self.notes.push(note);
        self.truncated = true;
    }

    fn attach_comment(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        match self.mainline.last_mut() {
            Some(node) => match &mut node.comment {
                Some(existing) => {
                    existing.push(' ');
                    existing.push_str(text);
                }
                None => node.comment = Some(text.to_string()),
            },
            None => self.notes.push(format!("game comment ignored: '{text}'")),
        }
    }

    fn build_game_record(&mut self) -> GameRecord {
        if self.skipped_variations > 0 {
            self.notes
                .push(format!("{} variation(s) skipped", self.skipped_variations));
        }

        GameRecord {
            index: self.game_index,
            headers: mem::take(&mut self.headers),
            start: mem::take(&mut self.start),
            start_board: mem::take(&mut self.start_board),
            castling_mode: self.castling_mode,
            mainline: mem::take(&mut self.mainline),
            notes: mem::take(&mut self.notes),
            truncated: self.truncated,
        }
    }
}

impl Visitor for GameVisitor {
    type Tags = ();
    type Movetext = ();
    type Output = Result<GameRecord, ReplayError>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.game_index += 1;
        self.headers.clear();
        self.start = StartPosition::Default;
        self.mainline.clear();
        self.pending_comment.clear();
        self.skipped_variations = 0;
        self.truncated = false;
        self.notes.clear();
        ControlFlow::Continue(())
    }

    fn tag(
        &mut self,
        _: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let key = String::from_utf8_lossy(key).into_owned();
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();

        if self.headers.contains_key(&key) {
            self.notes.push(format!("duplicate tag {key} ignored"));
        } else {
            self.headers.insert(key, value);
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        match self.setup_start_position() {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => ControlFlow::Break(Err(err)),
        }
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        self.skipped_variations += 1;
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, _: &mut Self::Movetext, san_plus: SanPlus) -> ControlFlow<Self::Output> {
        if self.truncated {
            return ControlFlow::Continue(());
        }

        let ply = match &san_plus.san {
            San::Null => Ply::Null,
            san => match san.to_move(&self.pos) {
                Ok(mv) => Ply::Move(mv),
                Err(err) => {
                    self.truncate(&san_plus, err);
                    return ControlFlow::Continue(());
                }
            },
        };

        match ply.play(mem::take(&mut self.pos)) {
            Ok(next) => {
                self.pos = next;
                self.mainline.push(MoveNode {
                    ply,
                    san: san_plus.to_string(),
                    comment: None,
                });
            }
            Err(err) => self.truncate(&san_plus, err),
        }
        ControlFlow::Continue(())
    }

    fn partial_comment(
        &mut self,
        _: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        if !self.truncated {
            self.pending_comment
                .push_str(&String::from_utf8_lossy(comment.as_bytes()));
        }
        ControlFlow::Continue(())
    }

    fn comment(
        &mut self,
        _: &mut Self::Movetext,
        comment: RawComment<'_>,
    ) -> ControlFlow<Self::Output> {
        let mut text = mem::take(&mut self.pending_comment);
        if self.truncated {
            return ControlFlow::Continue(());
        }

        text.push_str(&String::from_utf8_lossy(comment.as_bytes()));
        self.attach_comment(text.trim());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, _: Self::Movetext) -> Self::Output {
        Ok(self.build_game_record())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::extract_node_count;
    use pgn_reader::Reader;
    use shakmaty::{Color, Position};

    fn decode(pgn: &str) -> Result<GameRecord, ReplayError> {
        let mut reader = Reader::new(pgn.as_bytes());
        let mut visitor = GameVisitor::new();

        reader
            .read_game(&mut visitor)
            .unwrap()
            .expect("Should have read a game")
    }

    fn uci_moves(game: &GameRecord) -> Vec<String> {
        game.mainline
            .iter()
            .map(|node| node.ply.to_uci(game.castling_mode))
            .collect()
    }

    #[test]
    fn test_visitor_basic_parsing() {
        let pgn = r#"[Event "Crash Test"]
[White "engine-dev"]
[Result "*"]
1. e4 e5 2. Nf3 *"#;

        let game = decode(pgn).expect("Should have decoded");
        assert_eq!(game.index, 1);
        assert_eq!(game.header("Event"), Some("Crash Test"));
        assert_eq!(game.header("White"), Some("engine-dev"));
        assert_eq!(game.start, StartPosition::Default);
        assert_eq!(uci_moves(&game), ["e2e4", "e7e5", "g1f3"]);
        assert_eq!(game.mainline[2].san, "Nf3");
        assert!(game.notes.is_empty());
        assert!(!game.truncated);
    }

    #[test]
    fn test_visitor_comments_follow_their_move() {
        let pgn = r#"[Event "Comments"]
1. e4 {+0.54 16/0 1014 958275} e5 {book} 2. Nf3 *"#;

        let game = decode(pgn).expect("Should have decoded");
        assert_eq!(
            game.mainline[0].comment.as_deref(),
            Some("+0.54 16/0 1014 958275")
        );
        assert_eq!(game.mainline[1].comment.as_deref(), Some("book"));
        assert_eq!(game.mainline[2].comment, None);
    }

    #[test]
    fn test_visitor_multiple_comments_are_joined() {
        let pgn = r#"[Event "Comments"]
1. e4 { first } { 1000 } e5 *"#;

        let game = decode(pgn).expect("Should have decoded");
        assert_eq!(game.mainline[0].comment.as_deref(), Some("first 1000"));
    }

    #[test]
    fn test_visitor_game_comment_is_not_attached() {
        let pgn = r#"[Event "Comments"]
{ 12345 nodes before anything } 1. e4 e5 *"#;

        let game = decode(pgn).expect("Should have decoded");
        assert_eq!(game.mainline[0].comment, None);
        assert_eq!(game.notes, ["game comment ignored: '12345 nodes before anything'"]);
    }

    #[test]
    fn test_visitor_variations_are_skipped() {
        let pgn = r#"[Event "Variations"]
1. e4 (1. d4 { 777 } d5) e5 { 888 } *"#;

        let game = decode(pgn).expect("Should have decoded");
        assert_eq!(uci_moves(&game), ["e2e4", "e7e5"]);
        assert_eq!(game.mainline[0].comment, None);
        assert_eq!(game.mainline[1].comment.as_deref(), Some("888"));
        assert_eq!(game.notes, ["1 variation(s) skipped"]);
    }

    #[test]
    fn test_visitor_fen_header_sets_start() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let pgn = format!(
            "[SetUp \"1\"]\n[FEN \"{fen}\"]\n\n1... e5 {{0 45250, Black disconnects}} 2. Nf3 *"
        );

        let game = decode(&pgn).expect("Should have decoded");
        assert_eq!(game.start, StartPosition::Fen(fen.to_string()));
        assert_eq!(game.start_board.turn(), Color::Black);
        assert_eq!(uci_moves(&game), ["e7e5", "g1f3"]);
    }

    #[test]
    fn test_visitor_invalid_fen_is_an_error() {
        let pgn = r#"[FEN "not a fen"]
1. e4 *"#;

        let err = decode(pgn).expect_err("Should have failed");
        assert!(matches!(err, ReplayError::Fen { game: 1, .. }));
    }

    #[test]
    fn test_visitor_illegal_move_truncates_mainline() {
        let pgn = r#"[Event "Illegal"]
1. e4 {100} e5 2. Ke3 {200} Nc6 {300} 3. Nf3 *"#;

        let game = decode(pgn).expect("Should have decoded");
        assert!(game.truncated);
        assert_eq!(uci_moves(&game), ["e2e4", "e7e5"]);
        assert_eq!(game.mainline[0].comment.as_deref(), Some("100"));
        assert_eq!(game.mainline[1].comment, None);
        assert_eq!(game.notes.len(), 1);
        assert!(game.notes[0].starts_with("illegal move Ke3 at ply 3"));
        assert!(game.notes[0].ends_with("rest of mainline ignored"));
    }

    #[test]
    fn test_visitor_truncation_does_not_leak_into_next_game() {
        let pgn = "[Event \"A\"]\n1. e4 e4 *\n\n[Event \"B\"]\n1. d4 {300} d5 *\n";
        let mut reader = Reader::new(pgn.as_bytes());
        let mut visitor = GameVisitor::new();

        let first = reader.read_game(&mut visitor).unwrap().unwrap().unwrap();
        let second = reader.read_game(&mut visitor).unwrap().unwrap().unwrap();

        assert!(first.truncated);
        assert_eq!(uci_moves(&first), ["e2e4"]);
        assert!(!second.truncated);
        assert!(second.notes.is_empty());
        assert_eq!(uci_moves(&second), ["d2d4", "d7d5"]);
        assert_eq!(second.mainline[0].comment.as_deref(), Some("300"));
    }

    #[test]
    fn test_visitor_null_move_passes_the_turn() {
        let pgn = r#"[Event "Null"]
1. e4 {100} -- {150} 2. d4 {200} *"#;

        let game = decode(pgn).expect("Should have decoded");
        assert!(!game.truncated);
        assert_eq!(uci_moves(&game), ["e2e4", "0000", "d2d4"]);
        assert_eq!(game.mainline[1].ply, Ply::Null);
        assert_eq!(game.mainline[1].comment.as_deref(), Some("150"));
    }

    #[test]
    fn test_visitor_long_comment_is_reassembled() {
        let filler = "x".repeat(100_000);
        let pgn = format!("[Event \"Long\"]\n1. e4 {{ {filler} 4096 }} e5 *");

        let game = decode(&pgn).expect("Should have decoded");
        let comment = game.mainline[0].comment.as_deref().unwrap();
        assert_eq!(comment.len(), filler.len() + " 4096".len());
        assert!(comment.starts_with("xxx"));
        assert_eq!(
            extract_node_count(Some(comment)).map(|n| n.to_string()).as_deref(),
            Some("4096")
        );
        assert_eq!(uci_moves(&game), ["e2e4", "e7e5"]);
    }

    #[test]
    fn test_visitor_invalid_utf8_is_decoded_lossily() {
        let pgn: &[u8] = b"[Event \"\xffcrash\"]\n1. e4 {\xff 4096} *";
        let mut reader = Reader::new(pgn);
        let mut visitor = GameVisitor::new();

        let game = reader.read_game(&mut visitor).unwrap().unwrap().unwrap();
        assert_eq!(game.header("Event"), Some("\u{FFFD}crash"));
        let comment = game.mainline[0].comment.as_deref();
        assert_eq!(comment, Some("\u{FFFD} 4096"));
        assert_eq!(
            extract_node_count(comment).and_then(|n| n.to_i64()),
            Some(4096)
        );
    }

    #[test]
    fn test_visitor_duplicate_headers_preserve_first_value() {
        let pgn = r#"[Event "First Event"]
[Event "Second Event"]
1. e4 *"#;

        let game = decode(pgn).expect("Should have decoded");
        assert_eq!(game.header("Event"), Some("First Event"));
        assert_eq!(game.notes, ["duplicate tag Event ignored"]);
    }

    #[test]
    fn test_visitor_castling_uses_standard_notation() {
        let pgn = r#"[Event "Castle"]
1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O *"#;

        let game = decode(pgn).expect("Should have decoded");
        assert_eq!(uci_moves(&game).last().map(String::as_str), Some("e1g1"));
    }

    #[test]
    fn test_visitor_chess960_variant_uses_king_takes_rook() {
        let pgn = r#"[Variant "Chess960"]
1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. O-O *"#;

        let game = decode(pgn).expect("Should have decoded");
        assert_eq!(game.castling_mode, CastlingMode::Chess960);
        assert_eq!(uci_moves(&game).last().map(String::as_str), Some("e1h1"));
    }

    #[test]
    fn test_visitor_counts_games() {
        let pgn = "[Event \"One\"]\n1. e4 *\n\n[Event \"Two\"]\n1. d4 *\n";
        let mut reader = Reader::new(pgn.as_bytes());
        let mut visitor = GameVisitor::new();

        let first = reader.read_game(&mut visitor).unwrap().unwrap().unwrap();
        let second = reader.read_game(&mut visitor).unwrap().unwrap().unwrap();

        assert_eq!(first.index, 1);
        assert_eq!(second.index, 2);
        assert_eq!(second.header("Event"), Some("Two"));
        assert!(reader.read_game(&mut visitor).unwrap().is_none());
    }
}
