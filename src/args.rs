use super::error::ReplayError;

use shakmaty::Color;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayArgs {
    pub path: PathBuf,
    pub side: Color,
}

pub fn parse_side(token: &str) -> Option<Color> {
    if token.eq_ignore_ascii_case("white") {
        Some(Color::White)
    } else if token.eq_ignore_ascii_case("black") {
        Some(Color::Black)
    } else {
        None
    }
}

/// Accept `<pgn> <color>` in either order.
///
/// When both arguments are colors the first one wins and the second is
/// taken as the path.
pub fn normalize_args<S: AsRef<str>>(args: &[S]) -> Result<ReplayArgs, ReplayError> {
    let [first, second] = args else {
        return Err(ReplayError::Usage);
    };
    let (first, second) = (first.as_ref(), second.as_ref());

    if let Some(side) = parse_side(first) {
        return Ok(ReplayArgs {
            path: PathBuf::from(second),
            side,
        });
    }

    if let Some(side) = parse_side(second) {
        return Ok(ReplayArgs {
            path: PathBuf::from(first),
            side,
        });
    }

    Err(ReplayError::MissingColor)
}
