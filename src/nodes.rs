use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static SIGNED_INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?[0-9]+").expect("valid signed integer regex"));

/// A node budget in canonical decimal form: no leading zeros, no `-0`.
///
/// Kept as text so budgets beyond any fixed-width integer are echoed
/// unchanged to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCount(String);

impl NodeCount {
    fn from_token(token: &str) -> Self {
        let (negative, digits) = match token.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, token),
        };

        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            Self("0".to_string())
        } else if negative {
            Self(format!("-{digits}"))
        } else {
            Self(digits.to_string())
        }
    }

    #[cfg(test)]
    pub(crate) fn to_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for NodeCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pull the search-node budget out of a move comment.
///
/// Annotation formats differ between engines and GUIs
/// (`"+0.54 16/0 1014 958275"`, `"0 45250, Black disconnects"`), so the
/// budget is taken to be the last integer in the comment once `/` and `,`
/// are turned into spaces. Book moves never carry a budget.
pub fn extract_node_count(comment: Option<&str>) -> Option<NodeCount> {
    let comment = comment?;
    if comment.is_empty() || comment.to_lowercase().contains("book") {
        return None;
    }

    let cleaned = comment.replace(['/', ','], " ");
    let last = SIGNED_INTEGER_RE.find_iter(&cleaned).last()?;
    Some(NodeCount::from_token(last.as_str()))
}
