use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Canonical form of a source string used as the cross-document equality key:
/// tags stripped, whitespace collapsed, trimmed, lower-cased.
pub fn normalize(s: &str) -> String {
    let stripped = TAG.replace_all(s, "");
    let collapsed = WS.replace_all(&stripped, " ");
    collapsed.trim().to_lowercase()
}
