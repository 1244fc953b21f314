//! Title/artist normalization for query construction and comparison.
//!
//! Pure string functions, no I/O. Providers compose them as
//! `normalize` -> `remove_song_feat` -> `remove_extra_info` so that featured
//! credits are stripped before parenthetical text in case they overlap.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static TYPOGRAPHIC_QUOTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{2013}\u{2018}-\u{201F}]").unwrap());
static CJK_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{3000}-\u{303F}]").unwrap());
static DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-\.&!']").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());
static EXTRA_INFO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(.*?\)|\[.*?\]|\{.*?\}").unwrap());
static FEAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:feat\.?|ft\.?|featuring)\s+[^\-\u{2013}\u{2014}]+").unwrap());

/// Clean a scraped title/artist string: NFKC composition, typographic quotes
/// mapped to a straight quote, CJK punctuation stripped, anything outside
/// `[word, whitespace, -, ., &, !, ']` dropped, whitespace collapsed.
pub fn normalize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let composed: String = s.nfkc().collect();
    let quoted = TYPOGRAPHIC_QUOTES_RE.replace_all(&composed, "'");
    let no_cjk = CJK_PUNCT_RE.replace_all(&quoted, "");
    let filtered = DISALLOWED_RE.replace_all(&no_cjk, "");
    WHITESPACE_RE.replace_all(&filtered, " ").trim().to_string()
}

/// Strip parenthesized/bracketed/braced annotations ("(Remastered) [2011]").
/// Non-recursive: each construct type matches its first closing delimiter.
pub fn remove_extra_info(s: &str) -> String {
    EXTRA_INFO_RE.replace_all(s, "").trim().to_string()
}

/// Strip a trailing `feat./ft./featuring <names>` clause, stopping short of
/// a dash-separated suffix so "Song feat. X - Live" keeps "- Live".
pub fn remove_song_feat(s: &str) -> String {
    FEAT_RE.replace(s, "").trim().to_string()
}

/// Full cleaning chain used when building search queries.
pub fn query_clean(s: &str) -> String {
    remove_extra_info(&remove_song_feat(&normalize(s)))
}
