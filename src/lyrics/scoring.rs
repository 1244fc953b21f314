//! Fuzzy ranking of Genius search hits.
//!
//! The Genius search endpoint is keyword-based and returns covers,
//! translations and remixes alongside the real page, so candidates are
//! scored against the target track instead of looked up by id. Pure
//! functions only; the Genius adapter owns all network traffic.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lyrics::normalize::remove_extra_info;

// Empirically tuned weights, kept as named constants.
pub const ARTIST_FULL_SCORE: f64 = 8.0;
pub const ARTIST_NEAR_SCORE: f64 = 7.0;
pub const ARTIST_PARTIAL_BASE: f64 = 5.0;
pub const ARTIST_MISSING_PENALTY: f64 = 0.5;
pub const ARTIST_FEATURED_BOOST: f64 = 1.0;
pub const MIN_ARTIST_SCORE: f64 = 3.0;
pub const TITLE_EXACT_SCORE: f64 = 6.0;
pub const TITLE_CONTAINS_SCORE: f64 = 4.0;
pub const TITLE_WEAK_SCORE: f64 = 1.0;
pub const VERSION_AGREEMENT_BONUS: f64 = 2.0;
pub const TITLE_OVERLAP_PENALTY: f64 = 3.0;
pub const ARTIST_OVERLAP_PENALTY: f64 = 5.0;
pub const MIN_ACCEPT_SCORE: f64 = 6.0;

/// Translation/cover page markers; a hit carrying one anywhere in its
/// title, artist or URL is never an acceptable match.
pub const TRANSLATION_KEYWORDS: &[&str] = &[
    "translation",
    "übersetzung",
    "перевод",
    "çeviri",
    "traducción",
    "traduções",
    "traduction",
    "traductions",
    "traduzione",
    "traducciones-al-espanol",
    "fordítás",
    "fordítások",
    "tumaczenie",
    "tłumaczenie",
    "polskie tłumaczenie",
    "magyar fordítás",
    "turkce çeviri",
    "russian translations",
    "deutsche übersetzung",
    "genius users",
    "fan",
    "fans",
    "official translation",
    "genius russian translations",
    "genius deutsche übersetzungen",
    "genius türkçe çeviriler",
    "polskie tłumaczenia genius",
    "genius magyar fordítások",
    "genius traducciones al espanol",
    "genius traduzioni italiane",
    "genius traductions françaises",
    "genius turkce ceviriler",
];

static ARTIST_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i),|&|feat|ft|and").unwrap());
static FEATURED_IN_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\((?:feat\.?|ft\.?|with)\s+([^)]+)\)").unwrap());
static FEATURED_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i),|&|and").unwrap());
static VERSION_KEYWORDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(remix|deluxe|version|edit|live|explicit|remastered|bonus track|bonus|edition|expanded|special edition)\b",
    )
    .unwrap()
});
static NOISE_WORDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(remastered|explicit|deluxe|live|version|edit|remix|radio edit|radio|bonus track|bonus|special edition|expanded|edition|spotify|lyrics|calendar|release|singles|top|annotated|playlist)\b",
    )
    .unwrap()
});
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").unwrap());
static TRAILING_DASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\u{2013}\u{2014}]+$").unwrap());
static MULTI_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SIMPLE_LYRICS_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/[a-z0-9-]+-lyrics$").unwrap());

/// One song hit from the search response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCandidate {
    pub title: String,
    pub artist: String,
    pub url: String,
}

/// Precomputed comparison form of the track we are searching for.
#[derive(Debug, Clone)]
pub struct MatchTarget {
    artist_tokens: HashSet<String>,
    title_norm: String,
    has_version: bool,
    featured_in_title: Vec<String>,
}

impl MatchTarget {
    pub fn new(title: &str, artist: &str) -> Self {
        Self {
            artist_tokens: normalize_artists(artist).into_iter().collect(),
            title_norm: norm_token(&remove_extra_info(title)),
            has_version: has_version_keywords(title),
            featured_in_title: extract_featured_artists(title),
        }
    }

    pub fn has_version(&self) -> bool {
        self.has_version
    }
}

/// Lowercase and drop everything but ASCII alphanumerics.
fn norm_token(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Split a credit string into normalized artist tokens. Separators are the
/// literal substrings `,` `&` `feat` `ft` `and`, matching the search target
/// and the candidate identically so both sides fragment the same way.
fn normalize_artists(artist: &str) -> Vec<String> {
    ARTIST_SPLIT_RE
        .split(&artist.to_lowercase())
        .map(|part| norm_token(part.trim()))
        .filter(|part| !part.is_empty())
        .collect()
}

/// Artists credited inside a `(feat. X)` / `(with X)` title parenthetical.
fn extract_featured_artists(title: &str) -> Vec<String> {
    let Some(cap) = FEATURED_IN_TITLE_RE.captures(title) else {
        return Vec::new();
    };
    FEATURED_SPLIT_RE
        .split(&cap[1])
        .map(|part| norm_token(part.trim()))
        .filter(|part| !part.is_empty())
        .collect()
}

pub fn has_version_keywords(title: &str) -> bool {
    VERSION_KEYWORDS_RE.is_match(title)
}

/// Strip version/noise keywords, bare years and trailing dashes from a title
/// before it is used as search-query text.
pub fn clean_query(title: &str) -> String {
    let cleaned = NOISE_WORDS_RE.replace_all(title, "");
    let cleaned = YEAR_RE.replace_all(&cleaned, "");
    let cleaned = TRAILING_DASH_RE.replace_all(cleaned.trim(), "");
    MULTI_SPACE_RE.replace_all(&cleaned, " ").trim().to_string()
}

fn contains_translation_keyword(s: &str) -> bool {
    let lower = s.to_lowercase();
    TRANSLATION_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn is_translation_page(candidate: &SearchCandidate) -> bool {
    contains_translation_keyword(&candidate.artist)
        || contains_translation_keyword(&candidate.title)
        || contains_translation_keyword(&candidate.url)
}

/// Accept only plain `/<slug>-lyrics` pages; translated or annotated pages
/// live under decorated slugs.
fn is_simple_original_url(url: &str) -> bool {
    let path = url_path(url).to_lowercase();
    if SIMPLE_LYRICS_PATH_RE.is_match(&path) {
        return true;
    }
    let Some(slug) = path.rsplit('/').next() else {
        return false;
    };
    let parts: Vec<&str> = slug.split('-').collect();
    if parts.len() >= 3 && parts.last() == Some(&"lyrics") {
        return !parts
            .iter()
            .any(|part| TRANSLATION_KEYWORDS.iter().any(|k| part.contains(k)));
    }
    false
}

fn url_path(url: &str) -> &str {
    let rest = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    let path_start = rest.find('/').map(|i| &rest[i..]).unwrap_or("/");
    let end = path_start
        .find(['?', '#'])
        .unwrap_or(path_start.len());
    &path_start[..end]
}

/// Score one candidate against the target, or reject it outright.
///
/// Rejections: translation pages, non-original URLs, zero artist-token
/// overlap (hard gate, not just a low score) and an artist score below
/// [`MIN_ARTIST_SCORE`].
pub fn score_candidate(target: &MatchTarget, candidate: &SearchCandidate) -> Option<f64> {
    if is_translation_page(candidate) || !is_simple_original_url(&candidate.url) {
        return None;
    }

    let primary = normalize_artists(&candidate.artist);
    let featured = extract_featured_artists(&candidate.title);
    let candidate_artists: HashSet<String> =
        primary.into_iter().chain(featured).collect();

    let overlap = target
        .artist_tokens
        .iter()
        .filter(|token| candidate_artists.contains(*token))
        .count();
    // Artist match is a hard gate, not just a scoring bonus.
    if overlap == 0 {
        return None;
    }
    let total = target.artist_tokens.len();
    let missing = total.saturating_sub(overlap);

    let mut artist_score = if overlap == total {
        ARTIST_FULL_SCORE
    } else if overlap + 1 >= total {
        ARTIST_NEAR_SCORE
    } else {
        ARTIST_PARTIAL_BASE + overlap as f64 - missing as f64 * ARTIST_MISSING_PENALTY
    };

    // Credit a featured artist named in the target's own title parenthetical
    // that the candidate lists but the target's primary credit omitted.
    for featured_artist in &target.featured_in_title {
        if candidate_artists.contains(featured_artist)
            && !target.artist_tokens.contains(featured_artist)
        {
            artist_score += ARTIST_FEATURED_BOOST;
        }
    }

    if artist_score < MIN_ARTIST_SCORE {
        return None;
    }

    let candidate_title_norm = norm_token(&remove_extra_info(&candidate.title));
    let candidate_has_version = has_version_keywords(&candidate.title);

    let mut title_score = if candidate_title_norm == target.title_norm {
        TITLE_EXACT_SCORE
    } else if candidate_title_norm.contains(&target.title_norm)
        || target.title_norm.contains(&candidate_title_norm)
    {
        TITLE_CONTAINS_SCORE
    } else {
        TITLE_WEAK_SCORE
    };
    if candidate_has_version == target.has_version {
        title_score += VERSION_AGREEMENT_BONUS;
    } else {
        title_score -= VERSION_AGREEMENT_BONUS;
    }

    let mut score = artist_score + title_score;
    if !candidate_title_norm.contains(&target.title_norm) {
        score -= TITLE_OVERLAP_PENALTY;
    }

    Some(score)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub score: f64,
    pub candidate: SearchCandidate,
}

/// Running best/fallback selection across all pages and title variants of
/// one search. The best slot prefers candidates whose version-ness agrees
/// with a versioned target; the fallback slot holds the strongest remaining
/// candidate above [`MIN_ACCEPT_SCORE`].
#[derive(Debug)]
pub struct CandidateTracker {
    target_has_version: bool,
    best: Option<ScoredCandidate>,
    fallback: Option<ScoredCandidate>,
}

impl CandidateTracker {
    pub fn new(target_has_version: bool) -> Self {
        Self {
            target_has_version,
            best: None,
            fallback: None,
        }
    }

    pub fn observe(&mut self, candidate: SearchCandidate, score: f64) {
        let candidate_has_version = has_version_keywords(&candidate.title);
        let best_score = self.best.as_ref().map_or(f64::NEG_INFINITY, |c| c.score);
        let fallback_score = self.fallback.as_ref().map_or(f64::NEG_INFINITY, |c| c.score);

        if score > best_score && (!self.target_has_version || candidate_has_version) {
            self.best = Some(ScoredCandidate { score, candidate });
        } else if score > fallback_score
            && (!candidate_has_version || !self.target_has_version)
            && score >= MIN_ACCEPT_SCORE
        {
            self.fallback = Some(ScoredCandidate { score, candidate });
        }
    }

    /// The winning candidate, if any scored at least [`MIN_ACCEPT_SCORE`].
    pub fn selected(&self) -> Option<&ScoredCandidate> {
        let chosen = self.best.as_ref().or(self.fallback.as_ref())?;
        (chosen.score >= MIN_ACCEPT_SCORE).then_some(chosen)
    }

    /// Drop a candidate whose page turned out to be unusable so the next
    /// selection can fall through to the runner-up.
    pub fn discard(&mut self, url: &str) {
        if self.best.as_ref().is_some_and(|c| c.candidate.url == url) {
            self.best = None;
        }
        if self.fallback.as_ref().is_some_and(|c| c.candidate.url == url) {
            self.fallback = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, artist: &str) -> SearchCandidate {
        let slug: String = format!("{artist} {title}")
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        SearchCandidate {
            title: title.to_string(),
            artist: artist.to_string(),
            url: format!("https://genius.com/{slug}-lyrics"),
        }
    }

    #[test]
    fn exact_match_scores_full_marks() {
        let target = MatchTarget::new("Shape of You", "Ed Sheeran");
        let score = score_candidate(&target, &candidate("Shape of You", "Ed Sheeran")).unwrap();
        assert_eq!(
            score,
            ARTIST_FULL_SCORE + TITLE_EXACT_SCORE + VERSION_AGREEMENT_BONUS
        );
    }

    #[test]
    fn zero_artist_overlap_is_rejected_despite_exact_title() {
        let target = MatchTarget::new("Shape of You", "Ed Sheeran");
        assert!(score_candidate(&target, &candidate("Shape of You", "Somebody Else")).is_none());
    }

    #[test]
    fn translation_keyword_rejects_otherwise_identical_candidate() {
        let target = MatchTarget::new("Shape of You", "Ed Sheeran");
        let clean = candidate("Shape of You", "Ed Sheeran");
        let mut translated = clean.clone();
        translated.title = "Shape of You (Türkçe Çeviri)".to_string();
        assert!(score_candidate(&target, &clean).is_some());
        assert!(score_candidate(&target, &translated).is_none());
    }

    #[test]
    fn non_lyrics_url_is_rejected() {
        let target = MatchTarget::new("Shape of You", "Ed Sheeran");
        let mut cand = candidate("Shape of You", "Ed Sheeran");
        cand.url = "https://genius.com/albums/Ed-sheeran/Divide".to_string();
        assert!(score_candidate(&target, &cand).is_none());
    }

    #[test]
    fn version_mismatch_is_penalized() {
        let target = MatchTarget::new("Shape of You", "Ed Sheeran");
        let plain = score_candidate(&target, &candidate("Shape of You", "Ed Sheeran")).unwrap();
        let remix =
            score_candidate(&target, &candidate("Shape of You Remix", "Ed Sheeran")).unwrap();
        assert!(plain > remix);
    }

    #[test]
    fn featured_artist_in_target_title_boosts_candidate() {
        let target = MatchTarget::new("Song (feat. Guest)", "Main Act");
        let without = score_candidate(&target, &candidate("Song", "Main Act")).unwrap();
        let with = score_candidate(&target, &candidate("Song", "Main Act & Guest")).unwrap();
        assert_eq!(with, without + ARTIST_FEATURED_BOOST);
    }

    #[test]
    fn partial_artist_overlap_still_scores() {
        let target = MatchTarget::new("Duet", "Alice, Bob, Carol");
        let score = score_candidate(&target, &candidate("Duet", "Alice")).unwrap();
        assert!(score >= MIN_ACCEPT_SCORE);
    }

    #[test]
    fn tracker_prefers_version_agreement_for_versioned_target() {
        let target = MatchTarget::new("Song (Live)", "Band");
        let mut tracker = CandidateTracker::new(target.has_version());

        let plain = candidate("Song", "Band");
        let live = candidate("Song Live", "Band");
        let plain_score = score_candidate(&target, &plain).unwrap();
        let live_score = score_candidate(&target, &live).unwrap();

        tracker.observe(plain.clone(), plain_score);
        tracker.observe(live.clone(), live_score);

        assert_eq!(tracker.selected().unwrap().candidate, live);
    }

    #[test]
    fn tracker_rejects_everything_below_threshold() {
        let mut tracker = CandidateTracker::new(false);
        tracker.observe(candidate("Song", "Band"), MIN_ACCEPT_SCORE - 1.0);
        assert!(tracker.selected().is_none());
    }

    #[test]
    fn clean_query_strips_noise_and_years() {
        assert_eq!(clean_query("Song Remastered 2011 -"), "Song");
        assert_eq!(clean_query("Song (Radio Edit)"), "Song ()");
        assert_eq!(clean_query("Plain Song"), "Plain Song");
    }
}
