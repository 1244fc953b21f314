use std::collections::HashSet;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;

use crate::lyrics::normalize::{remove_extra_info, remove_song_feat};
use crate::lyrics::providers::{ProviderAdapter, RawLyrics};
use crate::lyrics::scoring::{clean_query, score_candidate, CandidateTracker, MatchTarget, SearchCandidate};
use crate::lyrics::types::{http_client, LyricLine, LyricsError, TrackInfo};

pub const NAME: &str = "Genius";
pub const NOT_FOUND: &str = "No lyrics found for this track from Genius";

/// Result pages per search query and pages tried per title variant. With up
/// to 4 variants this bounds the search at 20 requests per track.
const RESULTS_PER_PAGE: u32 = 5;
const MAX_PAGES: u32 = 5;

/// Marker substring of the lyric-bearing containers on a Genius song page.
const CONTAINER_CLASS: &str = "Lyrics__Container";
/// Sub-regions skipped while walking a container.
const EXCLUDED_CLASS_PARTS: &[&str] = &["header", "readmore", "annotation", "credit", "footer"];

/// Placeholder texts Genius serves on pages without a transcription; a
/// single-line extraction matching one is "no lyrics", not a hit.
static NOT_TRANSCRIBED_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)lyrics for this song have yet to be transcribed",
        r"(?i)we do not have the lyrics for",
        r"(?i)be the first to add the lyrics",
        r"(?i)please check back once the song has been released",
        r"(?i)add lyrics on genius",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SECTION_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[.*\]$").unwrap());
static MULTI_NEWLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
static DIV_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div").unwrap());

/// Free-text search plus HTML scrape; Genius has no direct lookup API and
/// never provides timing data, so this provider is unsynced-only.
pub struct Genius;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeniusLyrics {
    pub plain: String,
}

/// Title variants searched in order: raw, extra-info-stripped, feat-stripped,
/// both-stripped, deduplicated.
fn title_variants(title: &str) -> Vec<String> {
    let mut variants = Vec::new();
    for candidate in [
        title.to_string(),
        remove_extra_info(title),
        remove_song_feat(title),
        remove_song_feat(&remove_extra_info(title)),
    ] {
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

fn candidates_from_search(json: &Value) -> Vec<SearchCandidate> {
    let Some(sections) = json.pointer("/response/sections").and_then(Value::as_array) else {
        return Vec::new();
    };
    sections
        .iter()
        .filter_map(|section| section.get("hits").and_then(Value::as_array))
        .flatten()
        .filter(|hit| hit.get("type").and_then(Value::as_str) == Some("song"))
        .filter_map(|hit| {
            let result = hit.get("result")?;
            Some(SearchCandidate {
                title: result.get("title").and_then(Value::as_str)?.to_string(),
                artist: result
                    .pointer("/primary_artist/name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                url: result.get("url").and_then(Value::as_str)?.to_string(),
            })
        })
        .collect()
}

/// Pull lyric text out of a song page: every `div` whose class list contains
/// the container marker is walked, skipping excluded sub-regions, turning
/// `<br>` into newlines and dropping remaining markup.
pub(crate) fn extract_plain_lyrics(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let mut text = String::new();
    for element in doc.select(&DIV_SELECTOR) {
        if !element
            .value()
            .classes()
            .any(|class| class.contains(CONTAINER_CLASS))
        {
            continue;
        }
        walk_container(element, &mut text);
        text.push('\n');
    }
    let collapsed = MULTI_NEWLINE_RE.replace_all(&text, "\n").trim().to_string();
    (!collapsed.is_empty()).then_some(collapsed)
}

fn walk_container(element: ElementRef, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if el.name() == "br" {
                    out.push('\n');
                    continue;
                }
                let excluded = el.classes().any(|class| {
                    let class = class.to_lowercase();
                    EXCLUDED_CLASS_PARTS.iter().any(|part| class.contains(part))
                });
                if excluded {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    walk_container(child_ref, out);
                    if matches!(el.name(), "div" | "p" | "section") {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Scraped text to unsynced lines: trim, drop empties and pure `[Section]`
/// headers, and treat a lone not-yet-transcribed boilerplate line as "no
/// lyrics" rather than a false positive.
pub(crate) fn plain_to_lines(plain: &str) -> Option<Vec<LyricLine>> {
    let lines: Vec<LyricLine> = plain
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !SECTION_HEADER_RE.is_match(line))
        .map(LyricLine::unsynced)
        .collect();
    if lines.is_empty() {
        return None;
    }
    if lines.len() == 1 && NOT_TRANSCRIBED_RES.iter().any(|re| re.is_match(&lines[0].text)) {
        return None;
    }
    Some(lines)
}

async fn search_page(artist: &str, title: &str, page: u32) -> Option<Vec<SearchCandidate>> {
    let query = format!("{artist} {title}");
    let url = format!(
        "https://genius.com/api/search/multi?per_page={RESULTS_PER_PAGE}&page={page}&q={}",
        urlencoding::encode(&query),
    );
    let resp = http_client()
        .get(&url)
        .header("Accept", "application/json")
        .send()
        .await
        .ok()?;
    if !resp.status().is_success() {
        tracing::debug!(provider = NAME, status = %resp.status(), "search failed");
        return None;
    }
    let json: Value = resp.json().await.ok()?;
    Some(candidates_from_search(&json))
}

async fn fetch_song_page(url: &str) -> Option<String> {
    let resp = http_client()
        .get(url)
        .header("Accept", "text/html")
        .send()
        .await
        .ok()?;
    if !resp.status().is_success() {
        return None;
    }
    resp.text().await.ok()
}

async fn fetch_genius_lyrics(track: &TrackInfo) -> Result<GeniusLyrics, LyricsError> {
    let target = MatchTarget::new(&track.title, &track.artist);
    let mut tracker = CandidateTracker::new(target.has_version());
    let mut attempted_urls: HashSet<String> = HashSet::new();

    for variant in title_variants(&track.title) {
        let cleaned = clean_query(&variant);
        for page in 1..=MAX_PAGES {
            let Some(candidates) = search_page(&track.artist, &cleaned, page).await else {
                continue;
            };
            for candidate in candidates {
                if attempted_urls.contains(&candidate.url) {
                    continue;
                }
                if let Some(score) = score_candidate(&target, &candidate) {
                    tracker.observe(candidate, score);
                }
            }

            let Some(selected) = tracker.selected() else {
                continue;
            };
            let url = selected.candidate.url.clone();
            tracing::debug!(provider = NAME, %url, score = selected.score, "candidate selected");
            attempted_urls.insert(url.clone());

            let Some(html) = fetch_song_page(&url).await else {
                tracker.discard(&url);
                continue;
            };
            match extract_plain_lyrics(&html) {
                Some(plain) => return Ok(GeniusLyrics { plain }),
                None => tracker.discard(&url),
            }
        }
    }

    Err(LyricsError::NoLyrics(NOT_FOUND))
}

#[async_trait]
impl ProviderAdapter for Genius {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn find_lyrics(&self, track: &TrackInfo) -> Result<RawLyrics, LyricsError> {
        fetch_genius_lyrics(track).await.map(RawLyrics::Genius)
    }

    fn synced_lines(&self, _raw: &RawLyrics) -> Option<Vec<LyricLine>> {
        None
    }

    fn unsynced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>> {
        match raw {
            RawLyrics::Genius(body) => plain_to_lines(&body.plain),
            _ => None,
        }
    }
}
