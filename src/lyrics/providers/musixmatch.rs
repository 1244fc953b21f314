use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::lyrics::providers::{ProviderAdapter, RawLyrics, INSTRUMENTAL_PLACEHOLDER};
use crate::lyrics::types::{http_client, LyricLine, LyricsError, TrackInfo};

pub const NAME: &str = "Musixmatch";
pub const NOT_FOUND: &str = "No lyrics found for this track from Musixmatch";
/// Shown when no token has been saved. Part of the user-facing contract.
pub const TOKEN_GUIDANCE: &str =
    "Musixmatch lyrics need a user token; set LYRICSPLUS_MUSIXMATCH_TOKEN.";

const API_BASE: &str = "https://apic-desktop.musixmatch.com/ws/1.1";
const APP_ID: &str = "web-desktop-app-v1.0";

// Musixmatch subtitle bodies use their own tag dialect: a single leading tag
// per line and either `.` or `,` as the fraction separator.
static SUBTITLE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{1,2}):(\d{2})([.,]\d{1,3})?\]").unwrap());

/// Token-gated two-step lookup: resolve an internal track id via the matcher
/// endpoint, then fetch synced subtitles with a plain-lyrics fallback.
pub struct Musixmatch {
    token: Option<String>,
}

impl Musixmatch {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

/// Line sets extracted during the fetch; millisecond times stay fractional
/// until the getter rounds them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MusixmatchLyrics {
    pub synced: Option<Vec<MusixmatchLine>>,
    pub unsynced: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MusixmatchLine {
    pub time_ms: f64,
    pub text: String,
}

/// Parse a subtitle body in Musixmatch's tag dialect. An empty text line
/// becomes a musical-note placeholder instead of a dead blank line.
pub(crate) fn parse_subtitle_body(body: &str) -> Vec<MusixmatchLine> {
    let mut lines = Vec::new();
    for line in body.lines() {
        let Some(cap) = SUBTITLE_TAG_RE.captures(line) else {
            continue;
        };
        let min: f64 = cap[1].parse().unwrap_or(0.0);
        let sec: f64 = cap[2].parse().unwrap_or(0.0);
        let frac: f64 = cap
            .get(3)
            .map(|m| m.as_str().replace(',', ".").parse().unwrap_or(0.0))
            .unwrap_or(0.0);
        let time_ms = (min * 60.0 + sec + frac) * 1000.0;

        let text = SUBTITLE_TAG_RE.replace_all(line, "").trim().to_string();
        lines.push(MusixmatchLine {
            time_ms,
            text: if text.is_empty() { "♪".to_string() } else { text },
        });
    }
    lines
}

async fn get_json(url: &str) -> Result<Value, LyricsError> {
    let resp = http_client()
        .get(url)
        .header("referer", "https://www.musixmatch.com/")
        .header("cache-control", "no-store")
        .send()
        .await
        .map_err(|e| {
            tracing::debug!(provider = NAME, error = %e, "request failed");
            LyricsError::NoLyrics(NOT_FOUND)
        })?;
    if !resp.status().is_success() {
        tracing::debug!(provider = NAME, status = %resp.status(), "non-success response");
        return Err(LyricsError::NoLyrics(NOT_FOUND));
    }
    resp.json().await.map_err(|e| {
        tracing::debug!(provider = NAME, error = %e, "bad response body");
        LyricsError::NoLyrics(NOT_FOUND)
    })
}

async fn fetch_lyrics(token: &str, track: &TrackInfo) -> Result<MusixmatchLyrics, LyricsError> {
    // Step 1: fuzzy-resolve the track to Musixmatch's internal id.
    let matcher_url = format!(
        "{API_BASE}/matcher.track.get?q_track={}&q_artist={}&format=json&usertoken={}&app_id={APP_ID}",
        urlencoding::encode(&track.title),
        urlencoding::encode(&track.artist),
        urlencoding::encode(token),
    );
    let matcher = get_json(&matcher_url).await?;
    let Some(resolved) = matcher.pointer("/message/body/track") else {
        return Err(LyricsError::NoLyrics(NOT_FOUND));
    };

    if resolved
        .get("instrumental")
        .and_then(Value::as_i64)
        .unwrap_or(0)
        != 0
    {
        return Ok(MusixmatchLyrics {
            synced: Some(vec![MusixmatchLine {
                time_ms: 0.0,
                text: INSTRUMENTAL_PLACEHOLDER.to_string(),
            }]),
            unsynced: None,
        });
    }

    let Some(track_id) = resolved.get("track_id").and_then(Value::as_i64) else {
        return Err(LyricsError::NoLyrics(NOT_FOUND));
    };

    // Step 2: synced subtitles by track id.
    let subtitle_url = format!(
        "{API_BASE}/track.subtitles.get?track_id={track_id}&format=json&app_id={APP_ID}&usertoken={}",
        urlencoding::encode(token),
    );
    if let Ok(subtitles) = get_json(&subtitle_url).await
        && let Some(body) = subtitles
            .pointer("/message/body/subtitle_list/0/subtitle/subtitle_body")
            .and_then(Value::as_str)
    {
        let synced = parse_subtitle_body(body);
        if !synced.is_empty() {
            return Ok(MusixmatchLyrics {
                synced: Some(synced),
                unsynced: None,
            });
        }
    }

    // Step 3: plain-lyrics fallback by the same id.
    let lyrics_url = format!(
        "{API_BASE}/track.lyrics.get?track_id={track_id}&format=json&app_id={APP_ID}&usertoken={}",
        urlencoding::encode(token),
    );
    let lyrics = get_json(&lyrics_url).await?;
    let Some(body) = lyrics
        .pointer("/message/body/lyrics/lyrics_body")
        .and_then(Value::as_str)
    else {
        return Err(LyricsError::NoLyrics(NOT_FOUND));
    };
    Ok(MusixmatchLyrics {
        synced: None,
        unsynced: Some(body.lines().map(str::to_string).collect()),
    })
}

fn synced_from(body: &MusixmatchLyrics) -> Option<Vec<LyricLine>> {
    let lines = body.synced.as_ref()?;
    Some(
        lines
            .iter()
            .map(|line| LyricLine::synced(line.time_ms.round() as u64, line.text.clone()))
            .collect(),
    )
}

fn unsynced_from(body: &MusixmatchLyrics) -> Option<Vec<LyricLine>> {
    let lines = body.unsynced.as_ref()?;
    Some(lines.iter().map(LyricLine::unsynced).collect())
}

#[async_trait]
impl ProviderAdapter for Musixmatch {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn find_lyrics(&self, track: &TrackInfo) -> Result<RawLyrics, LyricsError> {
        let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) else {
            return Err(LyricsError::TokenRequired(TOKEN_GUIDANCE));
        };
        fetch_lyrics(token, track).await.map(RawLyrics::Musixmatch)
    }

    fn synced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>> {
        match raw {
            RawLyrics::Musixmatch(body) => synced_from(body),
            _ => None,
        }
    }

    fn unsynced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>> {
        match raw {
            RawLyrics::Musixmatch(body) => unsynced_from(body),
            _ => None,
        }
    }
}
