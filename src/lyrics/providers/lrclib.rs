use async_trait::async_trait;
use serde::Deserialize;

use crate::lyrics::parse::parse_time_tagged;
use crate::lyrics::providers::{ProviderAdapter, RawLyrics, INSTRUMENTAL_PLACEHOLDER};
use crate::lyrics::types::{http_client, LyricLine, LyricsError, TrackInfo};

pub const NAME: &str = "LRCLIB";
pub const NOT_FOUND: &str = "No lyrics found for this track from LRCLIB";

/// Community lyrics lookup by exact artist/track, with album and duration as
/// optional disambiguators.
pub struct Lrclib;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LrclibResponse {
    #[serde(default)]
    pub instrumental: bool,
    #[serde(default)]
    pub synced_lyrics: Option<String>,
    #[serde(default)]
    pub plain_lyrics: Option<String>,
}

impl LrclibResponse {
    fn has_lyrics_fields(&self) -> bool {
        self.synced_lyrics.is_some() || self.plain_lyrics.is_some()
    }
}

/// Build the lookup URL. Duration is only a useful disambiguator above ten
/// seconds; shorter (or unknown) durations are omitted.
fn build_url(track: &TrackInfo, without_album: bool) -> String {
    let mut params = vec![
        format!("artist_name={}", urlencoding::encode(&track.artist)),
        format!("track_name={}", urlencoding::encode(&track.title)),
    ];
    if !track.album.is_empty() && !without_album {
        params.push(format!("album_name={}", urlencoding::encode(&track.album)));
    }
    if track.duration >= 10_000 {
        params.push(format!("duration={}", track.duration / 1000));
    }
    format!("https://lrclib.net/api/get?{}", params.join("&"))
}

async fn fetch(track: &TrackInfo, without_album: bool) -> Option<LrclibResponse> {
    let url = build_url(track, without_album);
    let resp = match http_client()
        .get(&url)
        .header("x-user-agent", "lyricsplus")
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            tracing::debug!(provider = NAME, error = %e, "request failed");
            return None;
        }
    };
    if !resp.status().is_success() {
        tracing::debug!(provider = NAME, status = %resp.status(), "non-success response");
        return None;
    }
    match resp.json::<LrclibResponse>().await {
        Ok(body) => Some(body),
        Err(e) => {
            tracing::debug!(provider = NAME, error = %e, "bad response body");
            None
        }
    }
}

fn synced_from(body: &LrclibResponse) -> Option<Vec<LyricLine>> {
    if body.instrumental {
        return Some(vec![LyricLine::synced(0, INSTRUMENTAL_PLACEHOLDER)]);
    }
    let raw = body.synced_lyrics.as_deref()?;
    parse_time_tagged(raw).synced
}

fn unsynced_from(body: &LrclibResponse) -> Option<Vec<LyricLine>> {
    if body.instrumental {
        return Some(vec![LyricLine::unsynced(INSTRUMENTAL_PLACEHOLDER)]);
    }
    let raw = body.plain_lyrics.as_deref()?;
    parse_time_tagged(raw).unsynced
}

#[async_trait]
impl ProviderAdapter for Lrclib {
    fn name(&self) -> &'static str {
        NAME
    }

    /// One broadened retry without the album parameter when the primary
    /// query yields no usable fields; never more than two requests.
    async fn find_lyrics(&self, track: &TrackInfo) -> Result<RawLyrics, LyricsError> {
        let mut body = fetch(track, false).await;
        if body.as_ref().is_none_or(|b| !b.has_lyrics_fields()) {
            body = fetch(track, true).await;
        }
        match body {
            Some(body) => Ok(RawLyrics::Lrclib(body)),
            None => Err(LyricsError::NoLyrics(NOT_FOUND)),
        }
    }

    fn synced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>> {
        match raw {
            RawLyrics::Lrclib(body) => synced_from(body),
            _ => None,
        }
    }

    fn unsynced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>> {
        match raw {
            RawLyrics::Lrclib(body) => unsynced_from(body),
            _ => None,
        }
    }
}
