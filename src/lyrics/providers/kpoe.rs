use async_trait::async_trait;
use serde::Deserialize;

use crate::lyrics::normalize::normalize;
use crate::lyrics::providers::{ProviderAdapter, RawLyrics};
use crate::lyrics::types::{http_client, LyricLine, LyricsError, TrackInfo};

pub const NAME: &str = "KPoe";
pub const NOT_FOUND: &str = "No lyrics found for this track from KPoe";

/// Community aggregator queried by normalized title/artist/album/duration.
/// `force_reload` bypasses the service's HTTP cache.
#[derive(Default)]
pub struct Kpoe {
    source_order: Option<String>,
    force_reload: bool,
}

impl Kpoe {
    pub fn new(source_order: Option<String>, force_reload: bool) -> Self {
        Self {
            source_order,
            force_reload,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct KpoeResponse {
    #[serde(default)]
    lyrics: Vec<KpoeRawLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct KpoeRawLine {
    /// Start offset in milliseconds.
    #[serde(default)]
    time: f64,
    /// Length in milliseconds.
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    text: String,
}

/// Adapter-normalized line set; offsets converted to seconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpoeLyrics {
    pub lines: Vec<KpoeLine>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpoeLine {
    pub text: String,
    pub start_time: f64,
    pub duration: f64,
    pub end_time: f64,
}

fn build_url(provider: &Kpoe, track: &TrackInfo) -> String {
    let title = normalize(&track.title);
    let artist = normalize(&track.artist);
    let album = normalize(&track.album);

    let mut url = format!(
        "https://lyricsplus.prjktla.workers.dev/v2/lyrics/get?title={}&artist={}",
        urlencoding::encode(&title),
        urlencoding::encode(&artist),
    );
    if !album.is_empty() && album != title {
        url.push_str(&format!("&album={}", urlencoding::encode(&album)));
    }
    url.push_str(&format!("&duration={}", track.duration / 1000));
    if let Some(source) = provider.source_order.as_deref().filter(|s| !s.is_empty()) {
        url.push_str(&format!("&source={}", urlencoding::encode(source)));
    }
    if provider.force_reload {
        url.push_str("&forceReload=true");
    }
    url
}

fn convert(response: KpoeResponse) -> KpoeLyrics {
    KpoeLyrics {
        lines: response
            .lyrics
            .into_iter()
            .map(|line| KpoeLine {
                text: line.text,
                start_time: line.time / 1000.0,
                duration: line.duration / 1000.0,
                end_time: (line.time + line.duration) / 1000.0,
            })
            .collect(),
    }
}

fn synced_from(body: &KpoeLyrics) -> Option<Vec<LyricLine>> {
    Some(
        body.lines
            .iter()
            .map(|line| {
                LyricLine::synced((line.start_time * 1000.0).round() as u64, line.text.clone())
            })
            .collect(),
    )
}

fn unsynced_from(body: &KpoeLyrics) -> Option<Vec<LyricLine>> {
    Some(
        body.lines
            .iter()
            .map(|line| LyricLine::unsynced(line.text.clone()))
            .collect(),
    )
}

#[async_trait]
impl ProviderAdapter for Kpoe {
    fn name(&self) -> &'static str {
        NAME
    }

    /// Single attempt; a missing or empty `lyrics` array is a hard failure.
    async fn find_lyrics(&self, track: &TrackInfo) -> Result<RawLyrics, LyricsError> {
        let url = build_url(self, track);
        let mut request = http_client().get(&url);
        if self.force_reload {
            request = request.header("Cache-Control", "no-store");
        }
        let resp = request.send().await.map_err(|e| {
            tracing::debug!(provider = NAME, error = %e, "request failed");
            LyricsError::NoLyrics(NOT_FOUND)
        })?;
        if !resp.status().is_success() {
            tracing::debug!(provider = NAME, status = %resp.status(), "non-success response");
            return Err(LyricsError::NoLyrics(NOT_FOUND));
        }
        let body: KpoeResponse = resp.json().await.map_err(|e| {
            tracing::debug!(provider = NAME, error = %e, "bad response body");
            LyricsError::NoLyrics(NOT_FOUND)
        })?;
        if body.lyrics.is_empty() {
            return Err(LyricsError::NoLyrics(NOT_FOUND));
        }
        Ok(RawLyrics::Kpoe(convert(body)))
    }

    fn synced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>> {
        match raw {
            RawLyrics::Kpoe(body) => synced_from(body),
            _ => None,
        }
    }

    fn unsynced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>> {
        match raw {
            RawLyrics::Kpoe(body) => unsynced_from(body),
            _ => None,
        }
    }
}
