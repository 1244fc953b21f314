use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::lyrics::providers::{ProviderAdapter, RawLyrics};
use crate::lyrics::types::{http_client, LyricLine, LyricsError, TrackInfo};

pub const NAME: &str = "Spotify";
pub const NOT_FOUND: &str = "No lyrics found for this track from Spotify";
/// Shown when no token has been saved. Part of the user-facing contract.
pub const TOKEN_GUIDANCE: &str = "Spotify lyrics need a user token; set LYRICSPLUS_SPOTIFY_TOKEN. \
A fresh token is required every hour/upon page reload.";
/// Shown on HTTP 401 so an expired token is distinguishable from a miss.
pub const TOKEN_EXPIRED: &str = "Spotify rejected the saved token; refresh it and try again. \
Spotify requires a fresh token every hour/upon page reload.";

const LINE_SYNCED: &str = "LINE_SYNCED";

/// Spotify's internal color-lyrics endpoint. Needs both a manually supplied
/// bearer token and the 22-character track id scraped from the host page.
pub struct Spotify {
    token: Option<String>,
}

impl Spotify {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SpotifyLyrics {
    #[serde(rename = "syncType", default)]
    pub sync_type: String,
    #[serde(default)]
    pub lines: Vec<SpotifyLine>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SpotifyLine {
    /// Millisecond offset; the API serializes it as a decimal string.
    #[serde(rename = "startTimeMs", default, deserialize_with = "millis_from_any")]
    pub start_time_ms: u64,
    #[serde(default)]
    pub words: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ColorLyricsResponse {
    lyrics: Option<SpotifyLyrics>,
}

fn millis_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s.parse().unwrap_or(0),
        Value::Number(n) => n.as_u64().unwrap_or(0),
        _ => 0,
    })
}

fn synced_from(body: &SpotifyLyrics) -> Option<Vec<LyricLine>> {
    if body.sync_type != LINE_SYNCED {
        return None;
    }
    Some(
        body.lines
            .iter()
            .map(|line| LyricLine::synced(line.start_time_ms, line.words.clone()))
            .collect(),
    )
}

fn unsynced_from(body: &SpotifyLyrics) -> Option<Vec<LyricLine>> {
    if body.sync_type == LINE_SYNCED {
        return None;
    }
    Some(
        body.lines
            .iter()
            .map(|line| LyricLine::unsynced(line.words.clone()))
            .collect(),
    )
}

#[async_trait]
impl ProviderAdapter for Spotify {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn find_lyrics(&self, track: &TrackInfo) -> Result<RawLyrics, LyricsError> {
        let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) else {
            return Err(LyricsError::TokenRequired(TOKEN_GUIDANCE));
        };
        let Some(track_id) = track.track_id.as_deref() else {
            return Err(LyricsError::NoLyrics(NOT_FOUND));
        };

        let url = format!(
            "https://spclient.wg.spotify.com/color-lyrics/v2/track/{track_id}?format=json&vocalRemoval=false&market=from_token"
        );
        let resp = http_client()
            .get(&url)
            .header("app-platform", "WebPlayer")
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(provider = NAME, error = %e, "request failed");
                LyricsError::NoLyrics(NOT_FOUND)
            })?;

        match resp.status().as_u16() {
            401 => return Err(LyricsError::TokenRejected(TOKEN_EXPIRED)),
            status if !(200..300).contains(&status) => {
                tracing::debug!(provider = NAME, status, "non-success response");
                return Err(LyricsError::NoLyrics(NOT_FOUND));
            }
            _ => {}
        }

        let body: ColorLyricsResponse = resp.json().await.map_err(|e| {
            tracing::debug!(provider = NAME, error = %e, "bad response body");
            LyricsError::NoLyrics(NOT_FOUND)
        })?;
        match body.lyrics {
            Some(lyrics) if !lyrics.lines.is_empty() => Ok(RawLyrics::Spotify(lyrics)),
            _ => Err(LyricsError::NoLyrics(NOT_FOUND)),
        }
    }

    fn synced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>> {
        match raw {
            RawLyrics::Spotify(body) => synced_from(body),
            _ => None,
        }
    }

    fn unsynced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>> {
        match raw {
            RawLyrics::Spotify(body) => unsynced_from(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_synced_body() -> SpotifyLyrics {
        serde_json::from_str(
            r#"{
                "syncType": "LINE_SYNCED",
                "lines": [
                    {"startTimeMs": "1230", "words": "first"},
                    {"startTimeMs": "4560", "words": "second"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn line_synced_body_maps_to_synced_lines() {
        let body = line_synced_body();
        assert_eq!(
            synced_from(&body).unwrap(),
            vec![
                LyricLine::synced(1_230, "first"),
                LyricLine::synced(4_560, "second"),
            ]
        );
        assert!(unsynced_from(&body).is_none());
    }

    #[test]
    fn other_sync_types_map_to_unsynced_lines() {
        let body = SpotifyLyrics {
            sync_type: "UNSYNCED".into(),
            lines: vec![SpotifyLine {
                start_time_ms: 0,
                words: "la la".into(),
            }],
        };
        assert!(synced_from(&body).is_none());
        assert_eq!(
            unsynced_from(&body).unwrap(),
            vec![LyricLine::unsynced("la la")]
        );
    }

    #[test]
    fn numeric_start_time_is_accepted_too() {
        let line: SpotifyLine =
            serde_json::from_str(r#"{"startTimeMs": 987, "words": "x"}"#).unwrap();
        assert_eq!(line.start_time_ms, 987);
    }

    #[tokio::test]
    async fn missing_token_fails_with_guidance_before_any_request() {
        let provider = Spotify::new(None);
        let track = TrackInfo {
            track_id: Some("a".repeat(22)),
            ..TrackInfo::default()
        };
        let err = provider.find_lyrics(&track).await.unwrap_err();
        assert_eq!(err.to_string(), TOKEN_GUIDANCE);
    }

    #[tokio::test]
    async fn missing_track_id_disables_the_provider() {
        let provider = Spotify::new(Some("token".into()));
        let err = provider.find_lyrics(&TrackInfo::default()).await.unwrap_err();
        assert_eq!(err.to_string(), NOT_FOUND);
    }
}
