pub mod genius;
pub mod kpoe;
pub mod lrclib;
pub mod musixmatch;
pub mod spotify;

use async_trait::async_trait;

pub use genius::{Genius, GeniusLyrics};
pub use kpoe::{Kpoe, KpoeLyrics};
pub use lrclib::{Lrclib, LrclibResponse};
pub use musixmatch::{Musixmatch, MusixmatchLyrics};
pub use spotify::{Spotify, SpotifyLyrics};

use crate::lyrics::types::{LyricLine, LyricsError, TrackInfo};

/// Placeholder line used for tracks flagged instrumental by a provider.
pub const INSTRUMENTAL_PLACEHOLDER: &str = "♪ Instrumental ♪";

/// Manually supplied bearer tokens for the token-gated providers. Absence is
/// a normal precondition-failure case, not an error at construction time.
#[derive(Debug, Clone, Default)]
pub struct ProviderTokens {
    pub spotify: Option<String>,
    pub musixmatch: Option<String>,
}

/// Provider-native response, converted eagerly at the adapter boundary and
/// opaque to the resolution engine. One variant per provider identity.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLyrics {
    Lrclib(LrclibResponse),
    Spotify(SpotifyLyrics),
    Kpoe(KpoeLyrics),
    Musixmatch(MusixmatchLyrics),
    Genius(GeniusLyrics),
}

/// One external lyrics source: a single-attempt fetch plus two getters that
/// read the fetched response. Failures come back as `Err` values (never
/// panics), and the getters are never invoked on an error result.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn find_lyrics(&self, track: &TrackInfo) -> Result<RawLyrics, LyricsError>;

    /// Time-tagged lines, or `None` when this response has no synced form.
    fn synced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>>;

    /// Plain lines, or `None` when this response has no unsynced form.
    fn unsynced_lines(&self, raw: &RawLyrics) -> Option<Vec<LyricLine>>;
}
