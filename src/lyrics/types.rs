use once_cell::sync::Lazy;
use reqwest::Client;
use thiserror::Error;

// Shared HTTP client with reasonable defaults for timeouts
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent("lyricsplus/0.1")
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .expect("failed to build HTTP client")
});

/// Identity of the track being looked up, as supplied by the host player.
///
/// `title`/`artist`/`album` are raw display strings and may carry
/// soundtrack/live/remix annotations; providers normalize them as needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Duration in milliseconds, 0 when unknown.
    pub duration: u64,
    /// Provider-native 22-character track id, when the host page exposes one.
    /// Only the Spotify provider needs it; absence disables that provider.
    pub track_id: Option<String>,
}

impl TrackInfo {
    /// Session-local track key. Changes exactly when the displayed title or
    /// artist text changes, so it doubles as the "is this a new track" key.
    pub fn id(&self) -> String {
        format!("{}-{}", self.title, self.artist)
    }
}

/// One printable unit of lyrics. `time` is milliseconds from track start and
/// is present only on synced lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricLine {
    pub time: Option<u64>,
    pub text: String,
}

impl LyricLine {
    pub fn synced(time: u64, text: impl Into<String>) -> Self {
        Self {
            time: Some(time),
            text: text.into(),
        }
    }

    pub fn unsynced(text: impl Into<String>) -> Self {
        Self {
            time: None,
            text: text.into(),
        }
    }
}

/// Normalized outcome of a provider query. A successful result has at least
/// one of `synced`/`unsynced` non-empty; callers treat an all-empty result
/// the same as `error` for fallback purposes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LyricsResult {
    pub synced: Option<Vec<LyricLine>>,
    pub unsynced: Option<Vec<LyricLine>>,
    /// Human-readable failure reason, suitable for direct display.
    pub error: Option<String>,
}

impl LyricsResult {
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_usable(&self) -> bool {
        self.error.is_none()
            && (self.synced.as_ref().is_some_and(|l| !l.is_empty())
                || self.unsynced.as_ref().is_some_and(|l| !l.is_empty()))
    }
}

#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Call succeeded (or was never made) but no usable lyrics exist; the
    /// message is the provider's fixed user-facing "no lyrics" text.
    #[error("{0}")]
    NoLyrics(&'static str),
    /// Missing token precondition on a token-gated provider; never attempted
    /// over the network. The message embeds setup guidance for the user.
    #[error("{0}")]
    TokenRequired(&'static str),
    /// HTTP 401 on a token-gated provider; the message tells the user to
    /// refresh the token rather than reporting a generic failure.
    #[error("{0}")]
    TokenRejected(&'static str),
}

// Re-export HTTP client for providers within the lyrics module
pub(crate) fn http_client() -> &'static Client {
    &HTTP_CLIENT
}
