//! Multi-provider lyrics resolution engine.
//!
//! Given a [`TrackInfo`] scraped from a host player, the engine queries a
//! prioritized set of external lyric sources (LRCLIB, Spotify, KPoe,
//! Musixmatch, Genius), normalizes their heterogeneous responses into one
//! synced/unsynced line model and caches the outcome per track in a
//! [`LyricsSession`].

pub mod lyrics;
pub mod session;

pub use lyrics::{
    LyricLine, LyricsError, LyricsResult, ProviderAdapter, ProviderRegistry, ProviderTokens,
    ResolvedLyrics, TrackInfo, AUTO_DETECT_SEQUENCE, NO_LYRICS_FOUND,
};
pub use session::{LyricsSession, ResolutionPhase, SessionSnapshot};
