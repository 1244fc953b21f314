// lyrics/mod.rs - top-level lyrics module re-exporting submodules
pub mod normalize;
pub mod parse;
pub mod providers;
pub mod resolve;
pub mod scoring;
pub mod types;

pub use providers::{ProviderAdapter, ProviderTokens, RawLyrics, INSTRUMENTAL_PLACEHOLDER};
pub use resolve::{ProviderRegistry, ResolvedLyrics, AUTO_DETECT_SEQUENCE, NO_LYRICS_FOUND};
pub use types::{LyricLine, LyricsError, LyricsResult, TrackInfo};
