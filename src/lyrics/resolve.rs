use std::sync::Arc;

use crate::lyrics::providers::{
    genius, kpoe, lrclib, musixmatch, spotify, Genius, Kpoe, Lrclib, Musixmatch, ProviderAdapter,
    ProviderTokens, Spotify,
};
use crate::lyrics::types::{LyricLine, LyricsError, LyricsResult, TrackInfo};

/// Which line set an auto-detection attempt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsKind {
    Synced,
    Unsynced,
}

/// Fixed priority order: synced attempts across all providers strictly
/// before any unsynced attempt. Genius is unsynced-only, so it holds the
/// final slot and never appears in a synced one.
pub const AUTO_DETECT_SEQUENCE: [(&str, LyricsKind); 9] = [
    (lrclib::NAME, LyricsKind::Synced),
    (spotify::NAME, LyricsKind::Synced),
    (kpoe::NAME, LyricsKind::Synced),
    (musixmatch::NAME, LyricsKind::Synced),
    (lrclib::NAME, LyricsKind::Unsynced),
    (spotify::NAME, LyricsKind::Unsynced),
    (kpoe::NAME, LyricsKind::Unsynced),
    (musixmatch::NAME, LyricsKind::Unsynced),
    (genius::NAME, LyricsKind::Unsynced),
];

/// User-visible outcome when the whole sequence is exhausted.
pub const NO_LYRICS_FOUND: &str = "No lyrics found from any provider";

/// Lyrics accepted from one provider, with the provider's name attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLyrics {
    pub provider: &'static str,
    pub synced: Option<Vec<LyricLine>>,
    pub unsynced: Option<Vec<LyricLine>>,
}

impl ResolvedLyrics {
    pub fn into_result(self) -> LyricsResult {
        LyricsResult {
            synced: self.synced,
            unsynced: self.unsynced,
            error: None,
        }
    }
}

/// Ordered set of provider adapters plus the auto-detection walk over them.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// The standard five providers; token-gated ones take their tokens here.
    pub fn new(tokens: ProviderTokens) -> Self {
        Self::with_providers(vec![
            Arc::new(Lrclib),
            Arc::new(Spotify::new(tokens.spotify)),
            Arc::new(Kpoe::default()),
            Arc::new(Musixmatch::new(tokens.musixmatch)),
            Arc::new(Genius),
        ])
    }

    /// Custom adapter set; used by tests and embedders with their own stack.
    pub fn with_providers(providers: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { providers }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ProviderAdapter>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Walk [`AUTO_DETECT_SEQUENCE`] until one attempt yields non-empty
    /// lines. Each attempt is its own `find_lyrics` call followed by exactly
    /// one getter; provider failures are logged and never abort the walk.
    pub async fn auto_detect(&self, track: &TrackInfo) -> Option<ResolvedLyrics> {
        for (name, kind) in AUTO_DETECT_SEQUENCE {
            let Some(provider) = self.get(name) else {
                continue;
            };
            let raw = match provider.find_lyrics(track).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::debug!(provider = name, kind = ?kind, error = %e, "attempt failed");
                    continue;
                }
            };
            let lines = match kind {
                LyricsKind::Synced => provider.synced_lines(&raw),
                LyricsKind::Unsynced => provider.unsynced_lines(&raw),
            };
            if let Some(lines) = lines
                && !lines.is_empty()
            {
                tracing::info!(provider = name, kind = ?kind, lines = lines.len(), "lyrics found");
                return Some(ResolvedLyrics {
                    provider: provider.name(),
                    synced: (kind == LyricsKind::Synced).then_some(lines.clone()),
                    unsynced: (kind == LyricsKind::Unsynced).then_some(lines),
                });
            }
        }
        tracing::info!(track = %track.id(), "no lyrics found from any provider");
        None
    }

    /// Manual override: query exactly one provider by name, keeping whatever
    /// synced and unsynced sets it produces. Always a fresh fetch.
    pub async fn from_provider(
        &self,
        name: &str,
        track: &TrackInfo,
    ) -> Result<ResolvedLyrics, LyricsError> {
        let provider = self
            .get(name)
            .ok_or_else(|| LyricsError::Api(format!("Unknown provider: {name}")))?;
        let raw = provider.find_lyrics(track).await?;
        let synced = provider.synced_lines(&raw).filter(|l| !l.is_empty());
        let unsynced = provider.unsynced_lines(&raw).filter(|l| !l.is_empty());
        if synced.is_none() && unsynced.is_none() {
            return Err(LyricsError::Api(format!(
                "No lyrics found from {}",
                provider.name()
            )));
        }
        Ok(ResolvedLyrics {
            provider: provider.name(),
            synced,
            unsynced,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::lyrics::providers::{LrclibResponse, RawLyrics, INSTRUMENTAL_PLACEHOLDER};

    /// Scripted provider that records every call it receives.
    pub(crate) struct StubProvider {
        pub name: &'static str,
        pub fetch_result: Option<RawLyrics>,
        pub synced: Option<Vec<LyricLine>>,
        pub unsynced: Option<Vec<LyricLine>>,
        pub calls: Arc<Mutex<Vec<String>>>,
    }

    impl StubProvider {
        pub fn failing(name: &'static str, calls: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                fetch_result: None,
                synced: None,
                unsynced: None,
                calls,
            }
        }

        pub fn with_lines(
            name: &'static str,
            synced: Option<Vec<LyricLine>>,
            unsynced: Option<Vec<LyricLine>>,
            calls: Arc<Mutex<Vec<String>>>,
        ) -> Self {
            Self {
                name,
                fetch_result: Some(RawLyrics::Lrclib(LrclibResponse::default())),
                synced,
                unsynced,
                calls,
            }
        }

        fn record(&self, event: &str) {
            self.calls.lock().unwrap().push(format!("{event}:{}", self.name));
        }
    }

    #[async_trait]
    impl ProviderAdapter for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn find_lyrics(&self, _track: &TrackInfo) -> Result<RawLyrics, LyricsError> {
            self.record("find");
            self.fetch_result
                .clone()
                .ok_or(LyricsError::NoLyrics("no lyrics"))
        }

        fn synced_lines(&self, _raw: &RawLyrics) -> Option<Vec<LyricLine>> {
            self.record("synced");
            self.synced.clone()
        }

        fn unsynced_lines(&self, _raw: &RawLyrics) -> Option<Vec<LyricLine>> {
            self.record("unsynced");
            self.unsynced.clone()
        }
    }

    fn track() -> TrackInfo {
        TrackInfo {
            title: "Shape of You".into(),
            artist: "Ed Sheeran".into(),
            ..TrackInfo::default()
        }
    }

    fn lines(text: &str) -> Vec<LyricLine> {
        vec![LyricLine::unsynced(text)]
    }

    #[tokio::test]
    async fn attempts_follow_the_fixed_sequence_until_kpoe_unsynced() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry = ProviderRegistry::with_providers(vec![
            Arc::new(StubProvider::with_lines("LRCLIB", None, None, calls.clone())),
            Arc::new(StubProvider::with_lines("Spotify", None, None, calls.clone())),
            Arc::new(StubProvider::with_lines(
                "KPoe",
                None,
                Some(lines("kpoe line")),
                calls.clone(),
            )),
            Arc::new(StubProvider::with_lines("Musixmatch", None, None, calls.clone())),
            Arc::new(StubProvider::failing("Genius", calls.clone())),
        ]);

        let resolved = registry.auto_detect(&track()).await.unwrap();
        assert_eq!(resolved.provider, "KPoe");
        assert!(resolved.synced.is_none());
        assert_eq!(resolved.unsynced.unwrap(), lines("kpoe line"));

        let recorded = calls.lock().unwrap().clone();
        assert_eq!(
            recorded,
            vec![
                "find:LRCLIB",
                "synced:LRCLIB",
                "find:Spotify",
                "synced:Spotify",
                "find:KPoe",
                "synced:KPoe",
                "find:Musixmatch",
                "synced:Musixmatch",
                "find:LRCLIB",
                "unsynced:LRCLIB",
                "find:Spotify",
                "unsynced:Spotify",
                "find:KPoe",
                "unsynced:KPoe",
            ]
        );
    }

    #[tokio::test]
    async fn synced_hit_short_circuits_everything_else() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry = ProviderRegistry::with_providers(vec![
            Arc::new(StubProvider::with_lines(
                "LRCLIB",
                Some(vec![LyricLine::synced(0, "hit")]),
                None,
                calls.clone(),
            )),
            Arc::new(StubProvider::failing("Spotify", calls.clone())),
        ]);

        let resolved = registry.auto_detect(&track()).await.unwrap();
        assert_eq!(resolved.provider, "LRCLIB");
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn plain_only_lrclib_resolves_at_the_unsynced_pass() {
        // LRCLIB with plainLyrics only: all four synced attempts miss, then
        // the first unsynced attempt wins.
        let calls = Arc::new(Mutex::new(Vec::new()));
        let lrclib_raw = RawLyrics::Lrclib(LrclibResponse {
            plain_lyrics: Some("The club isn't the best place".into()),
            ..LrclibResponse::default()
        });
        let adapter = Lrclib;
        let synced = adapter.synced_lines(&lrclib_raw);
        let unsynced = adapter.unsynced_lines(&lrclib_raw);
        assert!(synced.is_none());

        let registry = ProviderRegistry::with_providers(vec![
            Arc::new(StubProvider::with_lines("LRCLIB", synced, unsynced, calls.clone())),
            Arc::new(StubProvider::failing("Spotify", calls.clone())),
            Arc::new(StubProvider::failing("KPoe", calls.clone())),
            Arc::new(StubProvider::failing("Musixmatch", calls.clone())),
            Arc::new(StubProvider::failing("Genius", calls.clone())),
        ]);

        let resolved = registry.auto_detect(&track()).await.unwrap();
        assert_eq!(resolved.provider, "LRCLIB");
        assert_eq!(
            resolved.unsynced.unwrap(),
            vec![LyricLine::unsynced("The club isn't the best place")]
        );
    }

    #[tokio::test]
    async fn exhausted_sequence_returns_none() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry = ProviderRegistry::with_providers(vec![
            Arc::new(StubProvider::failing("LRCLIB", calls.clone())),
            Arc::new(StubProvider::failing("Spotify", calls.clone())),
            Arc::new(StubProvider::failing("KPoe", calls.clone())),
            Arc::new(StubProvider::failing("Musixmatch", calls.clone())),
            Arc::new(StubProvider::failing("Genius", calls.clone())),
        ]);
        assert!(registry.auto_detect(&track()).await.is_none());
        // 9 attempts, each a single find call and no getter calls.
        assert_eq!(calls.lock().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn instrumental_placeholder_counts_as_a_first_pass_hit() {
        // An instrumental-only LRCLIB response resolves at the very first
        // attempt even though later providers might have real lyrics; the
        // sequence never reaches them.
        let calls = Arc::new(Mutex::new(Vec::new()));
        let adapter = Lrclib;
        let raw = RawLyrics::Lrclib(LrclibResponse {
            instrumental: true,
            ..LrclibResponse::default()
        });
        let registry = ProviderRegistry::with_providers(vec![
            Arc::new(StubProvider::with_lines(
                "LRCLIB",
                adapter.synced_lines(&raw),
                adapter.unsynced_lines(&raw),
                calls.clone(),
            )),
            Arc::new(StubProvider::with_lines(
                "Spotify",
                Some(vec![LyricLine::synced(0, "real lyrics")]),
                None,
                calls.clone(),
            )),
        ]);

        let resolved = registry.auto_detect(&track()).await.unwrap();
        assert_eq!(resolved.provider, "LRCLIB");
        assert_eq!(
            resolved.synced.unwrap(),
            vec![LyricLine::synced(0, INSTRUMENTAL_PLACEHOLDER)]
        );
    }

    #[tokio::test]
    async fn manual_override_queries_exactly_one_provider() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry = ProviderRegistry::with_providers(vec![
            Arc::new(StubProvider::failing("LRCLIB", calls.clone())),
            Arc::new(StubProvider::with_lines(
                "Genius",
                None,
                Some(lines("scraped")),
                calls.clone(),
            )),
        ]);

        let resolved = registry.from_provider("Genius", &track()).await.unwrap();
        assert_eq!(resolved.provider, "Genius");
        let recorded = calls.lock().unwrap().clone();
        assert!(recorded.iter().all(|c| c.ends_with(":Genius")));
    }

    #[tokio::test]
    async fn manual_override_propagates_provider_errors() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry = ProviderRegistry::with_providers(vec![Arc::new(StubProvider::failing(
            "LRCLIB",
            calls.clone(),
        ))]);
        assert!(registry.from_provider("LRCLIB", &track()).await.is_err());
        assert!(registry.from_provider("Nope", &track()).await.is_err());
    }
}
