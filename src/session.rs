//! Per-track lookup state: caches the resolved result, deduplicates
//! redundant refreshes and discards stale completions after a track change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::lyrics::resolve::{ProviderRegistry, NO_LYRICS_FOUND};
use crate::lyrics::types::{LyricsResult, TrackInfo};

/// Where the current track stands in the resolution state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPhase {
    /// No active track.
    #[default]
    Idle,
    /// Auto-detection (or a manual provider fetch) is in flight.
    Resolving,
    /// Terminal per track: a provider produced usable lyrics.
    Resolved,
    /// Terminal per track: every attempt was tried and none produced lyrics.
    Exhausted,
}

#[derive(Debug, Default)]
struct SessionState {
    track: Option<TrackInfo>,
    phase: ResolutionPhase,
    provider: Option<&'static str>,
    result: Option<LyricsResult>,
}

/// Read-only view of the session for UI/messaging collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub track_id: Option<String>,
    pub phase: ResolutionPhase,
    pub provider: Option<&'static str>,
    pub result: Option<LyricsResult>,
}

/// Owns the single active track context.
///
/// Completion of a lookup is applied only if the generation counter still
/// matches the value taken when the lookup started, so a slow response for a
/// previous track can never overwrite a newer track's state. In-flight HTTP
/// calls are left to finish; only their results are discarded.
pub struct LyricsSession {
    registry: Arc<ProviderRegistry>,
    state: Mutex<SessionState>,
    generation: AtomicU64,
}

impl LyricsSession {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            state: Mutex::new(SessionState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().unwrap();
        SessionSnapshot {
            track_id: state.track.as_ref().map(TrackInfo::id),
            phase: state.phase,
            provider: state.provider,
            result: state.result.clone(),
        }
    }

    /// Forget the active track, e.g. when the host player goes away.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = SessionState::default();
    }

    /// Resolve lyrics for the track currently shown by the host player.
    ///
    /// Idempotent per track id: repeated calls for the same track return the
    /// cached state without touching the network. A new id supersedes any
    /// in-flight lookup for the previous track.
    pub async fn refresh(&self, track: TrackInfo) -> SessionSnapshot {
        let track_id = track.id();
        // The generation bump happens under the same lock as the state
        // reset, so an older lookup can never observe the new state with a
        // still-matching counter.
        let generation = {
            let mut state = self.state.lock().unwrap();
            if state.track.as_ref().map(TrackInfo::id) == Some(track_id.clone()) {
                return SessionSnapshot {
                    track_id: Some(track_id),
                    phase: state.phase,
                    provider: state.provider,
                    result: state.result.clone(),
                };
            }
            tracing::info!(track = %track_id, "track changed, resolving lyrics");
            state.track = Some(track.clone());
            state.phase = ResolutionPhase::Resolving;
            state.provider = None;
            state.result = None;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let resolved = self.registry.auto_detect(&track).await;

        let mut state = self.state.lock().unwrap();
        if self.generation.load(Ordering::SeqCst) == generation {
            match resolved {
                Some(resolved) => {
                    state.phase = ResolutionPhase::Resolved;
                    state.provider = Some(resolved.provider);
                    state.result = Some(resolved.into_result());
                }
                None => {
                    state.phase = ResolutionPhase::Exhausted;
                    state.provider = None;
                    state.result = Some(LyricsResult::from_error(NO_LYRICS_FOUND));
                }
            }
        }
        SessionSnapshot {
            track_id: state.track.as_ref().map(TrackInfo::id),
            phase: state.phase,
            provider: state.provider,
            result: state.result.clone(),
        }
    }

    /// User-driven override: query one provider by name for the active
    /// track. Always fetches fresh, even if auto-detect already tried the
    /// provider, because the user may be retrying after saving a token.
    pub async fn select_provider(&self, name: &str) -> SessionSnapshot {
        let (track, generation) = {
            let mut state = self.state.lock().unwrap();
            let Some(track) = state.track.clone() else {
                return SessionSnapshot {
                    track_id: None,
                    phase: state.phase,
                    provider: state.provider,
                    result: state.result.clone(),
                };
            };
            state.phase = ResolutionPhase::Resolving;
            state.result = None;
            (track, self.generation.fetch_add(1, Ordering::SeqCst) + 1)
        };

        let outcome = self.registry.from_provider(name, &track).await;

        let mut state = self.state.lock().unwrap();
        if self.generation.load(Ordering::SeqCst) == generation {
            match outcome {
                Ok(resolved) => {
                    state.phase = ResolutionPhase::Resolved;
                    state.provider = Some(resolved.provider);
                    state.result = Some(resolved.into_result());
                }
                Err(e) => {
                    state.phase = ResolutionPhase::Exhausted;
                    state.provider = None;
                    state.result = Some(LyricsResult::from_error(e.to_string()));
                }
            }
        }
        SessionSnapshot {
            track_id: state.track.as_ref().map(TrackInfo::id),
            phase: state.phase,
            provider: state.provider,
            result: state.result.clone(),
        }
    }
}
