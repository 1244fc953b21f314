use std::error::Error;
use std::sync::Arc;

use clap::Parser;

use lyricsplus::lyrics::resolve::ProviderRegistry;
use lyricsplus::lyrics::types::{LyricLine, TrackInfo};
use lyricsplus::lyrics::ProviderTokens;
use lyricsplus::session::LyricsSession;

/// Application configuration from CLI
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Config {
    /// Track title as displayed by the player
    #[arg(long)]
    title: String,
    /// Artist as displayed by the player
    #[arg(long)]
    artist: String,
    /// Album name (optional, improves matching)
    #[arg(long, default_value = "")]
    album: String,
    /// Track duration in milliseconds (0 = unknown)
    #[arg(long, default_value_t = 0)]
    duration: u64,
    /// Spotify 22-character track id (enables the Spotify provider)
    #[arg(long)]
    track_id: Option<String>,
    /// Query one provider by name instead of auto-detecting
    /// (LRCLIB, Spotify, KPoe, Musixmatch, Genius)
    #[arg(long)]
    provider: Option<String>,
    /// Spotify bearer token. Falls back to LYRICSPLUS_SPOTIFY_TOKEN.
    #[arg(long)]
    spotify_token: Option<String>,
    /// Musixmatch user token. Falls back to LYRICSPLUS_MUSIXMATCH_TOKEN.
    #[arg(long)]
    musixmatch_token: Option<String>,
}

fn token_from_env_if_empty(token: &mut Option<String>, var: &str) {
    if token.is_none()
        && let Ok(value) = std::env::var(var)
        && !value.is_empty()
    {
        *token = Some(value);
    }
}

fn format_line(line: &LyricLine) -> String {
    match line.time {
        Some(ms) => {
            let minutes = ms / 60_000;
            let seconds = (ms % 60_000) / 1_000;
            let centis = ms % 1_000 / 10;
            format!("[{minutes:02}:{seconds:02}.{centis:02}] {}", line.text)
        }
        None => line.text.clone(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = Config::parse();
    token_from_env_if_empty(&mut cfg.spotify_token, "LYRICSPLUS_SPOTIFY_TOKEN");
    token_from_env_if_empty(&mut cfg.musixmatch_token, "LYRICSPLUS_MUSIXMATCH_TOKEN");

    let track = TrackInfo {
        title: cfg.title.clone(),
        artist: cfg.artist.clone(),
        album: cfg.album.clone(),
        duration: cfg.duration,
        track_id: cfg.track_id.clone(),
    };
    let registry = Arc::new(ProviderRegistry::new(ProviderTokens {
        spotify: cfg.spotify_token.clone(),
        musixmatch: cfg.musixmatch_token.clone(),
    }));

    let (provider, result) = match cfg.provider.as_deref() {
        // One provider by name, bypassing the auto-detection sequence.
        Some(name) => match registry.from_provider(name, &track).await {
            Ok(resolved) => (Some(resolved.provider), resolved.into_result()),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        None => {
            let session = LyricsSession::new(registry);
            let snapshot = session.refresh(track).await;
            (snapshot.provider, snapshot.result.unwrap_or_default())
        }
    };

    if let Some(error) = result.error {
        eprintln!("{error}");
        std::process::exit(1);
    }
    if let Some(provider) = provider {
        eprintln!("Lyrics from {provider}:");
    }
    let lines = result.synced.or(result.unsynced).unwrap_or_default();
    for line in &lines {
        println!("{}", format_line(line));
    }
    Ok(())
}
