use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::sync::Arc;
use std::time::Duration;
use tandem::RoomId;
use tandem::model::IceServerConfig;
use tandem::signaling::{
    MediaConstraints, MediaKind, MemoryStore, SessionConfig, SessionEvent, SessionState,
    SessionStore, SignalingCoordinator, SyntheticMediaSource,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Opus frame carrying 20 ms of silence
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];
const FRAME_DURATION: Duration = Duration::from_millis(20);

#[derive(Parser)]
#[command(name = "tandem")]
#[command(about = "Two-party calls signaled through a shared room document")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connects an initiator and a responder inside this process
    Loopback {
        /// Send a video track next to the audio one
        #[arg(long)]
        video: bool,

        /// STUN server URL, repeatable. Defaults to the public Google servers
        #[arg(long = "ice-server", value_name = "URL")]
        ice_servers: Vec<String>,

        /// Seconds both sides get to reach Connected
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Keep the call up until confirmed on the terminal
        #[arg(long)]
        hold: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Commands::Loopback {
            video,
            ice_servers,
            timeout,
            hold,
        } => {
            let mut config =
                SessionConfig::default().with_connect_timeout(Some(Duration::from_secs(timeout)));
            if !ice_servers.is_empty() {
                config = config.with_ice_servers(vec![IceServerConfig::stun(ice_servers)]);
            }
            let constraints = MediaConstraints { audio: true, video };

            run_loopback(config, constraints, hold).await?;
        }
    }

    Ok(())
}

async fn run_loopback(config: SessionConfig, constraints: MediaConstraints, hold: bool) -> Result<()> {
    println!("{}", "🚀 Starting loopback call...".green().bold());

    let store = MemoryStore::new();
    let media = Arc::new(SyntheticMediaSource::new("loopback"));
    let (initiator, mut initiator_events) =
        SignalingCoordinator::webrtc(Arc::new(store.clone()), media.clone(), config.clone());
    let (responder, mut responder_events) =
        SignalingCoordinator::webrtc(Arc::new(store.clone()), media, config);

    let room_id = initiator
        .create_room(&constraints)
        .await
        .context("Failed to create room")?;
    println!("   🏠 Room: {}", room_id.to_string().bold());

    responder
        .join_room(room_id, &constraints)
        .await
        .context("Failed to join room")?;

    let mut pumps = Vec::new();
    for coordinator in [&initiator, &responder] {
        let track = coordinator
            .local_media()
            .await
            .and_then(|media| media.track(MediaKind::Audio).cloned());
        if let Some(track) = track {
            pumps.push(spawn_silence(track));
        }
    }

    let (initiator_result, responder_result) = tokio::join!(
        watch("initiator", &mut initiator_events),
        watch("responder", &mut responder_events),
    );
    let outcome = initiator_result.and(responder_result);

    if outcome.is_ok() {
        print_summary(&store, room_id).await?;
        if hold {
            wait_for_hangup().await?;
        }
    }

    initiator.leave_room().await;
    responder.leave_room().await;
    for pump in pumps {
        pump.abort();
    }

    outcome?;
    println!("{}", "✨ Call finished".green().bold());
    Ok(())
}

/// Prints one side's events until it connects, or fails with its error.
async fn watch(side: &str, events: &mut mpsc::Receiver<SessionEvent>) -> Result<()> {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::ConnectionStateChanged(SessionState::Connected) => {
                println!("   ✅ {} connected", side.cyan());
                return Ok(());
            }
            SessionEvent::ConnectionStateChanged(state) => {
                println!("   🔄 {} is now {}", side.cyan(), state.to_string().yellow());
            }
            SessionEvent::RemoteStreamAvailable(track) => {
                println!(
                    "   🎧 {} receives {:?} track '{}'",
                    side.cyan(),
                    track.kind,
                    track.id
                );
            }
            SessionEvent::Error { kind, detail } => {
                println!("   ❌ {} {}: {}", side.cyan(), kind.to_string().red(), detail);
                bail!("{} failed: {}", side, detail);
            }
        }
    }
    bail!("{} session ended before connecting", side)
}

async fn print_summary(store: &MemoryStore, room_id: RoomId) -> Result<()> {
    let snapshot = store
        .get(&room_id)
        .await
        .context("Failed to read room")?
        .context("Room disappeared from the store")?;

    println!("   📄 Room document at revision {}", snapshot.revision);
    println!(
        "      initiator candidates: {}, responder candidates: {}",
        snapshot.document.initiator_candidates.len(),
        snapshot.document.responder_candidates.len()
    );
    Ok(())
}

async fn wait_for_hangup() -> Result<()> {
    tokio::task::spawn_blocking(|| {
        Confirm::new()
            .with_prompt("Hang up?")
            .default(true)
            .interact()
    })
    .await
    .context("Prompt task failed")?
    .context("Failed to read confirmation")?;
    Ok(())
}

/// Feeds Opus silence into `track` so the remote side sees media flowing.
fn spawn_silence(track: Arc<TrackLocalStaticSample>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(FRAME_DURATION);
        loop {
            ticker.tick().await;
            let sample = Sample {
                data: Bytes::from_static(&OPUS_SILENCE),
                duration: FRAME_DURATION,
                ..Default::default()
            };
            if let Err(e) = track.write_sample(&sample).await {
                tracing::debug!("Silence pump stopped: {}", e);
                return;
            }
        }
    })
}
