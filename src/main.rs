use anyhow::Context;
use arplace::kernel::time::FrameToken;
use arplace::platform::mock::MockPlatform;
use arplace::scene::recording::RecordingSceneHost;
use arplace::{ArConfig, ArReactor, Event, InputEvent, Pose};
use glam::{Quat, Vec3};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

const DEMO_FRAMES: u64 = 240;
const TAP_EVERY: u64 = 45;

/// Floor sweep: the device pans left to right, loses the surface for a stretch,
/// then finds it again.
fn scripted_hit(frame: FrameToken) -> Option<Pose> {
    let f = frame.frame;
    if f < 20 || (110..140).contains(&f) {
        return None;
    }
    let x = ((f as f32) * 0.02).sin() * 0.8;
    Some(Pose::new(Vec3::new(x, 0.0, -1.5), Quat::IDENTITY))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ArConfig::load(&path).with_context(|| format!("loading config from {}", path))?,
        None => ArConfig::default(),
    };
    tracing::info!("AR placement demo booting...");

    let platform = Arc::new(MockPlatform::new().with_negotiation_delay(Duration::from_millis(40)));
    let mut reactor = ArReactor::new(Arc::clone(&platform), RecordingSceneHost::new(), &config);

    // UI chrome stand-in
    let mut events = reactor.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(?event, "[UI]"),
                Err(RecvError::Lagged(n)) => tracing::warn!("UI fell behind by {} events", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    reactor.request_session().context("starting AR session")?;
    let input = reactor.sender();

    let mut cadence = tokio::time::interval(Duration::from_millis(config.frame_ms));
    cadence.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut frame = FrameToken::default();

    tracing::info!("Frame loop active. Press Ctrl+C to stop.");

    while frame.frame < DEMO_FRAMES {
        tokio::select! {
            _ = cadence.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        frame = frame.next();

        match scripted_hit(frame) {
            Some(pose) => platform.set_hits(vec![pose]),
            None => platform.clear_hits(),
        }
        if frame.frame % TAP_EVERY == 0 {
            // tap lands at the next frame boundary
            if let Err(e) = input.try_send(Event::Input(InputEvent::select("screen"))) {
                tracing::warn!("dropped tap: {}", e);
            }
        }

        reactor.on_frame(frame);
    }

    reactor.end_session();

    for object in reactor.placed_objects() {
        println!(
            "[PLACED] #{} at {:?} colour {}",
            object.id.ordinal(),
            object.pose.position,
            object.style.color.to_hex()
        );
    }
    println!("{}", serde_json::to_string_pretty(&reactor.telemetry().snapshot())?);
    Ok(())
}
