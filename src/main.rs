//! Pixelclock - A headless clock daemon
//!
//! This is the main entry point for the pixelclock application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use pixelclock::{
    api::create_router,
    config::Config,
    services::{
        check_player_available, AudioSink, Capabilities, CommandAudioSink, FileStore, LogHapticSink,
        SilentAudioSink, SystemTimeSource,
    },
    state::AppState,
    tasks::{clock_tick_task, stopwatch_sampler_task, volume_ramp_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pixelclock={},tower_http=info", config.log_level()))
        .init();

    info!("Starting pixelclock server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, data_dir={}",
          config.host, config.port, config.data_dir.display());

    // A missing player is not fatal: alarms still ring, silently
    let audio: Arc<dyn AudioSink> = match &config.player {
        Some(template) => {
            let sink = CommandAudioSink::new(template)?;
            if let Err(e) = check_player_available(sink.program()).await {
                warn!("{}", e);
            }
            Arc::new(sink)
        }
        None => {
            info!("No --player configured, using silent audio sink");
            Arc::new(SilentAudioSink)
        }
    };

    let caps = Capabilities {
        clock: Arc::new(SystemTimeSource::new()),
        store: Arc::new(FileStore::open(&config.data_dir)?),
        audio,
        haptics: Arc::new(LogHapticSink),
    };

    // Create application state
    let state = Arc::new(AppState::new(caps));

    // Start the periodic background tasks
    let tasks = vec![
        tokio::spawn(clock_tick_task(Arc::clone(&state))),
        tokio::spawn(volume_ramp_task(Arc::clone(&state))),
        tokio::spawn(stopwatch_sampler_task(Arc::clone(&state))),
    ];

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /status, /clock, /health");
    info!("  GET    /alarms   POST /alarms   DELETE /alarms/:id   POST /alarms/:id/toggle");
    info!("  GET    /timer    POST /timer/{{start,pause,resume,reset}}");
    info!("  GET    /stopwatch   POST /stopwatch/{{start,pause,reset,lap}}");
    info!("  GET    /settings   PATCH /settings");
    info!("  GET    /ringing   POST /ringing/stop");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    for task in &tasks {
        task.abort();
    }
    if let Err(e) = state.teardown() {
        tracing::error!("Teardown failed: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
