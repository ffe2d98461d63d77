//! Audio playback sinks used by the ringer

use std::{process::Stdio, sync::Mutex};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::{ClockError, Result};

/// What the ringer asks an audio sink to play
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    /// URL or file path of the sound asset
    pub source: String,
    /// Seconds into the asset where playback begins
    pub start_offset_secs: u32,
    pub looped: bool,
    /// Initial volume in `0.0..=1.0`
    pub volume: f32,
}

/// Audio output capability
pub trait AudioSink: Send + Sync {
    fn play(&self, request: &PlaybackRequest) -> Result<()>;
    fn set_volume(&self, volume: f32) -> Result<()>;
    /// Best-effort stop; returns once the stop has been requested
    fn stop(&self) -> Result<()>;
}

/// Sink that only logs; alarms still ring, silently
#[derive(Debug, Default)]
pub struct SilentAudioSink;

impl AudioSink for SilentAudioSink {
    fn play(&self, request: &PlaybackRequest) -> Result<()> {
        info!(
            "Playing {} from {}s (looped={}, volume={:.1}) on silent sink",
            request.source, request.start_offset_secs, request.looped, request.volume
        );
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        debug!("Silent sink volume set to {:.1}", volume);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        info!("Silent sink stopped");
        Ok(())
    }
}

/// Plays sounds by spawning an external player program.
///
/// The command template is split on whitespace; `{source}`, `{offset}`,
/// `{volume}` (percent) and `{loop}` (`inf` or `no`) are substituted in each
/// argument. A running player cannot change volume, so a volume change
/// relaunches it from the same offset when the template carries `{volume}`.
#[derive(Debug)]
pub struct CommandAudioSink {
    template: Vec<String>,
    playing: Mutex<Option<Playing>>,
}

#[derive(Debug)]
struct Playing {
    child: Child,
    request: PlaybackRequest,
}

impl CommandAudioSink {
    pub fn new(template: &str) -> Result<Self> {
        let template: Vec<String> = template.split_whitespace().map(str::to_string).collect();
        if template.is_empty() {
            return Err(ClockError::invalid_input("player command is empty"));
        }
        Ok(Self { template, playing: Mutex::new(None) })
    }

    pub fn program(&self) -> &str {
        &self.template[0]
    }

    fn render_args(&self, request: &PlaybackRequest) -> Vec<String> {
        let volume = ((request.volume.clamp(0.0, 1.0)) * 100.0).round() as u32;
        self.template[1..]
            .iter()
            .map(|arg| {
                arg.replace("{source}", &request.source)
                    .replace("{offset}", &request.start_offset_secs.to_string())
                    .replace("{volume}", &volume.to_string())
                    .replace("{loop}", if request.looped { "inf" } else { "no" })
            })
            .collect()
    }

    fn controls_volume(&self) -> bool {
        self.template[1..].iter().any(|arg| arg.contains("{volume}"))
    }

    fn spawn(&self, request: &PlaybackRequest) -> Result<Child> {
        let args = self.render_args(request);
        debug!("Spawning audio player: {} {:?}", self.program(), args);

        Command::new(self.program())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClockError::Audio(format!("Failed to spawn {}: {}", self.program(), e)))
    }
}

fn kill(child: &mut Child) -> Result<()> {
    child
        .start_kill()
        .map_err(|e| ClockError::Audio(format!("Failed to stop player: {}", e)))
}

impl AudioSink for CommandAudioSink {
    fn play(&self, request: &PlaybackRequest) -> Result<()> {
        let mut slot = self.playing.lock().map_err(|_| ClockError::Lock("audio player"))?;
        if let Some(mut previous) = slot.take() {
            log_audio_failure("stop of previous player", kill(&mut previous.child));
        }

        let child = self.spawn(request)?;
        info!("Audio player started for {}", request.source);
        *slot = Some(Playing { child, request: request.clone() });
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        if !self.controls_volume() {
            debug!("Volume {:.1} requested; player template has no volume argument", volume);
            return Ok(());
        }

        let mut slot = self.playing.lock().map_err(|_| ClockError::Lock("audio player"))?;
        let Some(playing) = slot.as_mut() else {
            debug!("Volume {:.1} requested with nothing playing", volume);
            return Ok(());
        };
        if playing.request.volume == volume {
            return Ok(());
        }

        let request = PlaybackRequest { volume, ..playing.request.clone() };
        log_audio_failure("stop before volume change", kill(&mut playing.child));
        let child = self.spawn(&request)?;
        debug!("Audio player relaunched at volume {:.1}", volume);
        *playing = Playing { child, request };
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let mut slot = self.playing.lock().map_err(|_| ClockError::Lock("audio player"))?;
        if let Some(mut playing) = slot.take() {
            kill(&mut playing.child)?;
            info!("Audio player stopped");
        }
        Ok(())
    }
}

/// Check that the configured player program can be launched
pub async fn check_player_available(program: &str) -> Result<()> {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| ClockError::Audio(format!("{} is not available: {}", program, e)))?;

    info!("{} is available", program);
    Ok(())
}

/// Log the outcome of a sink call without interrupting the caller
pub(crate) fn log_audio_failure(action: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!("Audio {} failed: {}", action, e);
    }
}
