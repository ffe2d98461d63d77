//! Main application state management

use std::{
    sync::{Mutex, MutexGuard},
    time::Instant,
};
use chrono::NaiveDateTime;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::{
    error::{ClockError, Result},
    services::{load_json, save_json, Capabilities, ALARMS_KEY, SETTINGS_KEY},
};
use super::{
    alarm::{find_due_alarm, normalize_alarm_time, sort_alarms},
    Alarm, AppSettings, ClockEvent, Lap, Ringer, RingingAlarm, SettingsPatch, Stopwatch, TimerState,
};

/// Owns every clock component and the capabilities they call into.
///
/// Each component sits behind its own mutex; no two are held at once.
pub struct AppState {
    caps: Capabilities,
    alarms: Mutex<Vec<Alarm>>,
    settings: Mutex<AppSettings>,
    timer: Mutex<TimerState>,
    stopwatch: Mutex<Stopwatch>,
    ringer: Mutex<Ringer>,
    /// Server start, for uptime reporting
    pub start_time: Instant,
    event_tx: broadcast::Sender<ClockEvent>,
    /// Latest 1 Hz wall-clock sample
    now_tx: watch::Sender<NaiveDateTime>,
    /// Whether the stopwatch sampler should be repainting
    stopwatch_running_tx: watch::Sender<bool>,
    /// Elapsed milliseconds as of the latest repaint
    stopwatch_elapsed_tx: watch::Sender<u64>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &'static str) -> Result<MutexGuard<'a, T>> {
    mutex.lock().map_err(|_| ClockError::Lock(what))
}

impl AppState {
    /// Create the state, loading alarms and settings from the store
    pub fn new(caps: Capabilities) -> Self {
        let stored: Vec<Alarm> = load_json(caps.store.as_ref(), ALARMS_KEY);
        let mut alarms: Vec<Alarm> = stored
            .into_iter()
            .filter_map(|alarm| match normalize_alarm_time(&alarm.time) {
                Ok(time) => Some(Alarm { time, ..alarm }),
                Err(e) => {
                    warn!("Dropping stored alarm {}: {}", alarm.id, e);
                    None
                }
            })
            .collect();
        sort_alarms(&mut alarms);
        let settings: AppSettings = load_json(caps.store.as_ref(), SETTINGS_KEY);
        info!("Loaded {} alarms", alarms.len());

        let (event_tx, _) = broadcast::channel(100);
        let (now_tx, _) = watch::channel(caps.clock.now());
        let (stopwatch_running_tx, _) = watch::channel(false);
        let (stopwatch_elapsed_tx, _) = watch::channel(0);

        Self {
            caps,
            alarms: Mutex::new(alarms),
            settings: Mutex::new(settings),
            timer: Mutex::new(TimerState::new()),
            stopwatch: Mutex::new(Stopwatch::new()),
            ringer: Mutex::new(Ringer::new()),
            start_time: Instant::now(),
            event_tx,
            now_tx,
            stopwatch_running_tx,
            stopwatch_elapsed_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClockEvent> {
        self.event_tx.subscribe()
    }

    pub fn watch_clock(&self) -> watch::Receiver<NaiveDateTime> {
        self.now_tx.subscribe()
    }

    pub fn watch_stopwatch_running(&self) -> watch::Receiver<bool> {
        self.stopwatch_running_tx.subscribe()
    }

    pub fn watch_stopwatch_elapsed(&self) -> watch::Receiver<u64> {
        self.stopwatch_elapsed_tx.subscribe()
    }

    fn emit(&self, event: ClockEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No event subscribers");
        }
    }

    // --- Time source ---

    /// Most recent wall-clock sample published by the tick
    pub fn current_time(&self) -> NaiveDateTime {
        *self.now_tx.borrow()
    }

    /// One 1 Hz step: sample the clock, run the alarm matcher, then the
    /// countdown. Alarms are checked first, so an alarm due in the same
    /// second as timer completion wins the ringer.
    pub fn tick(&self) -> Result<Vec<ClockEvent>> {
        let now = self.caps.clock.now();
        self.now_tx.send_replace(now);
        let mut events = Vec::new();

        let ringing = lock(&self.ringer, "ringer")?.is_ringing();
        let due = find_due_alarm(&lock(&self.alarms, "alarms")?, &now, ringing).cloned();
        if let Some(alarm) = due {
            events.push(ClockEvent::AlarmTriggered { alarm: alarm.clone() });
            events.extend(self.ring(RingingAlarm::Alarm(alarm))?);
        }

        let finished = lock(&self.timer, "timer")?.tick();
        if finished {
            info!("Countdown finished");
            events.push(ClockEvent::TimerFinished);
            let source = RingingAlarm::TimerFinished { finished_at: now.format("%H:%M:%S").to_string() };
            events.extend(self.ring(source)?);
        }

        for event in &events {
            self.emit(event.clone());
        }
        Ok(events)
    }

    fn ring(&self, source: RingingAlarm) -> Result<Option<ClockEvent>> {
        let settings = self.settings()?;
        let mut ringer = lock(&self.ringer, "ringer")?;
        if !ringer.trigger(source.clone(), &settings, self.caps.audio.as_ref(), self.caps.haptics.as_ref()) {
            return Ok(None);
        }
        Ok(Some(ClockEvent::RingingStarted {
            ringing: source,
            ascending: settings.ascending_volume,
        }))
    }

    // --- Ringer ---

    pub fn ringing(&self) -> Result<Option<RingingAlarm>> {
        Ok(lock(&self.ringer, "ringer")?.current().cloned())
    }

    /// Advance the ascending volume ramp by one step
    pub fn ramp_volume(&self) -> Result<Option<f32>> {
        let mut ringer = lock(&self.ringer, "ringer")?;
        Ok(ringer.ramp_step(self.caps.audio.as_ref()))
    }

    /// Dismiss whatever is ringing
    pub fn stop_alarm(&self) -> Result<Option<RingingAlarm>> {
        let stopped = lock(&self.ringer, "ringer")?.stop(self.caps.audio.as_ref(), self.caps.haptics.as_ref());
        if stopped.is_some() {
            self.emit(ClockEvent::RingingStopped);
        }
        Ok(stopped)
    }

    // --- Alarms ---

    pub fn alarms(&self) -> Result<Vec<Alarm>> {
        Ok(lock(&self.alarms, "alarms")?.clone())
    }

    pub fn add_alarm(&self, time: &str, label: Option<String>) -> Result<Alarm> {
        let mut alarms = lock(&self.alarms, "alarms")?;

        let mut id = self.caps.clock.now().and_utc().timestamp_millis();
        while alarms.iter().any(|a| a.id == id.to_string()) {
            id += 1;
        }
        let alarm = Alarm::new(id.to_string(), time, label)?;

        info!("Adding alarm {} at {}", alarm.id, alarm.time);
        alarms.push(alarm.clone());
        sort_alarms(&mut alarms);
        self.persist_alarms(&alarms);
        Ok(alarm)
    }

    pub fn delete_alarm(&self, id: &str) -> Result<Alarm> {
        let mut alarms = lock(&self.alarms, "alarms")?;
        let index = alarms
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| ClockError::AlarmNotFound(id.to_string()))?;

        let removed = alarms.remove(index);
        info!("Deleted alarm {} at {}", removed.id, removed.time);
        self.persist_alarms(&alarms);
        Ok(removed)
    }

    pub fn toggle_alarm(&self, id: &str) -> Result<Alarm> {
        let mut alarms = lock(&self.alarms, "alarms")?;
        let alarm = alarms
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ClockError::AlarmNotFound(id.to_string()))?;

        alarm.is_active = !alarm.is_active;
        info!("Alarm {} is now {}", alarm.id, if alarm.is_active { "active" } else { "inactive" });
        let toggled = alarm.clone();
        self.persist_alarms(&alarms);
        Ok(toggled)
    }

    fn persist_alarms(&self, alarms: &[Alarm]) {
        if let Err(e) = save_json(self.caps.store.as_ref(), ALARMS_KEY, &alarms) {
            error!("Failed to persist alarms: {}", e);
        }
    }

    // --- Settings ---

    pub fn settings(&self) -> Result<AppSettings> {
        Ok(lock(&self.settings, "settings")?.clone())
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> Result<AppSettings> {
        let mut settings = lock(&self.settings, "settings")?;
        let mut updated = settings.clone();
        updated.apply(patch)?;

        *settings = updated.clone();
        drop(settings);

        info!("Settings updated");
        self.persist_settings(&updated);
        Ok(updated)
    }

    fn persist_settings(&self, settings: &AppSettings) {
        if let Err(e) = save_json(self.caps.store.as_ref(), SETTINGS_KEY, &settings.persistable()) {
            error!("Failed to persist settings: {}", e);
        }
    }

    // --- Countdown timer ---

    pub fn timer(&self) -> Result<TimerState> {
        Ok(lock(&self.timer, "timer")?.clone())
    }

    pub fn start_timer(&self, duration_seconds: u64) -> Result<TimerState> {
        let mut timer = lock(&self.timer, "timer")?;
        timer.start(duration_seconds)?;
        info!("Timer started for {}s", duration_seconds);
        Ok(timer.clone())
    }

    pub fn pause_timer(&self) -> Result<TimerState> {
        let mut timer = lock(&self.timer, "timer")?;
        timer.pause()?;
        info!("Timer paused with {}s left", timer.time_left_seconds());
        Ok(timer.clone())
    }

    pub fn resume_timer(&self) -> Result<TimerState> {
        let mut timer = lock(&self.timer, "timer")?;
        timer.resume()?;
        info!("Timer resumed with {}s left", timer.time_left_seconds());
        Ok(timer.clone())
    }

    pub fn reset_timer(&self) -> Result<TimerState> {
        let mut timer = lock(&self.timer, "timer")?;
        timer.reset();
        info!("Timer reset");
        Ok(timer.clone())
    }

    // --- Stopwatch ---

    /// Sampled copy of the stopwatch
    pub fn stopwatch(&self) -> Result<Stopwatch> {
        let mut stopwatch = lock(&self.stopwatch, "stopwatch")?;
        stopwatch.sample(self.caps.clock.monotonic_ms());
        Ok(stopwatch.clone())
    }

    /// Repaint step: refresh elapsed from the virtual epoch
    pub fn sample_stopwatch(&self) -> Result<u64> {
        let now_ms = self.caps.clock.monotonic_ms();
        let elapsed = lock(&self.stopwatch, "stopwatch")?.sample(now_ms);
        self.stopwatch_elapsed_tx.send_replace(elapsed);
        Ok(elapsed)
    }

    pub fn start_stopwatch(&self) -> Result<Stopwatch> {
        let mut stopwatch = lock(&self.stopwatch, "stopwatch")?;
        stopwatch.start(self.caps.clock.monotonic_ms());
        self.stopwatch_running_tx.send_replace(true);
        debug!("Stopwatch started at {}ms", stopwatch.elapsed_ms());
        Ok(stopwatch.clone())
    }

    pub fn pause_stopwatch(&self) -> Result<Stopwatch> {
        let mut stopwatch = lock(&self.stopwatch, "stopwatch")?;
        stopwatch.pause(self.caps.clock.monotonic_ms());
        self.stopwatch_running_tx.send_replace(false);
        self.stopwatch_elapsed_tx.send_replace(stopwatch.elapsed_ms());
        debug!("Stopwatch paused at {}ms", stopwatch.elapsed_ms());
        Ok(stopwatch.clone())
    }

    pub fn reset_stopwatch(&self) -> Result<Stopwatch> {
        let mut stopwatch = lock(&self.stopwatch, "stopwatch")?;
        stopwatch.reset()?;
        self.stopwatch_elapsed_tx.send_replace(0);
        Ok(stopwatch.clone())
    }

    pub fn lap_stopwatch(&self) -> Result<Lap> {
        let now_ms = self.caps.clock.monotonic_ms();
        lock(&self.stopwatch, "stopwatch")?.lap(now_ms)
    }

    // --- Lifecycle ---

    /// Silence the ringer and flush state before shutdown
    pub fn teardown(&self) -> Result<()> {
        self.stop_alarm()?;
        self.stopwatch_running_tx.send_replace(false);
        self.persist_alarms(&lock(&self.alarms, "alarms")?);
        self.persist_settings(&self.settings()?);
        info!("Application state torn down");
        Ok(())
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, time::Duration};
    use chrono::{NaiveDate, NaiveDateTime};
    use crate::services::{KeyValueStore, LogHapticSink, ManualTimeSource, MemoryStore};
    use crate::state::ringer::tests::RecordingAudio;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    struct Fixture {
        clock: Arc<ManualTimeSource>,
        store: Arc<MemoryStore>,
        audio: Arc<RecordingAudio>,
        state: AppState,
    }

    fn fixture(start: NaiveDateTime) -> Fixture {
        let clock = Arc::new(ManualTimeSource::new(start));
        let store = Arc::new(MemoryStore::new());
        let audio = Arc::new(RecordingAudio::default());
        let state = AppState::new(Capabilities {
            clock: clock.clone(),
            store: store.clone(),
            audio: audio.clone(),
            haptics: Arc::new(LogHapticSink),
        });
        Fixture { clock, store, audio, state }
    }

    fn ringing_started(events: &[ClockEvent]) -> usize {
        events.iter().filter(|e| matches!(e, ClockEvent::RingingStarted { .. })).count()
    }

    #[test]
    fn active_alarm_rings_once_and_inactive_twin_never() {
        let f = fixture(at(6, 59, 59));
        let active = f.state.add_alarm("07:00", Some("wake".to_string())).unwrap();
        let inactive = f.state.add_alarm("07:00", None).unwrap();
        f.state.toggle_alarm(&inactive.id).unwrap();

        f.clock.advance(Duration::from_secs(1));
        let events = f.state.tick().unwrap();

        assert_eq!(ringing_started(&events), 1);
        assert_eq!(f.state.ringing().unwrap(), Some(RingingAlarm::Alarm(active)));
    }

    #[test]
    fn nothing_fires_while_already_ringing() {
        let f = fixture(at(7, 0, 0));
        f.state.add_alarm("07:00", None).unwrap();
        f.state.add_alarm("07:01", None).unwrap();
        assert_eq!(ringing_started(&f.state.tick().unwrap()), 1);

        f.clock.set_now(at(7, 1, 0));
        let events = f.state.tick().unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn alarm_wins_tie_with_timer_completion() {
        let f = fixture(at(6, 59, 59));
        let alarm = f.state.add_alarm("07:00", None).unwrap();
        f.state.start_timer(2).unwrap();
        f.state.tick().unwrap();

        f.clock.advance(Duration::from_secs(1));
        let events = f.state.tick().unwrap();

        assert_eq!(
            events,
            vec![
                ClockEvent::AlarmTriggered { alarm: alarm.clone() },
                ClockEvent::RingingStarted { ringing: RingingAlarm::Alarm(alarm.clone()), ascending: true },
                ClockEvent::TimerFinished,
            ]
        );
        assert_eq!(f.state.ringing().unwrap(), Some(RingingAlarm::Alarm(alarm)));
        assert!(!f.state.timer().unwrap().is_running());
    }

    #[test]
    fn timer_completion_rings_pseudo_alarm() {
        let f = fixture(at(12, 0, 10));
        f.state.start_timer(2).unwrap();

        f.clock.advance(Duration::from_secs(1));
        let first = f.state.tick().unwrap();
        assert!(first.is_empty());
        let timer = f.state.timer().unwrap();
        assert_eq!((timer.time_left_seconds(), timer.is_running()), (1, true));

        f.clock.advance(Duration::from_secs(1));
        let second = f.state.tick().unwrap();
        assert_eq!(second.iter().filter(|e| **e == ClockEvent::TimerFinished).count(), 1);
        assert_eq!(
            f.state.ringing().unwrap(),
            Some(RingingAlarm::TimerFinished { finished_at: "12:00:12".to_string() })
        );

        f.clock.advance(Duration::from_secs(1));
        assert!(f.state.tick().unwrap().is_empty());
    }

    #[test]
    fn stop_alarm_clears_slot_and_stops_audio() {
        let f = fixture(at(7, 0, 0));
        f.state.add_alarm("07:00", None).unwrap();
        f.state.tick().unwrap();

        assert!(f.state.stop_alarm().unwrap().is_some());
        assert_eq!(f.state.ringing().unwrap(), None);
        assert_eq!(f.audio.calls.lock().unwrap().last().map(String::as_str), Some("stop"));
        assert_eq!(f.state.ramp_volume().unwrap(), None);
    }

    #[test]
    fn events_reach_subscribers() {
        let f = fixture(at(7, 0, 0));
        let mut rx = f.state.subscribe();
        f.state.add_alarm("07:00", None).unwrap();

        f.state.tick().unwrap();
        f.state.stop_alarm().unwrap();

        assert!(matches!(rx.try_recv().unwrap(), ClockEvent::AlarmTriggered { .. }));
        assert!(matches!(rx.try_recv().unwrap(), ClockEvent::RingingStarted { ascending: true, .. }));
        assert_eq!(rx.try_recv().unwrap(), ClockEvent::RingingStopped);
    }

    #[test]
    fn alarms_are_sorted_and_persisted() {
        let f = fixture(at(9, 0, 0));
        f.state.add_alarm("22:15", None).unwrap();
        f.state.add_alarm("6:45", None).unwrap();

        let times: Vec<String> = f.state.alarms().unwrap().into_iter().map(|a| a.time).collect();
        assert_eq!(times, vec!["06:45", "22:15"]);

        let reloaded = AppState::new(Capabilities {
            clock: f.clock.clone(),
            store: f.store.clone(),
            audio: f.audio.clone(),
            haptics: Arc::new(LogHapticSink),
        });
        assert_eq!(reloaded.alarms().unwrap(), f.state.alarms().unwrap());
    }

    #[test]
    fn alarm_ids_stay_unique_within_one_millisecond() {
        let f = fixture(at(9, 0, 0));
        let a = f.state.add_alarm("07:00", None).unwrap();
        let b = f.state.add_alarm("07:00", None).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn unknown_alarm_id_is_reported() {
        let f = fixture(at(9, 0, 0));
        assert!(matches!(f.state.toggle_alarm("nope"), Err(ClockError::AlarmNotFound(_))));
        assert!(matches!(f.state.delete_alarm("nope"), Err(ClockError::AlarmNotFound(_))));
    }

    #[test]
    fn invalid_alarm_time_does_not_mutate() {
        let f = fixture(at(9, 0, 0));
        assert!(f.state.add_alarm("25:00", None).is_err());
        assert!(f.state.alarms().unwrap().is_empty());
        assert_eq!(f.store.get(ALARMS_KEY).unwrap(), None);
    }

    #[test]
    fn settings_round_trip_without_transient_fields() {
        let f = fixture(at(9, 0, 0));
        let patch: SettingsPatch = serde_json::from_str(
            r#"{"theme":"sage","background":"aurora","language":"en","is24Hour":false,
                "soundId":"custom","customSoundUrl":"/tmp/a.ogg","customSoundName":"a.ogg",
                "soundStartTime":30,"ascendingVolume":false}"#,
        )
        .unwrap();
        let saved = f.state.update_settings(patch).unwrap();

        let reloaded = AppState::new(Capabilities::headless(f.clock.clone()));
        assert_eq!(reloaded.settings().unwrap(), AppSettings::default());

        let reloaded = AppState::new(Capabilities {
            clock: f.clock.clone(),
            store: f.store.clone(),
            audio: f.audio.clone(),
            haptics: Arc::new(LogHapticSink),
        });
        assert_eq!(reloaded.settings().unwrap(), saved.persistable());
    }

    #[test]
    fn custom_sound_is_used_for_the_session() {
        let f = fixture(at(7, 0, 0));
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"soundId":"custom","customSoundUrl":"/tmp/a.ogg","soundStartTime":5}"#).unwrap();
        f.state.update_settings(patch).unwrap();
        f.state.add_alarm("07:00", None).unwrap();

        f.state.tick().unwrap();

        let calls = f.audio.calls.lock().unwrap();
        assert_eq!(calls[0], "play /tmp/a.ogg @5s vol=0.0");
    }

    #[test]
    fn stopwatch_follows_monotonic_clock() {
        let f = fixture(at(9, 0, 0));
        let mut running = f.state.watch_stopwatch_running();
        f.state.start_stopwatch().unwrap();
        assert!(*running.borrow_and_update());

        f.clock.advance(Duration::from_millis(1_250));
        let lap = f.state.lap_stopwatch().unwrap();
        assert_eq!(lap.absolute_elapsed_ms, 1_250);

        f.clock.advance(Duration::from_millis(750));
        assert_eq!(f.state.sample_stopwatch().unwrap(), 2_000);
        f.state.pause_stopwatch().unwrap();
        assert!(!*running.borrow_and_update());

        f.clock.advance(Duration::from_secs(5));
        assert_eq!(f.state.stopwatch().unwrap().elapsed_ms(), 2_000);
    }

    #[test]
    fn tick_publishes_clock_sample() {
        let f = fixture(at(9, 0, 0));
        f.clock.advance(Duration::from_secs(3));
        f.state.tick().unwrap();
        assert_eq!(f.state.current_time(), at(9, 0, 3));
    }

    #[test]
    fn teardown_silences_ringer_and_flushes_settings() {
        let f = fixture(at(7, 0, 0));
        f.state.add_alarm("07:00", None).unwrap();
        f.state.tick().unwrap();

        f.state.teardown().unwrap();
        assert_eq!(f.state.ringing().unwrap(), None);
        let saved: AppSettings = load_json(f.store.as_ref(), SETTINGS_KEY);
        assert_eq!(saved, AppSettings::default().persistable());
    }

    #[test]
    fn stored_alarms_are_normalized_and_invalid_ones_dropped() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                ALARMS_KEY,
                r#"[{"id":"1","time":"7:00","label":"early","isActive":true},
                    {"id":"2","time":"25:99","label":"broken","isActive":true}]"#,
            )
            .unwrap();
        let clock = Arc::new(ManualTimeSource::new(at(7, 0, 0)));
        let state = AppState::new(Capabilities {
            clock,
            store,
            audio: Arc::new(RecordingAudio::default()),
            haptics: Arc::new(LogHapticSink),
        });

        let alarms = state.alarms().unwrap();
        assert_eq!(alarms.len(), 1);
        assert_eq!(alarms[0].time, "07:00");
        assert_eq!(ringing_started(&state.tick().unwrap()), 1);
    }
}
