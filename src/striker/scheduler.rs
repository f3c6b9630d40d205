// Striker - quarter-hour chime scheduler

use super::clock::{Clock, next_quarter, quarter_floor, quarter_length};
use super::observer::{Observer, ObserverChain};
use super::theme::{AssetKind, ThemeLibrary};
use crate::carillon::Carillon;
use crate::error::Result;
use crate::melody::Melody;
use crate::messaging::{Notification, NotificationCategory, NotificationSink, notify};
use arc_swap::ArcSwap;
use chrono::{NaiveDateTime, TimeDelta, Timelike};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest single sleep of the timer loop; the clock is re-read after each
const MAX_SLEEP_SLICE: Duration = Duration::from_secs(1);

pub const DEFAULT_PRIORITY: i32 = -1;

pub fn default_lead_time() -> TimeDelta {
    TimeDelta::seconds(7 * 60 + 30)
}

#[derive(Debug, Clone)]
pub struct StrikerConfig {
    pub theme: String,
    pub priority: i32,
    /// Offset added to the firing time before deriving hour and quarter
    pub lead_time: TimeDelta,
}

impl Default for StrikerConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            priority: DEFAULT_PRIORITY,
            lead_time: default_lead_time(),
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeOutcome {
    /// Handed to the carillon and accepted
    Played,
    /// Outranked by a melody already playing
    Rejected,
    /// An observer cancelled the tick
    Vetoed,
    /// Accepted, but the tick had no notes (missing assets)
    Silent,
}

/// Quarter-hour striker
///
/// Clones share the active theme and the observer chain.
#[derive(Clone)]
pub struct Striker {
    carillon: Carillon,
    library: Arc<ThemeLibrary>,
    theme: Arc<ArcSwap<String>>,
    observers: Arc<Mutex<ObserverChain>>,
    priority: i32,
    lead_time: TimeDelta,
    notifications: Option<NotificationSink>,
}

impl Striker {
    pub fn new(carillon: Carillon, library: ThemeLibrary, config: StrikerConfig) -> Self {
        if !library.exists(&config.theme) {
            warn!(
                "Theme '{}' not found in {}",
                config.theme,
                library.base().display()
            );
        }

        Self {
            carillon,
            library: Arc::new(library),
            theme: Arc::new(ArcSwap::from_pointee(config.theme)),
            observers: Arc::new(Mutex::new(ObserverChain::new())),
            priority: config.priority,
            lead_time: config.lead_time,
            notifications: None,
        }
    }

    pub fn with_notifications(mut self, sink: NotificationSink) -> Self {
        self.notifications = Some(sink);
        self
    }

    pub fn theme(&self) -> String {
        self.theme.load().as_ref().clone()
    }

    /// Switch themes; unknown names leave the current theme in place
    pub fn set_theme(&self, name: &str) -> bool {
        if !self.library.exists(name) {
            warn!("Ignoring unknown theme '{}'", name);
            return false;
        }
        self.theme.store(Arc::new(name.to_string()));
        info!("Theme set to '{}'", name);
        true
    }

    pub fn library(&self) -> &ThemeLibrary {
        &self.library
    }

    pub fn carillon(&self) -> &Carillon {
        &self.carillon
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Append an observer; observers run in registration order
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(Melody, u32, u32) -> Option<Melody> + Send + Sync + 'static,
    {
        let observer: Observer = Box::new(observer);
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }

    /// Hour (0..24) and quarter (0..4) a tick fired at `now` stands for
    pub fn nominal_time(&self, now: NaiveDateTime) -> (u32, u32) {
        let nominal = now + self.lead_time;
        (nominal.hour(), nominal.minute() / 15)
    }

    /// Raw chime for a nominal time, with the theme override applied
    pub fn compose(&self, hour: u32, quarter: u32) -> Melody {
        let theme = self.theme();
        let mut melody = Melody::new();

        let chime = if quarter == 0 { 4 } else { quarter };
        if let Some(asset) = self.load_asset(&theme, AssetKind::Quarter(chime)) {
            melody += asset;
        }

        if quarter == 0 {
            let strokes = match hour % 12 {
                0 => 12,
                h => h as usize,
            };
            if let Some(asset) = self.load_asset(&theme, AssetKind::Hour) {
                melody += asset * strokes;
            }
        }

        if let Some(theme_override) = self.library.override_for(&theme) {
            if let Err(e) = melody.set_tempo(theme_override.tempo) {
                warn!("Theme '{}' override ignored: {}", theme, e);
            }
            if let Err(e) = melody.set_transpose(theme_override.transpose) {
                warn!("Theme '{}' override ignored: {}", theme, e);
            }
        }

        melody
    }

    fn load_asset(&self, theme: &str, kind: AssetKind) -> Option<Melody> {
        let path = self.library.resolve(theme, kind)?;
        match Melody::from_asset(&path) {
            Ok(melody) => Some(melody),
            Err(e) => {
                warn!("Skipping {:?} asset of theme '{}': {}", kind, theme, e);
                None
            }
        }
    }

    /// Run one tick as if the timer fired at `now`
    pub fn strike_at(&self, now: NaiveDateTime) -> StrikeOutcome {
        let (hour, quarter) = self.nominal_time(now);
        info!("Striking: {:02}:{:02}", hour, quarter * 15);

        let melody = self.compose(hour, quarter);
        let folded = {
            let observers = self.observers.lock().unwrap_or_else(|e| e.into_inner());
            observers.fold(melody, hour, quarter)
        };

        let outcome = match folded {
            None => {
                info!("Tick {:02}:{:02} vetoed", hour, quarter * 15);
                StrikeOutcome::Vetoed
            }
            Some(melody) => {
                let silent = melody.is_empty();
                if self.carillon.play(melody, self.priority) {
                    if silent {
                        debug!("Tick {:02}:{:02} has nothing to play", hour, quarter * 15);
                        StrikeOutcome::Silent
                    } else {
                        StrikeOutcome::Played
                    }
                } else {
                    debug!("Tick {:02}:{:02} outranked", hour, quarter * 15);
                    StrikeOutcome::Rejected
                }
            }
        };

        if let Some(sink) = &self.notifications {
            notify(
                sink,
                Notification::info(
                    NotificationCategory::Striker,
                    format!("{:02}:{:02} {:?}", hour, quarter * 15, outcome),
                ),
            );
        }
        outcome
    }

    /// Timer loop: fires one tick per quarter boundary until `shutdown`
    /// receives a message or disconnects
    ///
    /// Boundaries are derived from the clock on every iteration. When several
    /// boundaries pass unobserved (suspend, clock jump) only the latest fires.
    pub fn run(&self, clock: &dyn Clock, shutdown: &Receiver<()>) {
        let mut last_fired: Option<NaiveDateTime> = None;
        let mut next = next_quarter(clock.now());
        info!("Striker running, first boundary {}", next);

        loop {
            let now = clock.now();

            if next - now > quarter_length() {
                warn!("Clock moved backwards to {}, rescheduling", now);
                next = next_quarter(now);
                if last_fired.is_some_and(|fired| fired - now > quarter_length()) {
                    last_fired = None;
                }
            }

            if now >= next {
                let boundary = quarter_floor(now);
                if boundary > next {
                    warn!("Missed boundaries {} to {}, firing the latest", next, boundary);
                }
                if last_fired.is_none_or(|fired| boundary > fired) {
                    self.strike_at(boundary);
                    last_fired = Some(boundary);
                }
                next = boundary + quarter_length();
                continue;
            }

            let wait = (next - now)
                .to_std()
                .unwrap_or_default()
                .min(MAX_SLEEP_SLICE);
            match shutdown.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("Striker stopped");
                    return;
                }
            }
        }
    }

    /// Start the timer loop on its own thread
    pub fn spawn(&self, clock: Arc<dyn Clock>) -> Result<StrikerHandle> {
        let (shutdown_tx, shutdown_rx) = bounded(1);
        let striker = self.clone();
        let thread = thread::Builder::new()
            .name("striker".to_string())
            .spawn(move || striker.run(clock.as_ref(), &shutdown_rx))?;

        Ok(StrikerHandle {
            shutdown: shutdown_tx,
            thread: Some(thread),
        })
    }
}

/// Owner of a running timer loop; dropping it stops the loop
pub struct StrikerHandle {
    shutdown: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl StrikerHandle {
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.shutdown.try_send(());
            if thread.join().is_err() {
                warn!("Striker thread panicked");
            }
        }
    }
}

impl Drop for StrikerHandle {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
