// Carillon - owns the output device and arbitrates playback by priority

use super::playback::{Playback, PlaybackEnd, SharedDevice};
use crate::error::{CarillonError, Result};
use crate::melody::Melody;
use crate::messaging::{Notification, NotificationCategory, NotificationSink, notify};
use crate::midi::event::EventKind;
use crate::midi::output::{CC_VOLUME, OutputDevice};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Cloneable handle to the single carillon output
///
/// At most one melody plays at a time. A new request preempts the running
/// one when its priority is greater than or equal to the running priority,
/// and is rejected otherwise.
#[derive(Clone)]
pub struct Carillon {
    inner: Arc<Inner>,
}

struct Inner {
    device: SharedDevice,
    /// Serializes admission: play/stop never interleave
    current: Mutex<Option<Playback>>,
    /// f32 bits
    volume: AtomicU32,
    last_error: Mutex<Option<String>>,
    notifications: Option<NotificationSink>,
}

impl Carillon {
    pub fn new(device: Box<dyn OutputDevice>) -> Self {
        Self::build(device, None)
    }

    pub fn with_notifications(device: Box<dyn OutputDevice>, sink: NotificationSink) -> Self {
        Self::build(device, Some(sink))
    }

    fn build(device: Box<dyn OutputDevice>, notifications: Option<NotificationSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                device: Arc::new(Mutex::new(device)),
                current: Mutex::new(None),
                volume: AtomicU32::new(1.0f32.to_bits()),
                last_error: Mutex::new(None),
                notifications,
            }),
        }
    }

    /// Request playback of `melody` at `priority`
    ///
    /// Returns immediately with `false` when a higher-priority melody is
    /// playing. On acceptance the running melody (if any) is stopped and
    /// the device reset before the new one starts.
    pub fn play(&self, melody: Melody, priority: i32) -> bool {
        let mut current = self.inner.current();

        if let Some(running) = current.as_ref() {
            if !running.is_finished() && running.priority > priority {
                debug!(
                    "Rejected priority {} while priority {} is playing",
                    priority, running.priority
                );
                return false;
            }
        }

        if let Some(previous) = current.take() {
            let result = if previous.is_finished() {
                self.inner.settle(previous.join())
            } else {
                info!("Priority {} preempts priority {}", priority, previous.priority);
                self.inner.halt(previous)
            };
            if let Err(e) = result {
                warn!("Previous playback ended with error: {}", e);
            }
        }

        let events = melody.len();
        match Playback::spawn(
            melody,
            priority,
            Arc::clone(&self.inner.device),
            self.inner.notifications.clone(),
        ) {
            Ok(playback) => {
                *current = Some(playback);
                self.inner.publish(Notification::info(
                    NotificationCategory::Playback,
                    format!("playing {} events at priority {}", events, priority),
                ));
                true
            }
            Err(e) => {
                warn!("Could not start playback: {}", e);
                self.inner.record_error(&e);
                false
            }
        }
    }

    /// Stop the running melody, wait for it and silence the device
    ///
    /// Returns the device error that aborted the playback, if any.
    pub fn stop(&self) -> Result<()> {
        let previous = self.inner.current().take();
        match previous {
            None => Ok(()),
            Some(playback) if playback.is_finished() => self.inner.settle(playback.join()),
            Some(playback) => self.inner.halt(playback),
        }
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.inner.volume.load(Ordering::Relaxed))
    }

    /// Set the master volume (clamped to 0..=1) and send it right away
    pub fn set_volume(&self, volume: f32) -> Result<()> {
        if volume.is_nan() {
            return Err(CarillonError::InvalidParameter(
                "volume must be a number".to_string(),
            ));
        }
        let volume = volume.clamp(0.0, 1.0);
        self.inner.volume.store(volume.to_bits(), Ordering::Relaxed);

        let message = EventKind::ControlChange {
            channel: 0,
            controller: CC_VOLUME,
            value: (volume * 127.0) as u8,
        };
        let mut device = self.inner.device()?;
        device.send(&message.to_bytes())
    }

    pub fn is_playing(&self) -> bool {
        self.inner
            .current()
            .as_ref()
            .is_some_and(|playback| !playback.is_finished())
    }

    /// Priority of the melody currently playing
    pub fn current_priority(&self) -> Option<i32> {
        self.inner
            .current()
            .as_ref()
            .filter(|playback| !playback.is_finished())
            .map(|playback| playback.priority)
    }

    /// Most recent device error that aborted a playback
    pub fn last_error(&self) -> Option<String> {
        self.inner
            .last_error
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

impl Inner {
    fn current(&self) -> MutexGuard<'_, Option<Playback>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn device(&self) -> Result<MutexGuard<'_, Box<dyn OutputDevice>>> {
        self.device
            .lock()
            .map_err(|_| CarillonError::DeviceIo("output device lock poisoned".into()))
    }

    fn halt(&self, playback: Playback) -> Result<()> {
        let ended = self.settle(playback.halt());
        let reset = self.device().and_then(|mut device| device.reset());
        if let Err(e) = &reset {
            warn!("Device reset failed: {}", e);
            self.record_error(e);
        }
        ended.and(reset)
    }

    fn settle(&self, end: PlaybackEnd) -> Result<()> {
        match end {
            PlaybackEnd::Finished | PlaybackEnd::Stopped => Ok(()),
            PlaybackEnd::Aborted(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    fn record_error(&self, error: &CarillonError) {
        if let Ok(mut last) = self.last_error.lock() {
            *last = Some(error.to_string());
        }
    }

    fn publish(&self, notification: Notification) {
        if let Some(sink) = &self.notifications {
            notify(sink, notification);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let current = self.current.get_mut().map(Option::take).unwrap_or(None);
        if let Some(playback) = current {
            let _ = playback.halt();
        }
    }
}
