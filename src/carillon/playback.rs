// Playback thread - walks a melody's events and drives the device

use crate::error::{CarillonError, Result};
use crate::melody::Melody;
use crate::messaging::{Notification, NotificationCategory, NotificationSink, notify};
use crate::midi::output::OutputDevice;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

pub(crate) type SharedDevice = Arc<Mutex<Box<dyn OutputDevice>>>;

/// How a playback thread ended
#[derive(Debug)]
pub(crate) enum PlaybackEnd {
    Finished,
    Stopped,
    Aborted(CarillonError),
}

/// One running melody: its priority and the means to halt it
pub(crate) struct Playback {
    pub priority: i32,
    stop_flag: Arc<AtomicBool>,
    stop_tx: Sender<()>,
    handle: JoinHandle<PlaybackEnd>,
}

impl Playback {
    pub fn spawn(
        melody: Melody,
        priority: i32,
        device: SharedDevice,
        notifications: Option<NotificationSink>,
    ) -> Result<Self> {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = bounded(1);

        let flag = Arc::clone(&stop_flag);
        let handle = thread::Builder::new()
            .name("carillon-playback".to_string())
            .spawn(move || {
                let end = run(&melody, &device, &flag, &stop_rx);
                if let Some(sink) = notifications {
                    let note = match &end {
                        PlaybackEnd::Finished => Notification::info(
                            NotificationCategory::Playback,
                            format!("finished (priority {})", priority),
                        ),
                        PlaybackEnd::Stopped => Notification::info(
                            NotificationCategory::Playback,
                            format!("stopped (priority {})", priority),
                        ),
                        PlaybackEnd::Aborted(e) => {
                            Notification::error(NotificationCategory::Device, e.to_string())
                        }
                    };
                    notify(&sink, note);
                }
                end
            })?;

        Ok(Self {
            priority,
            stop_flag,
            stop_tx,
            handle,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the thread and wait until it has exited
    pub fn halt(self) -> PlaybackEnd {
        self.stop_flag.store(true, Ordering::SeqCst);
        // Wakes the thread if it is waiting between two events
        let _ = self.stop_tx.try_send(());
        self.join()
    }

    /// Wait for the thread without signalling it
    pub fn join(self) -> PlaybackEnd {
        self.handle.join().unwrap_or_else(|_| {
            PlaybackEnd::Aborted(CarillonError::DeviceIo("playback thread panicked".into()))
        })
    }
}

fn run(
    melody: &Melody,
    device: &SharedDevice,
    stop_flag: &AtomicBool,
    stop_rx: &Receiver<()>,
) -> PlaybackEnd {
    debug!(
        "Playback started: {} events, {:.1}s",
        melody.len(),
        melody.duration().as_secs_f64()
    );

    for event in melody.effective_events() {
        if stop_flag.load(Ordering::SeqCst) {
            return PlaybackEnd::Stopped;
        }

        if event.delta > 0.0 {
            let wait = Duration::try_from_secs_f64(event.delta).unwrap_or(Duration::MAX);
            match stop_rx.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return PlaybackEnd::Stopped,
            }
        }

        // A stop issued exactly at the boundary must not emit one more event
        if stop_flag.load(Ordering::SeqCst) {
            return PlaybackEnd::Stopped;
        }

        if !event.is_sounding() {
            continue;
        }

        let sent = match device.lock() {
            Ok(mut device) => device.send(&event.kind.to_bytes()),
            Err(_) => Err(CarillonError::DeviceIo("output device lock poisoned".into())),
        };
        if let Err(e) = sent {
            warn!("Playback aborted: {}", e);
            return PlaybackEnd::Aborted(e);
        }
    }

    PlaybackEnd::Finished
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::event::NoteEvent;
    use crate::midi::output::MemoryOutput;
    use std::time::Instant;

    fn shared(output: &MemoryOutput) -> SharedDevice {
        Arc::new(Mutex::new(Box::new(output.clone())))
    }

    #[test]
    fn test_plays_sounding_events_in_order() {
        let output = MemoryOutput::new();
        let melody = Melody::from_events(vec![
            NoteEvent::note_on(0.0, 60, 100),
            NoteEvent::marker(0.01),
            NoteEvent::note_on(0.01, 64, 100),
            NoteEvent::note_on(0.0, 67, 100),
        ]);

        let playback = Playback::spawn(melody, 0, shared(&output), None).unwrap();
        assert!(matches!(playback.join(), PlaybackEnd::Finished));
        assert_eq!(output.notes_played(), vec![60, 64, 67]);
    }

    #[test]
    fn test_halt_interrupts_a_long_gap() {
        let output = MemoryOutput::new();
        let melody = Melody::from_events(vec![
            NoteEvent::note_on(0.0, 60, 100),
            NoteEvent::note_on(30.0, 62, 100),
        ]);

        let playback = Playback::spawn(melody, 0, shared(&output), None).unwrap();
        thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        assert!(matches!(playback.halt(), PlaybackEnd::Stopped));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(output.notes_played(), vec![60]);
    }

    #[test]
    fn test_device_error_aborts() {
        let output = MemoryOutput::new();
        output.set_failing(true);
        let melody = Melody::from_events(vec![NoteEvent::note_on(0.0, 60, 100)]);

        let playback = Playback::spawn(melody, 0, shared(&output), None).unwrap();
        assert!(matches!(
            playback.join(),
            PlaybackEnd::Aborted(CarillonError::DeviceIo(_))
        ));
    }
}
