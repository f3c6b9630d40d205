// MIDI output - the single device the carillon plays on

use crate::connection::reconnect::ReconnectionStrategy;
use crate::connection::status::{AtomicDeviceStatus, DeviceStatus};
use crate::error::{CarillonError, Result};
use crate::midi::event::EventKind;
use midir::{MidiOutput as MidirOutputClient, MidiOutputConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "Carillon MIDI Output";

/// Controller numbers used by the device reset
pub const CC_VOLUME: u8 = 7;
pub const CC_RESET_ALL_CONTROLLERS: u8 = 121;
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// Anything the player can send raw MIDI bytes to
pub trait OutputDevice: Send {
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Bring the instrument to a neutral state: all notes off and
    /// controllers reset on every channel
    fn reset(&mut self) -> Result<()> {
        for channel in 0..16u8 {
            for controller in [CC_ALL_NOTES_OFF, CC_RESET_ALL_CONTROLLERS] {
                let msg = EventKind::ControlChange {
                    channel,
                    controller,
                    value: 0,
                };
                self.send(&msg.to_bytes())?;
            }
        }
        Ok(())
    }
}

/// Hardware (or virtual) MIDI output port opened through midir
pub struct MidirOutput {
    connection: Option<MidiOutputConnection>,
    port_name: String,
    status: AtomicDeviceStatus,
}

impl MidirOutput {
    /// Open the port called `port_name`, or the first available port
    pub fn open(port_name: Option<&str>) -> Result<Self> {
        let (connection, name) = connect(port_name)?;
        info!("MIDI output connected: {}", name);
        Ok(Self {
            connection: Some(connection),
            port_name: name,
            status: AtomicDeviceStatus::new(DeviceStatus::Connected),
        })
    }

    /// Like [`MidirOutput::open`], retrying with exponential backoff while
    /// the port is not (yet) available
    pub fn open_with_retry(port_name: Option<&str>, mut strategy: ReconnectionStrategy) -> Result<Self> {
        loop {
            match Self::open(port_name) {
                Ok(output) => return Ok(output),
                Err(e) => match strategy.next_delay() {
                    Some(delay) => {
                        warn!(
                            "MIDI output not available ({}), attempt {} in {:?}",
                            e,
                            strategy.current_attempt(),
                            delay
                        );
                        thread::sleep(delay);
                    }
                    None => return Err(e),
                },
            }
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn status(&self) -> DeviceStatus {
        self.status.get()
    }

    /// Shared handle to the connection status
    pub fn status_handle(&self) -> AtomicDeviceStatus {
        self.status.clone()
    }

    fn reconnect(&mut self) -> Result<()> {
        self.status.set(DeviceStatus::Connecting);
        match connect(Some(&self.port_name)) {
            Ok((connection, _)) => {
                info!("MIDI output reconnected: {}", self.port_name);
                self.connection = Some(connection);
                self.status.set(DeviceStatus::Connected);
                Ok(())
            }
            Err(e) => {
                self.status.set(DeviceStatus::Error);
                Err(e)
            }
        }
    }
}

impl OutputDevice for MidirOutput {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        // A previous failure dropped the connection: try once to get it back
        if self.connection.is_none() {
            self.reconnect()?;
        }
        let Some(connection) = self.connection.as_mut() else {
            return Err(CarillonError::DeviceIo("MIDI output not connected".into()));
        };

        if let Err(e) = connection.send(bytes) {
            self.status.set(DeviceStatus::Error);
            self.connection = None;
            return Err(e.into());
        }
        Ok(())
    }
}

fn connect(port_name: Option<&str>) -> Result<(MidiOutputConnection, String)> {
    let midi_out = MidirOutputClient::new(CLIENT_NAME)?;
    let ports = midi_out.ports();

    let port = match port_name {
        Some(wanted) => ports.iter().find(|p| {
            midi_out
                .port_name(p)
                .map(|name| name == wanted)
                .unwrap_or(false)
        }),
        None => ports.first(),
    };

    let Some(port) = port else {
        return Err(CarillonError::DeviceIo(match port_name {
            Some(name) => format!("MIDI output port '{}' not found", name),
            None => "No MIDI output ports found".to_string(),
        }));
    };

    let name = midi_out
        .port_name(port)
        .unwrap_or_else(|_| "Unknown".to_string());
    let connection = midi_out.connect(port, "carillon-output")?;
    Ok((connection, name))
}

/// In-memory device recording everything sent to it.
///
/// Clones share the same log, so one clone can be handed to the player and
/// another kept for inspection. Used for dry runs and tests.
#[derive(Clone, Default)]
pub struct MemoryOutput {
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail with a device error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Raw messages in send order
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Parsed messages in send order
    pub fn sent_events(&self) -> Vec<EventKind> {
        self.sent()
            .iter()
            .filter_map(|bytes| EventKind::from_bytes(bytes))
            .collect()
    }

    /// Pitches of every note-on sent so far
    pub fn notes_played(&self) -> Vec<u8> {
        self.sent_events()
            .into_iter()
            .filter_map(|e| match e {
                EventKind::NoteOn { note, .. } => Some(note),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

impl OutputDevice for MemoryOutput {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CarillonError::DeviceIo("memory output set to fail".into()));
        }
        debug!("MIDI out: {:02X?}", bytes);
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(bytes.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_sends_notes_off_and_controller_reset_on_all_channels() {
        let mut output = MemoryOutput::new();
        output.reset().unwrap();

        let events = output.sent_events();
        assert_eq!(events.len(), 32);
        assert_eq!(
            events[0],
            EventKind::ControlChange {
                channel: 0,
                controller: CC_ALL_NOTES_OFF,
                value: 0
            }
        );
        assert_eq!(
            events[31],
            EventKind::ControlChange {
                channel: 15,
                controller: CC_RESET_ALL_CONTROLLERS,
                value: 0
            }
        );
    }

    #[test]
    fn test_clones_share_the_log() {
        let output = MemoryOutput::new();
        let mut handle = output.clone();
        handle.send(&[0x90, 60, 100]).unwrap();
        assert_eq!(output.notes_played(), vec![60]);

        output.clear();
        assert!(output.sent().is_empty());
    }

    #[test]
    fn test_failing_output_reports_device_error() {
        let output = MemoryOutput::new();
        output.set_failing(true);
        let mut handle = output.clone();
        let err = handle.send(&[0x90, 60, 100]).unwrap_err();
        assert!(matches!(err, CarillonError::DeviceIo(_)));
        assert!(output.sent().is_empty());
    }
}
