// MIDI output port discovery

use midir::MidiOutput as MidirOutput;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiDeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

pub struct MidiDeviceManager;

impl MidiDeviceManager {
    pub fn new() -> Self {
        Self
    }

    /// List every MIDI output port currently available
    pub fn list_output_ports(&self) -> Vec<MidiDeviceInfo> {
        let mut devices = Vec::new();

        if let Ok(midi_out) = MidirOutput::new("Carillon MIDI Scanner") {
            for (index, port) in midi_out.ports().iter().enumerate() {
                if let Ok(name) = midi_out.port_name(port) {
                    devices.push(MidiDeviceInfo {
                        id: format!("midi_out_{}", index),
                        name,
                        // The first port is what MidirOutput::open(None) picks
                        is_default: index == 0,
                    });
                }
            }
        }

        devices
    }

    /// Whether a port with this exact name is present
    pub fn has_output_port(&self, device_name: &str) -> bool {
        self.list_output_ports()
            .iter()
            .any(|device| device.name == device_name)
    }
}

impl Default for MidiDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
