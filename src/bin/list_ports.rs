// List the MIDI output ports the carillon can play on
// Run with: cargo run --bin list_ports

use carillon::midi::MidiDeviceManager;

fn main() {
    let devices = MidiDeviceManager::new().list_output_ports();

    if devices.is_empty() {
        println!("No MIDI output ports found");
        return;
    }

    println!("MIDI output ports:");
    for device in devices {
        let marker = if device.is_default { "  (default)" } else { "" };
        println!("  [{}] {}{}", device.id, device.name, marker);
    }
}
