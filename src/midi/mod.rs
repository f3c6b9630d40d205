// MIDI layer - note events, melody assets and the output device

pub mod device;
pub mod event;
pub mod file;
pub mod output;

pub use device::{MidiDeviceInfo, MidiDeviceManager};
pub use event::{EventKind, NoteEvent};
pub use output::{MemoryOutput, MidirOutput, OutputDevice};
