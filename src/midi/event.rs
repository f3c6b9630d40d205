// MIDI event types - timed note events as stored in a melody

use tracing::debug;

/// One MIDI instruction, or a non-sounding marker (meta/sysex in the source file)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    /// Signed 14-bit value (-8192 to 8191)
    PitchBend { channel: u8, value: i16 },
    Marker,
}

/// Event with the time elapsed since the previous event of the same melody
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// Seconds since the previous event (never negative)
    pub delta: f64,
    pub kind: EventKind,
}

impl NoteEvent {
    pub fn new(delta: f64, kind: EventKind) -> Self {
        Self {
            delta: if delta.is_finite() { delta.max(0.0) } else { 0.0 },
            kind,
        }
    }

    pub fn note_on(delta: f64, note: u8, velocity: u8) -> Self {
        Self::new(
            delta,
            EventKind::NoteOn {
                channel: 0,
                note,
                velocity,
            },
        )
    }

    pub fn note_off(delta: f64, note: u8) -> Self {
        Self::new(
            delta,
            EventKind::NoteOff {
                channel: 0,
                note,
                velocity: 0,
            },
        )
    }

    pub fn marker(delta: f64) -> Self {
        Self::new(delta, EventKind::Marker)
    }

    pub fn is_sounding(&self) -> bool {
        self.kind.is_sounding()
    }
}

impl EventKind {
    /// Markers are never sent to the device
    pub fn is_sounding(&self) -> bool {
        !matches!(self, EventKind::Marker)
    }

    /// Pitch of note events, `None` for everything else
    pub fn note(&self) -> Option<u8> {
        match self {
            EventKind::NoteOn { note, .. } | EventKind::NoteOff { note, .. } => Some(*note),
            _ => None,
        }
    }

    /// Shift note events by `semitones`, clamped to the MIDI range.
    /// Every other kind is returned unchanged.
    pub fn transposed(self, semitones: i32) -> Self {
        let shift = |note: u8| {
            let target = note as i32 + semitones;
            let clamped = target.clamp(0, 127);
            if clamped != target {
                debug!("Note {} transposed by {} clamped to {}", note, semitones, clamped);
            }
            clamped as u8
        };
        match self {
            EventKind::NoteOn {
                channel,
                note,
                velocity,
            } => EventKind::NoteOn {
                channel,
                note: shift(note),
                velocity,
            },
            EventKind::NoteOff {
                channel,
                note,
                velocity,
            } => EventKind::NoteOff {
                channel,
                note: shift(note),
                velocity,
            },
            other => other,
        }
    }

    /// Encode as a raw channel-voice message. Markers encode to nothing.
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            EventKind::NoteOn {
                channel,
                note,
                velocity,
            } => vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            EventKind::NoteOff {
                channel,
                note,
                velocity,
            } => vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            EventKind::ControlChange {
                channel,
                controller,
                value,
            } => vec![0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F],
            EventKind::ProgramChange { channel, program } => {
                vec![0xC0 | (channel & 0x0F), program & 0x7F]
            }
            EventKind::PitchBend { channel, value } => {
                let unsigned = (value as i32 + 8192).clamp(0, 16383) as u16;
                vec![
                    0xE0 | (channel & 0x0F),
                    (unsigned & 0x7F) as u8,
                    ((unsigned >> 7) & 0x7F) as u8,
                ]
            }
            EventKind::Marker => Vec::new(),
        }
    }

    /// Parse a raw MIDI message
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }

        let status = bytes[0];
        let channel = status & 0x0F;

        match status & 0xF0 {
            0x90 if bytes.len() >= 3 => {
                // Velocity 0 = Note Off
                if bytes[2] == 0 {
                    Some(EventKind::NoteOff {
                        channel,
                        note: bytes[1],
                        velocity: 0,
                    })
                } else {
                    Some(EventKind::NoteOn {
                        channel,
                        note: bytes[1],
                        velocity: bytes[2],
                    })
                }
            }
            0x80 if bytes.len() >= 3 => Some(EventKind::NoteOff {
                channel,
                note: bytes[1],
                velocity: bytes[2],
            }),
            0xB0 if bytes.len() >= 3 => Some(EventKind::ControlChange {
                channel,
                controller: bytes[1],
                value: bytes[2],
            }),
            0xC0 if bytes.len() >= 2 => Some(EventKind::ProgramChange {
                channel,
                program: bytes[1],
            }),
            0xE0 if bytes.len() >= 3 => {
                let raw = ((bytes[2] as i16) << 7) | bytes[1] as i16;
                Some(EventKind::PitchBend {
                    channel,
                    value: raw - 8192,
                })
            }
            _ => None,
        }
    }
}
