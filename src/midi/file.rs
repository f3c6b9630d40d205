// MIDI file assets - SMF tracks merged into seconds-timed note events

use crate::error::{CarillonError, Result};
use crate::midi::event::{EventKind, NoteEvent};
use midly::num::{u4, u7, u15, u24, u28};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Tempo assumed until the first tempo meta event (120 BPM)
pub const DEFAULT_TEMPO_MICROS: u32 = 500_000;

/// Resolution used when writing assets
pub const WRITE_TICKS_PER_BEAT: u16 = 480;

/// Load a melody asset from disk
pub fn load(path: &Path) -> Result<Vec<NoteEvent>> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CarillonError::AssetNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(CarillonError::Io(e)),
    };
    parse(&data, path)
}

/// Parse SMF bytes. `origin` only labels errors.
pub fn parse(data: &[u8], origin: &Path) -> Result<Vec<NoteEvent>> {
    let corrupt = |reason: String| CarillonError::AssetCorrupt {
        path: origin.to_path_buf(),
        reason,
    };

    let smf = Smf::parse(data).map_err(|e| corrupt(e.to_string()))?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int(),
        Timing::Timecode(_, _) => return Err(corrupt("SMPTE timing is not supported".into())),
    };
    if ticks_per_beat == 0 {
        return Err(corrupt("zero ticks per beat".into()));
    }
    // Format 2 tracks are independent sequences
    if smf.header.format == Format::Sequential {
        return Err(corrupt("format 2 (sequential) files are not supported".into()));
    }

    // (absolute tick, event) - stable sort keeps track order on ties
    let mut merged: Vec<(u64, &TrackEventKind)> = Vec::new();
    for track in &smf.tracks {
        let mut tick = 0u64;
        for event in track {
            tick += event.delta.as_int() as u64;
            merged.push((tick, &event.kind));
        }
    }
    merged.sort_by_key(|(tick, _)| *tick);

    let mut tempo = DEFAULT_TEMPO_MICROS;
    let mut last_tick = 0u64;
    let mut events = Vec::with_capacity(merged.len());

    for (tick, kind) in merged {
        let delta_ticks = tick - last_tick;
        last_tick = tick;
        let delta = delta_ticks as f64 * tempo as f64 / ticks_per_beat as f64 / 1_000_000.0;

        if let TrackEventKind::Meta(MetaMessage::Tempo(t)) = kind {
            tempo = t.as_int();
        }

        events.push(NoteEvent::new(delta, convert(kind)));
    }

    debug!(
        "Parsed {} events from {} ({} tracks, {} ticks per beat)",
        events.len(),
        origin.display(),
        smf.tracks.len(),
        ticks_per_beat
    );

    Ok(events)
}

fn convert(kind: &TrackEventKind) -> EventKind {
    let TrackEventKind::Midi { channel, message } = kind else {
        return EventKind::Marker;
    };
    let channel = channel.as_int();

    match *message {
        MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => EventKind::NoteOff {
            channel,
            note: key.as_int(),
            velocity: 0,
        },
        MidiMessage::NoteOn { key, vel } => EventKind::NoteOn {
            channel,
            note: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::NoteOff { key, vel } => EventKind::NoteOff {
            channel,
            note: key.as_int(),
            velocity: vel.as_int(),
        },
        MidiMessage::Controller { controller, value } => EventKind::ControlChange {
            channel,
            controller: controller.as_int(),
            value: value.as_int(),
        },
        MidiMessage::ProgramChange { program } => EventKind::ProgramChange {
            channel,
            program: program.as_int(),
        },
        MidiMessage::PitchBend { bend } => EventKind::PitchBend {
            channel,
            value: bend.0.as_int() as i16 - 8192,
        },
        // Aftertouch is not used by carillon assets
        _ => EventKind::Marker,
    }
}

/// Write events as a single-track SMF at 120 BPM.
///
/// Deltas are rounded to the nearest tick; markers become text meta events
/// so that their timing survives.
pub fn write(events: &[NoteEvent], path: &Path) -> Result<()> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(WRITE_TICKS_PER_BEAT)),
    ));

    let ticks_per_second =
        WRITE_TICKS_PER_BEAT as f64 * 1_000_000.0 / DEFAULT_TEMPO_MICROS as f64;

    let mut track = vec![TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(DEFAULT_TEMPO_MICROS))),
    }];

    for event in events {
        let delta = u28::new((event.delta * ticks_per_second).round() as u32);
        let kind = match event.kind {
            EventKind::NoteOn {
                channel,
                note,
                velocity,
            } => midi_kind(channel, MidiMessage::NoteOn {
                key: u7::new(note & 0x7F),
                vel: u7::new(velocity & 0x7F),
            }),
            EventKind::NoteOff {
                channel,
                note,
                velocity,
            } => midi_kind(channel, MidiMessage::NoteOff {
                key: u7::new(note & 0x7F),
                vel: u7::new(velocity & 0x7F),
            }),
            EventKind::ControlChange {
                channel,
                controller,
                value,
            } => midi_kind(channel, MidiMessage::Controller {
                controller: u7::new(controller & 0x7F),
                value: u7::new(value & 0x7F),
            }),
            EventKind::ProgramChange { channel, program } => {
                midi_kind(channel, MidiMessage::ProgramChange {
                    program: u7::new(program & 0x7F),
                })
            }
            EventKind::PitchBend { channel, value } => {
                let raw = (value as i32 + 8192).clamp(0, 16383) as u16;
                midi_kind(channel, MidiMessage::PitchBend {
                    bend: midly::PitchBend(midly::num::u14::new(raw)),
                })
            }
            EventKind::Marker => TrackEventKind::Meta(MetaMessage::Text(&b"marker"[..])),
        };
        track.push(TrackEvent { delta, kind });
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    smf.save(path)?;
    Ok(())
}

fn midi_kind(channel: u8, message: MidiMessage) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::new(channel & 0x0F),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sounding(events: &[NoteEvent]) -> Vec<NoteEvent> {
        events.iter().copied().filter(|e| e.is_sounding()).collect()
    }

    #[test]
    fn test_missing_file_is_asset_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("missing.mid")).unwrap_err();
        assert!(matches!(err, CarillonError::AssetNotFound(_)));
    }

    #[test]
    fn test_garbage_is_asset_corrupt() {
        let err = parse(b"not a midi file", Path::new("garbage.mid")).unwrap_err();
        assert!(matches!(err, CarillonError::AssetCorrupt { .. }));
    }

    #[test]
    fn test_write_then_load_keeps_timing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q1.mid");
        let events = vec![
            NoteEvent::note_on(0.0, 60, 100),
            NoteEvent::note_off(0.5, 60),
            NoteEvent::note_on(0.25, 64, 100),
            NoteEvent::note_off(1.0, 64),
        ];
        write(&events, &path).unwrap();

        let loaded = sounding(&load(&path).unwrap());
        assert_eq!(loaded.len(), 4);
        for (a, b) in loaded.iter().zip(&events) {
            assert_eq!(a.kind, b.kind);
            assert!((a.delta - b.delta).abs() < 1e-6, "{} vs {}", a.delta, b.delta);
        }
    }

    #[test]
    fn test_sequential_format_is_rejected() {
        let mut smf = Smf::new(Header::new(
            Format::Sequential,
            Timing::Metrical(u15::new(480)),
        ));
        for key in [60, 67] {
            smf.tracks.push(vec![
                TrackEvent {
                    delta: u28::new(0),
                    kind: midi_kind(0, MidiMessage::NoteOn {
                        key: u7::new(key),
                        vel: u7::new(80),
                    }),
                },
                TrackEvent {
                    delta: u28::new(0),
                    kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
                },
            ]);
        }
        let mut buf = Vec::new();
        smf.write_std(&mut buf).unwrap();

        let err = parse(&buf, Path::new("songs.mid")).unwrap_err();
        assert!(matches!(err, CarillonError::AssetCorrupt { .. }));
    }

    #[test]
    fn test_tempo_meta_changes_seconds_per_tick() {
        // 60 BPM: one beat (480 ticks) lasts a full second
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(480)),
        ));
        smf.tracks.push(vec![
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(1_000_000))),
            },
            TrackEvent {
                delta: u28::new(480),
                kind: midi_kind(0, MidiMessage::NoteOn {
                    key: u7::new(72),
                    vel: u7::new(80),
                }),
            },
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
            },
        ]);
        let mut buf = Vec::new();
        smf.write_std(&mut buf).unwrap();

        let events = parse(&buf, Path::new("slow.mid")).unwrap();
        let note = events.iter().find(|e| e.is_sounding()).unwrap();
        assert!((note.delta - 1.0).abs() < 1e-9);
    }
}
