// Effective event view - tempo and transpose applied on read

use crate::midi::event::NoteEvent;
use std::slice;

/// Iterator over a melody's events with its playback parameters applied.
///
/// The raw events are never touched; every call to
/// [`Melody::effective_events`](super::Melody::effective_events) starts a
/// fresh view.
#[derive(Debug, Clone)]
pub struct EffectiveEvents<'a> {
    raw: slice::Iter<'a, NoteEvent>,
    tempo: f64,
    transpose: i32,
}

impl<'a> EffectiveEvents<'a> {
    pub(super) fn new(raw: &'a [NoteEvent], tempo: f64, transpose: i32) -> Self {
        Self {
            raw: raw.iter(),
            tempo,
            transpose,
        }
    }
}

/// Apply playback parameters to one raw event
pub fn apply(event: &NoteEvent, tempo: f64, transpose: i32) -> NoteEvent {
    NoteEvent {
        delta: event.delta / tempo,
        kind: event.kind.transposed(transpose),
    }
}

impl Iterator for EffectiveEvents<'_> {
    type Item = NoteEvent;

    fn next(&mut self) -> Option<NoteEvent> {
        self.raw
            .next()
            .map(|event| apply(event, self.tempo, self.transpose))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

impl ExactSizeIterator for EffectiveEvents<'_> {}
