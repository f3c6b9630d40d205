// Melody - raw note events plus tempo/transpose view parameters

use super::effective::EffectiveEvents;
use crate::error::{CarillonError, Result};
use crate::midi::event::NoteEvent;
use crate::midi::file;
use std::ops::{Add, AddAssign, Mul, MulAssign};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Largest accepted transposition, in semitones
pub const MAX_TRANSPOSE: i32 = 127;

/// Slowest accepted tempo multiplier
pub const MIN_TEMPO: f64 = 1e-3;

/// A timed sequence of note events.
///
/// `tempo` divides every delta, `transpose` shifts note pitches. Both are
/// applied lazily by [`Melody::effective_events`]; the raw events are shared
/// and never mutated, so clones are cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct Melody {
    raw: Arc<[NoteEvent]>,
    tempo: f64,
    transpose: i32,
}

impl Melody {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::from_events(Vec::new())
    }

    pub fn from_events(events: Vec<NoteEvent>) -> Self {
        Self {
            raw: events.into(),
            tempo: 1.0,
            transpose: 0,
        }
    }

    /// Load a melody from a MIDI file
    pub fn from_asset(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_events(file::load(path.as_ref())?))
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn transpose(&self) -> i32 {
        self.transpose
    }

    /// Set the tempo multiplier. Must be finite and at least [`MIN_TEMPO`].
    pub fn set_tempo(&mut self, tempo: f64) -> Result<()> {
        if !tempo.is_finite() || tempo < MIN_TEMPO {
            return Err(CarillonError::InvalidParameter(format!(
                "tempo must be a number of at least {}, got {}",
                MIN_TEMPO, tempo
            )));
        }
        self.tempo = tempo;
        Ok(())
    }

    pub fn set_transpose(&mut self, semitones: i32) -> Result<()> {
        if semitones.abs() > MAX_TRANSPOSE {
            return Err(CarillonError::InvalidParameter(format!(
                "transpose must be within ±{} semitones, got {}",
                MAX_TRANSPOSE, semitones
            )));
        }
        self.transpose = semitones;
        Ok(())
    }

    pub fn with_tempo(mut self, tempo: f64) -> Result<Self> {
        self.set_tempo(tempo)?;
        Ok(self)
    }

    pub fn with_transpose(mut self, semitones: i32) -> Result<Self> {
        self.set_transpose(semitones)?;
        Ok(self)
    }

    /// Events as stored, without tempo or transpose
    pub fn raw_events(&self) -> &[NoteEvent] {
        &self.raw
    }

    /// Events with tempo and transpose applied, recomputed on every call
    pub fn effective_events(&self) -> EffectiveEvents<'_> {
        EffectiveEvents::new(&self.raw, self.tempo, self.transpose)
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Total playing time at the current tempo, saturating at `Duration::MAX`
    pub fn duration(&self) -> Duration {
        let seconds: f64 = self.effective_events().map(|e| e.delta).sum();
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }

    /// `self` followed by `other`.
    ///
    /// Both sides are spliced with their own parameters already applied, so
    /// the result plays exactly like the two melodies back to back. The
    /// result starts at neutral tempo and transpose.
    pub fn concat(&self, other: &Melody) -> Melody {
        let mut events = Vec::with_capacity(self.len() + other.len());
        events.extend(self.effective_events());
        events.extend(other.effective_events());
        Melody::from_events(events)
    }

    /// The raw events `times` times over, keeping tempo and transpose
    pub fn repeat(&self, times: usize) -> Melody {
        let mut events = Vec::with_capacity(self.len() * times);
        for _ in 0..times {
            events.extend_from_slice(&self.raw);
        }
        Melody {
            raw: events.into(),
            tempo: self.tempo,
            transpose: self.transpose,
        }
    }
}

impl Default for Melody {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<NoteEvent> for Melody {
    fn from_iter<I: IntoIterator<Item = NoteEvent>>(iter: I) -> Self {
        Self::from_events(iter.into_iter().collect())
    }
}

impl Add<&Melody> for &Melody {
    type Output = Melody;

    fn add(self, other: &Melody) -> Melody {
        self.concat(other)
    }
}

impl Add for Melody {
    type Output = Melody;

    fn add(self, other: Melody) -> Melody {
        self.concat(&other)
    }
}

impl AddAssign<&Melody> for Melody {
    fn add_assign(&mut self, other: &Melody) {
        *self = self.concat(other);
    }
}

impl AddAssign for Melody {
    fn add_assign(&mut self, other: Melody) {
        *self = self.concat(&other);
    }
}

impl Mul<usize> for &Melody {
    type Output = Melody;

    fn mul(self, times: usize) -> Melody {
        self.repeat(times)
    }
}

impl Mul<usize> for Melody {
    type Output = Melody;

    fn mul(self, times: usize) -> Melody {
        self.repeat(times)
    }
}

impl MulAssign<usize> for Melody {
    fn mul_assign(&mut self, times: usize) {
        *self = self.repeat(times);
    }
}
