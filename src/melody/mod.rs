// Melody - note sequences with lazily applied tempo and transpose

pub mod effective;
pub mod sequence;

pub use effective::EffectiveEvents;
pub use sequence::Melody;
