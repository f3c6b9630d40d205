// Observer chain - ordered veto/transform hooks for each tick

use crate::melody::Melody;

/// Called with `(melody, hour, quarter)`; `None` cancels the tick
pub type Observer = Box<dyn Fn(Melody, u32, u32) -> Option<Melody> + Send + Sync>;

#[derive(Default)]
pub struct ObserverChain {
    observers: Vec<Observer>,
}

impl ObserverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Thread the melody through every observer in registration order,
    /// stopping at the first veto
    pub fn fold(&self, melody: Melody, hour: u32, quarter: u32) -> Option<Melody> {
        self.observers
            .iter()
            .try_fold(melody, |melody, observer| observer(melody, hour, quarter))
    }
}

impl std::fmt::Debug for ObserverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverChain")
            .field("observers", &self.observers.len())
            .finish()
    }
}
