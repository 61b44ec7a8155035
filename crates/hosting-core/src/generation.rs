//! Generation numbers and the monotonic counters that order them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Recency of one build attempt. Zero means "nothing yet".
pub type Generation = u64;

/// Per-instance source of generation numbers.
///
/// Any thread may allocate. The highest value ever issued or observed is the
/// only generation whose result may still be applied.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    highest: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next generation.
    pub fn next(&self) -> Generation {
        self.highest.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Highest generation issued or observed so far.
    pub fn highest(&self) -> Generation {
        self.highest.load(Ordering::Acquire)
    }

    /// Raises the counter to at least `generation` (for results built elsewhere).
    pub fn observe(&self, generation: Generation) {
        self.highest.fetch_max(generation, Ordering::AcqRel);
    }

    /// True when no request newer than `generation` has been issued.
    pub fn is_latest(&self, generation: Generation) -> bool {
        generation >= self.highest()
    }
}

/// The last generation applied to the view hierarchy; never moves backwards.
#[derive(Debug, Default)]
pub struct AppliedGeneration {
    value: AtomicU64,
}

impl AppliedGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Generation {
        self.value.load(Ordering::Acquire)
    }

    /// Records `generation` unless a newer one was already recorded.
    /// Re-recording the current value succeeds.
    pub fn advance(&self, generation: Generation) -> bool {
        let mut current = self.value.load(Ordering::Acquire);
        loop {
            if generation < current {
                return false;
            }
            match self.value.compare_exchange_weak(
                current,
                generation,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Lifecycle of one generation slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenerationState {
    Idle,
    Requested,
    Building,
    Ready,
    Applied,
    Superseded,
}

impl GenerationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, GenerationState::Applied | GenerationState::Superseded)
    }
}
