//! Per-generation lifecycle bookkeeping.

use hosting_core::{Generation, GenerationState};
use indexmap::IndexMap;
use log::warn;

/// How many terminal (applied or superseded) generations stay queryable.
pub const RETAINED_TERMINAL_GENERATIONS: usize = 64;

#[derive(Debug, Default)]
pub(crate) struct GenerationLedger {
    entries: IndexMap<Generation, GenerationState>,
    terminal: usize,
}

impl GenerationLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, generation: Generation) -> Option<GenerationState> {
        self.entries.get(&generation).copied()
    }

    /// Moves `generation` to `state`. Terminal states are never left.
    pub(crate) fn set(&mut self, generation: Generation, state: GenerationState) -> bool {
        match self.entries.get(&generation) {
            Some(current) if *current == state => return true,
            Some(current) if current.is_terminal() => {
                warn!("generation {generation} is already {current:?}; ignoring {state:?}");
                return false;
            }
            _ => {}
        }
        self.entries.insert(generation, state);
        if state.is_terminal() {
            self.terminal += 1;
            self.prune();
        }
        true
    }

    fn prune(&mut self) {
        while self.terminal > RETAINED_TERMINAL_GENERATIONS {
            let Some(oldest) = self.entries.values().position(|state| state.is_terminal()) else {
                break;
            };
            self.entries.shift_remove_index(oldest);
            self.terminal -= 1;
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_final() {
        let mut ledger = GenerationLedger::new();
        assert!(ledger.set(1, GenerationState::Requested));
        assert!(ledger.set(1, GenerationState::Building));
        assert!(ledger.set(1, GenerationState::Superseded));
        assert!(!ledger.set(1, GenerationState::Applied));
        assert!(ledger.set(1, GenerationState::Superseded));
        assert_eq!(ledger.get(1), Some(GenerationState::Superseded));
    }

    #[test]
    fn only_recent_terminal_entries_are_kept() {
        let mut ledger = GenerationLedger::new();
        ledger.set(1, GenerationState::Requested);
        for generation in 2..=100 {
            ledger.set(generation, GenerationState::Applied);
        }
        assert_eq!(ledger.len(), RETAINED_TERMINAL_GENERATIONS + 1);
        // Live slots survive pruning.
        assert_eq!(ledger.get(1), Some(GenerationState::Requested));
        assert_eq!(ledger.get(36), None);
        assert_eq!(ledger.get(37), Some(GenerationState::Applied));
        assert_eq!(ledger.get(100), Some(GenerationState::Applied));
    }
}
