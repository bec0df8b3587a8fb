use crate::tlb::Entry;

use super::{PolicyKind, Replace};

/// Uniformly random victim from a seeded generator, so runs are repeatable.
#[derive(Debug)]
pub struct Random {
    rng: fastrand::Rng,
}

impl Random {
    pub fn new(seed: u64) -> Self {
        Random {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Replace for Random {
    type Block = ();

    fn kind(&self) -> PolicyKind {
        PolicyKind::Random
    }

    fn victim(&mut self, entries: &[Entry<()>]) -> usize {
        self.rng.usize(0..entries.len())
    }
}
