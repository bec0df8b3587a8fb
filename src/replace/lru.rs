use crate::tlb::Entry;

use super::{min_entry_by, PolicyKind, Replace};

/// Evicts the entry whose last lookup lies furthest in the past.
#[derive(Debug)]
pub struct Lru {}

impl Lru {
    pub fn new() -> Self {
        Lru {}
    }
}

impl Replace for Lru {
    type Block = ();

    fn kind(&self) -> PolicyKind {
        PolicyKind::Lru
    }

    fn victim(&mut self, entries: &[Entry<()>]) -> usize {
        min_entry_by(entries, |entry| entry.last_used)
    }
}
