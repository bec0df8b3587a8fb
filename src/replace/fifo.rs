use crate::tlb::Entry;

use super::{min_entry_by, PolicyKind, Replace};

/// Evicts the entry that has been resident the longest.
#[derive(Debug)]
pub struct Fifo {}

impl Fifo {
    pub fn new() -> Self {
        Fifo {}
    }
}

impl Replace for Fifo {
    type Block = ();

    fn kind(&self) -> PolicyKind {
        PolicyKind::Fifo
    }

    fn victim(&mut self, entries: &[Entry<()>]) -> usize {
        min_entry_by(entries, |_| ())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        clock::Clock,
        page::PageNumber,
        replace::AccessResult,
        tlb::{IsTlb, Tlb},
    };

    use super::*;

    const A: PageNumber = PageNumber(0xA000);
    const B: PageNumber = PageNumber(0xB000);
    const C: PageNumber = PageNumber(0xC000);

    #[test]
    fn hit_does_not_save_oldest_entry() {
        let mut tlb = Tlb::new("fifo", 2, Fifo::new()).unwrap();
        let mut clock = Clock::new();
        for page in [A, B] {
            assert_eq!(tlb.lookup(&clock, page), AccessResult::Miss);
            tlb.insert(&clock, page);
            clock.tick += 1;
        }
        assert_eq!(tlb.lookup(&clock, A), AccessResult::Hit);
        clock.tick += 1;

        assert_eq!(tlb.lookup(&clock, C), AccessResult::Miss);
        assert_eq!(tlb.insert(&clock, C), Some(A));
        assert_eq!(tlb.resident(), vec![B, C]);
    }
}
