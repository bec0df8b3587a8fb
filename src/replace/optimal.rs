use std::{cmp::Reverse, collections::HashMap};

use crate::{clock::Clock, page::PageNumber, tlb::Entry};

use super::{min_entry_by, PolicyKind, Replace};

const NEVER: u64 = u64::MAX;

/// Belady's policy: evicts the entry whose next reference is furthest away.
///
/// Needs the full reference string up front; `prepare` builds a table giving,
/// for every position, the position of the next reference to the same page.
#[derive(Debug)]
pub struct Optimal {
    next_use: Vec<u64>,
}

impl Optimal {
    pub fn new() -> Self {
        Optimal {
            next_use: Vec::new(),
        }
    }
}

impl Replace for Optimal {
    type Block = OptimalBlockData;

    fn kind(&self) -> PolicyKind {
        PolicyKind::Optimal
    }

    fn prepare(&mut self, refs: &[PageNumber]) {
        let mut upcoming = HashMap::<PageNumber, u64>::with_capacity(refs.len().min(1 << 16));
        self.next_use = vec![NEVER; refs.len()];
        for (idx, page) in refs.iter().enumerate().rev() {
            if let Some(next) = upcoming.insert(*page, idx as u64) {
                self.next_use[idx] = next;
            }
        }
        log::debug!(
            "optimal lookahead over {} references, {} distinct pages",
            refs.len(),
            upcoming.len()
        );
    }

    fn touch(&mut self, clock: &Clock, block: &mut OptimalBlockData) {
        block.next_use = self.next_use.get(clock.index()).copied().unwrap_or(NEVER);
    }

    fn victim(&mut self, entries: &[Entry<OptimalBlockData>]) -> usize {
        min_entry_by(entries, |entry| Reverse(entry.repl_block.next_use))
    }
}

#[derive(Debug)]
pub struct OptimalBlockData {
    next_use: u64,
}

impl Default for OptimalBlockData {
    fn default() -> Self {
        OptimalBlockData { next_use: NEVER }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        replace::AccessResult,
        tlb::{IsTlb, Tlb},
    };

    use super::*;

    const A: PageNumber = PageNumber(0xA000);
    const B: PageNumber = PageNumber(0xB000);
    const C: PageNumber = PageNumber(0xC000);

    fn replay(capacity: usize, refs: &[PageNumber]) -> (Tlb<Optimal>, Vec<Option<PageNumber>>) {
        let mut tlb = Tlb::new("optimal", capacity, Optimal::new()).unwrap();
        tlb.prepare(refs);
        let mut clock = Clock::new();
        let mut evictions = Vec::new();
        for &page in refs {
            if tlb.lookup(&clock, page) == AccessResult::Miss {
                evictions.push(tlb.insert(&clock, page));
            }
            clock.tick += 1;
        }
        (tlb, evictions)
    }

    #[test]
    fn next_use_table() {
        let mut optimal = Optimal::new();
        optimal.prepare(&[A, B, A, C, B]);
        assert_eq!(optimal.next_use, vec![2, 4, NEVER, NEVER, NEVER]);
    }

    #[test]
    fn touch_past_table_end_is_never_reused() {
        let mut optimal = Optimal::new();
        optimal.prepare(&[A, A]);
        let mut block = OptimalBlockData::default();
        optimal.touch(&Clock { tick: 0 }, &mut block);
        assert_eq!(block.next_use, 1);
        optimal.touch(&Clock { tick: 7 }, &mut block);
        assert_eq!(block.next_use, NEVER);
        optimal.touch(&Clock { tick: u64::MAX }, &mut block);
        assert_eq!(block.next_use, NEVER);
    }

    #[test]
    fn evicts_furthest_next_use() {
        let (_, evictions) = replay(2, &[A, B, C, A, B]);
        // C arrives with A next used at 3 and B at 4, so B goes. When B comes
        // back neither A nor C is used again and A was inserted first.
        assert_eq!(evictions, vec![None, None, Some(B), Some(A)]);
    }

    #[test]
    fn never_reused_ties_break_by_insertion() {
        let (tlb, evictions) = replay(2, &[A, B, C]);
        assert_eq!(evictions, vec![None, None, Some(A)]);
        assert_eq!(tlb.resident(), vec![B, C]);
    }

    #[test]
    fn never_reused_beats_reused() {
        let (_, evictions) = replay(2, &[A, B, C, B]);
        assert_eq!(evictions.last(), Some(&Some(A)));
    }
}
