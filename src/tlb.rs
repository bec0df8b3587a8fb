use std::collections::HashMap;

use crate::{
    clock::Clock,
    error::{Error, Result},
    page::{AccessClass, PageNumber},
    replace::{AccessResult, PolicyKind, Replace},
    simulate::SimulationReport,
};

#[derive(Debug)]
pub struct Entry<B> {
    pub page: PageNumber,
    /// Monotonic insertion marker, unique per fill.
    pub inserted: u64,
    /// Tick of the most recent fill or hit.
    pub last_used: u64,

    // Stats
    alloc_time: u64,

    // Replace Data
    pub repl_block: B,
}

impl<B> Entry<B> {
    fn live_dur(&self) -> u64 {
        self.last_used - self.alloc_time
    }

    fn dead_dur(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_used)
    }
}

/// Fully-associative TLB holding at most `capacity` page translations.
#[derive(Debug)]
pub struct Tlb<R: Replace> {
    name: String,
    entries: Vec<Entry<R::Block>>,
    index: HashMap<PageNumber, usize>,
    capacity: usize,
    next_marker: u64,
    pub repl: R,
    hits: u64,
    misses: u64,
    evictions: u64,
    live_dur: u64,
    dead_dur: u64,
}

impl<R: Replace> Tlb<R> {
    pub fn new(name: impl Into<String>, capacity: usize, repl: R) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Configuration(
                "TLB capacity must be a positive integer".into(),
            ));
        }
        Ok(Tlb {
            name: name.into(),
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            capacity,
            next_marker: 0,
            repl,
            hits: 0,
            misses: 0,
            evictions: 0,
            live_dur: 0,
            dead_dur: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, page: PageNumber) -> bool {
        self.index.contains_key(&page)
    }

    fn fill(&mut self, clock: &Clock, page: PageNumber) -> Entry<R::Block> {
        let mut entry = Entry {
            page,
            inserted: self.next_marker,
            last_used: clock.tick,
            alloc_time: clock.tick,
            repl_block: R::Block::default(),
        };
        self.next_marker += 1;
        self.repl.touch(clock, &mut entry.repl_block);
        entry
    }
}

/// Object-safe view of a [`Tlb`] so the policy can be picked at runtime.
pub trait IsTlb {
    fn name(&self) -> &str;
    fn policy(&self) -> PolicyKind;
    fn capacity(&self) -> usize;
    fn prepare(&mut self, refs: &[PageNumber]);
    fn lookup(&mut self, clock: &Clock, page: PageNumber) -> AccessResult;
    fn insert(&mut self, clock: &Clock, page: PageNumber) -> Option<PageNumber>;
    /// Resident pages, oldest insertion first.
    fn resident(&self) -> Vec<PageNumber>;
    fn hit(&mut self);
    fn miss(&mut self);
    fn make_report(&self, clock: &Clock, class: AccessClass) -> SimulationReport;
}

impl<R: Replace> IsTlb for Tlb<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn policy(&self) -> PolicyKind {
        self.repl.kind()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn prepare(&mut self, refs: &[PageNumber]) {
        self.repl.prepare(refs);
    }

    fn lookup(&mut self, clock: &Clock, page: PageNumber) -> AccessResult {
        match self.index.get(&page) {
            Some(&slot) => {
                let entry = &mut self.entries[slot];
                entry.last_used = clock.tick;
                self.repl.touch(clock, &mut entry.repl_block);
                AccessResult::Hit
            }
            None => AccessResult::Miss,
        }
    }

    fn insert(&mut self, clock: &Clock, page: PageNumber) -> Option<PageNumber> {
        if self.index.contains_key(&page) {
            log::debug!("{}: {} is already resident", self.name, page);
            return None;
        }

        let entry = self.fill(clock, page);
        if self.entries.len() < self.capacity {
            self.index.insert(page, self.entries.len());
            self.entries.push(entry);
            return None;
        }

        // No free slot, evict
        let slot = self.repl.victim(&self.entries);
        let victim = std::mem::replace(&mut self.entries[slot], entry);
        self.live_dur += victim.live_dur();
        self.dead_dur += victim.dead_dur(clock.tick);
        self.evictions += 1;
        self.index.remove(&victim.page);
        self.index.insert(page, slot);
        log::trace!("{}: {} evicted for {}", self.name, victim.page, page);
        Some(victim.page)
    }

    fn resident(&self) -> Vec<PageNumber> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by_key(|entry| entry.inserted);
        entries.into_iter().map(|entry| entry.page).collect()
    }

    fn hit(&mut self) {
        self.hits += 1;
    }

    fn miss(&mut self) {
        self.misses += 1;
    }

    fn make_report(&self, clock: &Clock, class: AccessClass) -> SimulationReport {
        let total_live = self.live_dur + self.entries.iter().map(Entry::live_dur).sum::<u64>();
        let total_dead = self.dead_dur
            + self
                .entries
                .iter()
                .map(|entry| entry.dead_dur(clock.tick))
                .sum::<u64>();
        let total_both = total_live + total_dead;
        let total_references = self.hits + self.misses;

        SimulationReport {
            name: self.name.clone(),
            stream: class,
            policy: self.repl.kind(),
            capacity: self.capacity,
            total_references,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate: ratio(self.hits, total_references),
            miss_rate: ratio(self.misses, total_references),
            reuse: ratio(total_references, self.misses),
            lifetime: ratio(total_both, self.misses),
            efficiency: ratio(total_live, total_both),
        }
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
