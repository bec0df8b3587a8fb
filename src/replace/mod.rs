pub mod fifo;
pub mod lru;
pub mod optimal;
pub mod random;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{clock::Clock, page::PageNumber, tlb::Entry};

/// Victim selection for a fully-associative TLB.
///
/// `Block` is per-entry bookkeeping owned by the policy. `touch` runs on every
/// hit and on every fill; `victim` is only asked when the table is full and
/// must return an index into `entries`.
pub trait Replace: Sized {
    type Block: Default;

    fn kind(&self) -> PolicyKind;

    /// Called once with the whole reference string before replay starts.
    fn prepare(&mut self, _refs: &[PageNumber]) {}

    fn touch(&mut self, _clock: &Clock, _block: &mut Self::Block) {}

    fn victim(&mut self, entries: &[Entry<Self::Block>]) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Fifo,
    Lru,
    Optimal,
    Random,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 4] = [
        PolicyKind::Fifo,
        PolicyKind::Lru,
        PolicyKind::Optimal,
        PolicyKind::Random,
    ];
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolicyKind::Fifo => "FIFO",
            PolicyKind::Lru => "LRU",
            PolicyKind::Optimal => "OPTIMAL",
            PolicyKind::Random => "RANDOM",
        })
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" => Ok(PolicyKind::Fifo),
            "lru" => Ok(PolicyKind::Lru),
            "optimal" | "opt" | "belady" => Ok(PolicyKind::Optimal),
            "random" | "rand" => Ok(PolicyKind::Random),
            _ => Err(format!("Unrecognized replacement policy: {s}")),
        }
    }
}

/// Index of the entry with the smallest key; equal keys fall back to the
/// earliest insertion.
pub(crate) fn min_entry_by<B, K: Ord>(
    entries: &[Entry<B>],
    mut key: impl FnMut(&Entry<B>) -> K,
) -> usize {
    entries
        .iter()
        .enumerate()
        .min_by_key(|&(_, entry)| (key(entry), entry.inserted))
        .map_or(0, |(idx, _)| idx)
}
