use std::fmt;

use serde::Serialize;

use crate::{
    clock::Clock,
    error::{Error, Result},
    page::AccessClass,
    replace::{AccessResult, PolicyKind},
    stream::ReferenceStream,
    tlb::IsTlb,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub name: String,
    pub stream: AccessClass,
    pub policy: PolicyKind,
    pub capacity: usize,
    pub total_references: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    /// References served per fill.
    pub reuse: f64,
    /// Mean ticks an entry stayed resident.
    pub lifetime: f64,
    /// Share of residency spent between fill and last use.
    pub efficiency: f64,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Policy: {}, Hits: {}, Misses: {}, Miss Rate: {:.2}%",
            self.policy,
            self.hits,
            self.misses,
            self.miss_rate * 100.0
        )
    }
}

/// Replays reference streams through a TLB.
pub struct Simulator {
    heartbeat: u64,
}

impl Simulator {
    /// `heartbeat` logs progress every that many references; 0 disables it.
    pub fn new(heartbeat: u64) -> Self {
        Simulator { heartbeat }
    }

    /// Expects a freshly constructed `tlb`; its counters are not reset.
    pub fn run(&self, tlb: &mut dyn IsTlb, stream: &ReferenceStream) -> Result<SimulationReport> {
        if stream.is_empty() {
            return Err(Error::EmptyStream {
                class: stream.class(),
            });
        }

        tlb.prepare(stream.pages());
        let mut clock = Clock::new();
        let mut next_heartbeat = self.heartbeat;

        for &page in stream.pages() {
            match tlb.lookup(&clock, page) {
                AccessResult::Hit => tlb.hit(),
                AccessResult::Miss => {
                    tlb.miss();
                    tlb.insert(&clock, page);
                }
            }
            clock.tick += 1;

            if self.heartbeat != 0 && clock.tick >= next_heartbeat {
                log::info!("{}: {} references", tlb.name(), clock.tick);
                next_heartbeat += self.heartbeat;
            }
        }

        let report = tlb.make_report(&clock, stream.class());
        log::debug!("{}: {:?}", tlb.name(), report);
        Ok(report)
    }
}
