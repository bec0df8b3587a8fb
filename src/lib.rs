//! Memory-trace to TLB simulation pipeline.
//!
//! Profiler trace lines are parsed into [`trace::AccessEvent`]s, reduced to
//! page numbers, split into instruction and data reference strings, and each
//! string is replayed through a fully-associative [`tlb::Tlb`] under one or
//! more replacement policies.

pub mod clock;
pub mod config;
pub mod error;
pub mod page;
pub mod pipeline;
pub mod replace;
pub mod simulate;
pub mod stream;
pub mod tlb;
pub mod toolchain;
pub mod trace;
