//! Memory-pressure coordination
//!
//! Subsystems holding reclaimable GPU memory register an evictor with the
//! coordinator. Allocations that fail with out-of-memory are retried after
//! each successful eviction until either they succeed or no evictor can
//! free anything.

mod memory_coordinator;

pub use memory_coordinator::{EvictorId, MemoryCoordinator};
