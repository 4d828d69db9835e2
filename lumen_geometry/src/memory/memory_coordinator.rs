/// Memory coordinator: evictor registry and retrying allocation wrapper.

use std::fmt;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::utils::lock_or_recover;
use crate::{engine_debug, engine_error, engine_info};

const SOURCE: &str = "lumen::MemoryCoordinator";

/// Identifier of a registered evictor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvictorId(u64);

/// Evictor callback: returns true iff it freed one unit of resource
type EvictorFn = Box<dyn FnMut() -> bool + Send>;

struct Evictor {
    id: EvictorId,
    name: String,
    reclaim: EvictorFn,
}

struct Evictors {
    entries: Vec<Evictor>,
    next_id: u64,
}

/// Global memory-pressure coordinator
///
/// Shared between subsystems through an `Arc`. Evictors are tried in
/// registration order; the first one that reports success ends the round.
///
/// Evictors run while the coordinator's registry is locked: an evictor must
/// not register or unregister evictors itself.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lumen_geometry::lumen::{Error, MemoryCoordinator};
///
/// let memory = Arc::new(MemoryCoordinator::new());
/// let mut pool = 2;
/// memory.register_evictor("pool", move || {
///     if pool > 0 { pool -= 1; true } else { false }
/// });
///
/// let mut attempts = 0;
/// let value = memory.allocate("example", || {
///     attempts += 1;
///     if attempts < 3 { Err(Error::OutOfMemory) } else { Ok(attempts) }
/// });
/// assert_eq!(value.unwrap(), 3);
/// ```
pub struct MemoryCoordinator {
    evictors: Mutex<Evictors>,
}

impl MemoryCoordinator {
    /// Create a coordinator with no evictors
    pub fn new() -> Self {
        Self {
            evictors: Mutex::new(Evictors {
                entries: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Register an evictor
    ///
    /// # Arguments
    ///
    /// * `name` - Name used in logs
    /// * `reclaim` - Callback freeing one unit of resource, returning true on success
    pub fn register_evictor<F>(&self, name: &str, reclaim: F) -> EvictorId
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let mut evictors = lock_or_recover(&self.evictors);
        let id = EvictorId(evictors.next_id);
        evictors.next_id += 1;
        evictors.entries.push(Evictor {
            id,
            name: name.to_string(),
            reclaim: Box::new(reclaim),
        });
        engine_debug!(SOURCE, "Registered evictor '{}'", name);
        id
    }

    /// Unregister an evictor, returns false if the id is unknown
    pub fn unregister_evictor(&self, id: EvictorId) -> bool {
        let mut evictors = lock_or_recover(&self.evictors);
        match evictors.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                let evictor = evictors.entries.remove(index);
                engine_debug!(SOURCE, "Unregistered evictor '{}'", evictor.name);
                true
            }
            None => false,
        }
    }

    /// Number of registered evictors
    pub fn evictor_count(&self) -> usize {
        lock_or_recover(&self.evictors).entries.len()
    }

    /// Ask evictors, in registration order, to free one unit of resource
    ///
    /// Returns true as soon as one evictor succeeds, false if none could.
    pub fn reclaim(&self) -> bool {
        let mut evictors = lock_or_recover(&self.evictors);
        for evictor in evictors.entries.iter_mut() {
            if (evictor.reclaim)() {
                engine_info!(SOURCE, "Evictor '{}' reclaimed one unit", evictor.name);
                return true;
            }
        }
        false
    }

    /// Run a GPU-allocating closure, reclaiming memory on out-of-memory
    ///
    /// The closure is retried after every successful eviction. Errors other
    /// than `Error::OutOfMemory` are returned immediately. Once no evictor
    /// can free anything, `Error::OutOfMemory` is logged and returned.
    ///
    /// # Arguments
    ///
    /// * `description` - What is being allocated (for logs)
    /// * `allocate` - The allocating closure
    pub fn allocate<T, F>(&self, description: &str, mut allocate: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut evictions = 0usize;
        loop {
            match allocate() {
                Ok(value) => {
                    if evictions > 0 {
                        engine_debug!(SOURCE, "Allocated {} after {} eviction(s)", description, evictions);
                    }
                    return Ok(value);
                }
                Err(error) if error.is_out_of_memory() => {
                    if !self.reclaim() {
                        engine_error!(SOURCE, "Out of memory allocating {}: no evictor could free anything ({} eviction(s) tried)",
                            description, evictions);
                        return Err(Error::OutOfMemory);
                    }
                    evictions += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl Default for MemoryCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let evictors = lock_or_recover(&self.evictors);
        let names: Vec<&str> = evictors.entries.iter().map(|e| e.name.as_str()).collect();
        f.debug_struct("MemoryCoordinator")
            .field("evictors", &names)
            .finish()
    }
}

#[cfg(test)]
#[path = "memory_coordinator_tests.rs"]
mod tests;
