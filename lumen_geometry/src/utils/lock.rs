/// Mutex helpers

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if the lock is poisoned
///
/// Guarded state is never left half-updated by a panic.
pub(crate) fn lock_or_recover<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
