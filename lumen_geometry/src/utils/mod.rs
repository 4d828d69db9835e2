//! Small shared helpers

mod lock;

pub(crate) use lock::lock_or_recover;
