//! Lock access for the cache stores.
//!
//! A panic while a store is locked poisons it. Cached CMS bodies and pages
//! are disposable, so the guard is recovered and the event logged.

use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn recover<G>(result: LockResult<G>, store: &'static str, op: &'static str, mode: &str) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            store,
            op,
            mode,
            "cache lock was poisoned; continuing with possibly stale entries"
        );
        poisoned.into_inner()
    })
}

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    store: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), store, op, "read")
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    store: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), store, op, "write")
}
