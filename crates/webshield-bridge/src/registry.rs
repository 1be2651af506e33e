// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Handle table mapping integral values to registered platforms.
//
// Handles are incrementing ids, not addresses, so a destroyed or never-issued
// handle is caught at lookup instead of being dereferenced. Ids are never
// reused within a process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::debug;

use webshield_core::error::{Result, WebshieldError};
use webshield_core::{Platform, Scheduler};

/// Opaque integral reference to a registered platform.
///
/// Valid between `construct` and `destruct`; only the integral value crosses
/// the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformHandle(pub u64);

impl std::fmt::Display for PlatformHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered platform together with the scheduler reference captured at
/// construction time. Marshaled callbacks clone the scheduler, so it can
/// outlive the platform's registration while work is still queued.
pub struct PlatformInstance {
    pub platform: Platform,
    pub scheduler: Scheduler,
}

impl std::fmt::Debug for PlatformInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformInstance").finish_non_exhaustive()
    }
}

/// The handle table.
pub struct Registry {
    entries: Mutex<HashMap<u64, Arc<PlatformInstance>>>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register an instance and issue its handle.
    pub fn insert(&self, instance: PlatformInstance) -> PlatformHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(instance));
        debug!(handle = id, "platform registered");
        PlatformHandle(id)
    }

    /// Look a live handle up.
    pub fn get(&self, handle: PlatformHandle) -> Result<Arc<PlatformInstance>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle.0)
            .cloned()
            .ok_or(WebshieldError::InvalidHandle(handle.0))
    }

    /// Retire a handle, returning its instance for teardown.
    pub fn remove(&self, handle: PlatformHandle) -> Result<Arc<PlatformInstance>> {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0)
            .ok_or(WebshieldError::InvalidHandle(handle.0))?;
        debug!(handle = handle.0, "platform retired");
        Ok(removed)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-global handle table used by the boundary operations.
pub fn global() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_instance() -> PlatformInstance {
        let platform = Platform::builder().build().expect("build");
        let scheduler = platform.scheduler().clone();
        PlatformInstance {
            platform,
            scheduler,
        }
    }

    #[test]
    fn insert_then_get_round_trips() {
        let registry = Registry::new();
        let handle = registry.insert(test_instance());
        registry.get(handle).expect("live handle resolves");
    }

    #[test]
    fn removed_handle_is_invalid() {
        let registry = Registry::new();
        let handle = registry.insert(test_instance());
        registry.remove(handle).expect("remove");
        let err = registry.get(handle).expect_err("stale handle");
        assert!(matches!(err, WebshieldError::InvalidHandle(id) if id == handle.0));
        let err = registry.remove(handle).expect_err("double remove");
        assert!(matches!(err, WebshieldError::InvalidHandle(_)));
    }

    #[test]
    fn ids_are_never_reused() {
        let registry = Registry::new();
        let first = registry.insert(test_instance());
        registry.remove(first).expect("remove");
        let second = registry.insert(test_instance());
        assert_ne!(first, second);
    }
}
