//! Atomically reloadable repository handle.
//!
//! The repository itself is immutable; reconfiguration replaces it
//! wholesale. `SharedRepository` hands out `Arc` snapshots so an evaluation
//! that began before a reload keeps the contract set that was current when
//! it looked its tool up — there is no observable half-reloaded state.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use warden_contracts::WardenResult;

use crate::repository::ContractRepository;

/// A shared handle over the current `ContractRepository` snapshot.
pub struct SharedRepository {
    current: RwLock<Arc<ContractRepository>>,
}

impl SharedRepository {
    /// Wrap an already-loaded repository.
    pub fn new(repository: ContractRepository) -> Self {
        Self {
            current: RwLock::new(Arc::new(repository)),
        }
    }

    /// Load from `dir` and wrap the result.
    pub fn load(dir: &Path) -> WardenResult<Self> {
        Ok(Self::new(ContractRepository::load(dir)?))
    }

    /// The current snapshot. Callers hold the returned `Arc` for the
    /// duration of one evaluation; a concurrent reload does not affect it.
    pub fn snapshot(&self) -> Arc<ContractRepository> {
        // Both critical sections only clone or assign an `Arc`, so a
        // poisoned lock cannot hold a half-written value. Recover instead
        // of propagating the panic into every later evaluation.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reload from `dir` and atomically swap the snapshot.
    ///
    /// The new repository is fully built and validated before the swap; on
    /// any load error the previous snapshot stays active untouched.
    pub fn reload(&self, dir: &Path) -> WardenResult<()> {
        let fresh = ContractRepository::load(dir)?;
        let contracts = fresh.len();

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(fresh);

        info!(contracts, directory = %dir.display(), "contract repository reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT_A: &str = r#"
        tool_name = "search"
        description = "d"

        [[rules]]
        name = "r"
        description = "d"
        trigger_condition = "len(tool_output) > 0"
        instruction = "i"
        priority = 1
    "#;

    const CONTRACT_B: &str = r#"
        tool_name = "browse"
        description = "d"

        [[rules]]
        name = "r"
        description = "d"
        trigger_condition = "len(tool_output) > 0"
        instruction = "i"
        priority = 1
    "#;

    #[test]
    fn reload_swaps_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), CONTRACT_A).unwrap();

        let shared = SharedRepository::load(dir.path()).unwrap();
        assert!(shared.snapshot().lookup("search").is_some());
        assert!(shared.snapshot().lookup("browse").is_none());

        std::fs::remove_file(dir.path().join("a.toml")).unwrap();
        std::fs::write(dir.path().join("b.toml"), CONTRACT_B).unwrap();
        shared.reload(dir.path()).unwrap();

        assert!(shared.snapshot().lookup("search").is_none());
        assert!(shared.snapshot().lookup("browse").is_some());
    }

    #[test]
    fn snapshots_taken_before_a_reload_are_unaffected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), CONTRACT_A).unwrap();

        let shared = SharedRepository::load(dir.path()).unwrap();
        let before = shared.snapshot();

        std::fs::remove_file(dir.path().join("a.toml")).unwrap();
        std::fs::write(dir.path().join("b.toml"), CONTRACT_B).unwrap();
        shared.reload(dir.path()).unwrap();

        // The in-flight snapshot still sees the old contract set.
        assert!(before.lookup("search").is_some());
        assert!(shared.snapshot().lookup("search").is_none());
    }

    #[test]
    fn snapshots_are_safe_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), CONTRACT_A).unwrap();
        let shared = Arc::new(SharedRepository::load(dir.path()).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        assert!(shared.snapshot().lookup("search").is_some());
                    }
                })
            })
            .collect();

        // Reload the same contract set while the readers run; every
        // snapshot they take must be complete.
        for _ in 0..10 {
            shared.reload(dir.path()).unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn failed_reload_keeps_the_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), CONTRACT_A).unwrap();

        let shared = SharedRepository::load(dir.path()).unwrap();

        let empty = tempfile::tempdir().unwrap();
        assert!(shared.reload(empty.path()).is_err());

        assert!(shared.snapshot().lookup("search").is_some());
    }
}
