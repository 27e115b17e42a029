//! Per-run deduplication ledger: absolute asset URL to local relative path.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::classifier::AssetCategory;

/// One downloaded asset. Created on the first successful fetch of its URL
/// and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRegistryEntry {
    pub url: String,
    pub category: AssetCategory,
    /// Relative to the project root, e.g. `images/logo.png`.
    pub local_path: String,
    pub size: u64,
}

#[derive(Default)]
struct RegistryState {
    reserved: HashSet<String>,
    entries: HashMap<String, AssetRegistryEntry>,
    claimed_paths: HashSet<String>,
}

/// Owned by a single mirror call and shared with its fetch tasks.
pub struct AssetRegistry {
    state: Mutex<RegistryState>,
    next_id: AtomicU64,
}

impl AssetRegistry {
    pub fn new() -> Self {
        let seed = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self::with_id_seed(seed)
    }

    /// Synthetic file ids start at `seed` and increase by one per request.
    pub fn with_id_seed(seed: u64) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            next_id: AtomicU64::new(seed),
        }
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomic check-and-set. Returns true only for the first caller per URL.
    pub fn try_reserve(&self, url: &str) -> bool {
        self.state().reserved.insert(url.to_string())
    }

    /// Claims `<category>/<file_name>`, appending `_1`, `_2`, ... to the stem
    /// when another URL already took that name. Returns the claimed path.
    pub fn claim_path(&self, category: AssetCategory, file_name: &str) -> String {
        let (stem, ext) = match file_name.rfind('.') {
            Some(dot) => (&file_name[..dot], &file_name[dot..]),
            None => (file_name, ""),
        };

        let mut state = self.state();
        let mut candidate = format!("{}/{}", category.dir_name(), file_name);
        let mut n = 1;
        while state.claimed_paths.contains(&candidate) {
            candidate = format!("{}/{}_{}{}", category.dir_name(), stem, n, ext);
            n += 1;
        }
        state.claimed_paths.insert(candidate.clone());
        candidate
    }

    /// Stores the mapping for a reserved URL. A URL is recorded at most once;
    /// later calls keep the first entry.
    pub fn record(&self, url: &str, category: AssetCategory, local_path: &str, size: u64) {
        let mut state = self.state();
        state.reserved.insert(url.to_string());
        if state.entries.contains_key(url) {
            return;
        }
        state.entries.insert(
            url.to_string(),
            AssetRegistryEntry {
                url: url.to_string(),
                category,
                local_path: local_path.to_string(),
                size,
            },
        );
    }

    pub fn lookup(&self, url: &str) -> Option<String> {
        self.state().entries.get(url).map(|entry| entry.local_path.clone())
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Recorded entries sorted by URL.
    pub fn entries(&self) -> Vec<AssetRegistryEntry> {
        let mut entries: Vec<_> = self.state().entries.values().cloned().collect();
        entries.sort_by(|a, b| a.url.cmp(&b.url));
        entries
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
