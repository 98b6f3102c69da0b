//! In-memory implementation of the storage traits
//!
//! `MemoryEntryStore` satisfies the `EntryStore` contract without any
//! external dependencies. It is what the in-process conductor runs on.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::address::Address;
use crate::error::StorageError;
use crate::storage_traits::{Entry, EntryStore, Link, LinkMatch, StorageResult};

#[derive(Debug, Default)]
struct StoreState {
    entries: HashMap<Address, Entry>,
    links: Vec<Link>,
}

/// In-memory entry store backed by a `HashMap<Address, Entry>` and an
/// append-only link list.
#[derive(Debug, Default)]
pub struct MemoryEntryStore {
    state: Mutex<StoreState>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn entry_count(&self) -> usize {
        self.lock().entries.len()
    }

    /// Number of stored links.
    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    // A poisoned lock only means another caller panicked mid-test; the
    // state itself is never left half-written.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl EntryStore for MemoryEntryStore {
    async fn commit_entry(&self, entry: &Entry) -> StorageResult<Address> {
        let address = entry.address()?;
        let mut state = self.lock();
        state
            .entries
            .entry(address.clone())
            .or_insert_with(|| entry.clone());
        tracing::trace!(address = %address, entry_type = %entry.entry_type, "Committed entry");
        Ok(address)
    }

    async fn get_entry(&self, address: &Address) -> StorageResult<Option<Entry>> {
        Ok(self.lock().entries.get(address).cloned())
    }

    async fn contains(&self, address: &Address) -> StorageResult<bool> {
        Ok(self.lock().entries.contains_key(address))
    }

    async fn link_entries(&self, link: Link) -> StorageResult<()> {
        let mut state = self.lock();
        if !state.entries.contains_key(&link.base) {
            return Err(StorageError::NotFound {
                address: link.base.to_string(),
            });
        }
        if !state.links.contains(&link) {
            state.links.push(link);
        }
        Ok(())
    }

    async fn get_links(
        &self,
        base: &Address,
        link_type: &str,
        tag: LinkMatch,
    ) -> StorageResult<Vec<Address>> {
        let state = self.lock();
        let mut targets: Vec<Address> = Vec::new();
        for link in state
            .links
            .iter()
            .filter(|l| &l.base == base && l.link_type == link_type && tag.matches(&l.tag))
        {
            // The same target may be linked under different tags.
            if !targets.contains(&link.target) {
                targets.push(link.target.clone());
            }
        }
        Ok(targets)
    }
}
