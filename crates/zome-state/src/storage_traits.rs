//! Storage trait definitions for zome application state
//!
//! - `EntryStore`: content-addressed entries plus typed links between them
//!
//! The trait is async and backend-agnostic. An in-memory implementation is
//! provided via the `fakes` module.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// An application entry: a type tag plus JSON content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Application-defined entry type (e.g. "game_proposal")
    pub entry_type: String,
    /// Entry content
    pub content: serde_json::Value,
}

impl Entry {
    /// Build an entry from any serialisable value.
    pub fn app<T: Serialize>(entry_type: &str, content: &T) -> StorageResult<Self> {
        Ok(Entry {
            entry_type: entry_type.to_string(),
            content: serde_json::to_value(content)?,
        })
    }

    /// Compute the content address of this entry.
    ///
    /// Object keys are serialised in sorted order, so equal entries always
    /// hash to the same address.
    pub fn address(&self) -> StorageResult<Address> {
        let canonical = serde_json::to_vec(self)?;
        Ok(Address::for_content(&canonical))
    }

    /// Deserialise the content into a concrete type.
    pub fn decode<T: DeserializeOwned>(&self) -> StorageResult<T> {
        Ok(serde_json::from_value(self.content.clone())?)
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// A directed, typed link between two entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub base: Address,
    pub target: Address,
    pub link_type: String,
    pub tag: String,
}

impl Link {
    pub fn new(base: &Address, target: &Address, link_type: &str, tag: &str) -> Self {
        Self {
            base: base.clone(),
            target: target.clone(),
            link_type: link_type.to_string(),
            tag: tag.to_string(),
        }
    }
}

/// Tag filter for link queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMatch {
    /// Any tag
    Any,
    /// Only links whose tag equals the given string
    Exactly(String),
}

impl LinkMatch {
    pub fn matches(&self, tag: &str) -> bool {
        match self {
            LinkMatch::Any => true,
            LinkMatch::Exactly(expected) => expected == tag,
        }
    }
}

// ---------------------------------------------------------------------------
// EntryStore
// ---------------------------------------------------------------------------

/// Shared application state.
///
/// Guarantees:
/// - `commit_entry` returns `entry.address()`; committing equal content twice
///   is a no-op returning the same address.
/// - `link_entries` requires the base entry to exist and ignores exact
///   duplicates, so a target is reported at most once per link query.
/// - `get_links` returns targets in link insertion order.
/// - Once a call returns, its effect is visible to every later call on the
///   same store, regardless of which agent issues it.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Store an entry and return its address.
    async fn commit_entry(&self, entry: &Entry) -> StorageResult<Address>;

    /// Retrieve an entry by address, `None` if absent.
    async fn get_entry(&self, address: &Address) -> StorageResult<Option<Entry>>;

    /// Check whether an entry exists.
    async fn contains(&self, address: &Address) -> StorageResult<bool>;

    /// Add a link. Fails with `StorageError::NotFound` if the base is unknown.
    async fn link_entries(&self, link: Link) -> StorageResult<()>;

    /// Return link targets from `base` with the given type and tag filter.
    async fn get_links(
        &self,
        base: &Address,
        link_type: &str,
        tag: LinkMatch,
    ) -> StorageResult<Vec<Address>>;
}

/// Follow links from `base` and deserialise every target entry.
///
/// Targets that are missing from the store are skipped.
pub async fn load_linked<T: DeserializeOwned>(
    store: &dyn EntryStore,
    base: &Address,
    link_type: &str,
    tag: LinkMatch,
) -> StorageResult<Vec<T>> {
    let targets = store.get_links(base, link_type, tag).await?;
    let mut loaded = Vec::with_capacity(targets.len());
    for target in &targets {
        match store.get_entry(target).await? {
            Some(entry) => loaded.push(entry.decode()?),
            None => tracing::warn!(target = %target, "Linked entry missing from store"),
        }
    }
    Ok(loaded)
}
