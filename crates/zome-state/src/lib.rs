//! Zome-State: entry storage for zome-scenario application instances
//!
//! This crate holds the shared state that every agent bound to one
//! application instance reads and writes. It is a local stand-in for the
//! distributed store of the real runtime: entries are content addressed and
//! linked together, nothing more.
//!
//! ## Key Components
//!
//! - `Address`: 46-character content address (`Qm…`, base58 SHA-256 multihash)
//! - `Entry`: typed JSON content committed to the store
//! - `EntryStore`: async storage trait (commit, get, link, query links)
//! - `MemoryEntryStore`: in-memory implementation in [`fakes`]

mod address;
mod error;
pub mod fakes;
pub mod storage_traits;

pub use address::{Address, ADDRESS_LEN};
pub use error::StorageError;
pub use fakes::MemoryEntryStore;
pub use storage_traits::{load_linked, Entry, EntryStore, Link, LinkMatch, StorageResult};
