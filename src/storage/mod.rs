//! Storage layer.
//!
//! This module holds the local side and the remote side of reconciliation:
//! - **Record store**: the in-memory, ordered quote collection
//! - **Persistence**: durable key/value gateways (memory, filesystem, `SQLite`)
//! - **Remote**: the collection endpoint a store is synced against (HTTP, in-process)

// Allow significant_drop_tightening - guards are held for the whole
// critical section on purpose.
#![allow(clippy::significant_drop_tightening)]

pub mod codec;
pub mod persistence;
mod record_store;
pub mod remote;
pub mod traits;

pub use persistence::{FilesystemGateway, MemoryGateway, SqliteGateway};
pub(crate) use record_store::{read_store, write_store};
pub use record_store::{RecordStore, SharedStore};
pub use remote::{HttpRemote, MemoryRemote, RemoteFormat};
pub use traits::{LAST_CATEGORY_KEY, PersistenceGateway, QUOTES_KEY, RemoteProvider};
