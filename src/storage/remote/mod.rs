//! Remote provider implementations.

mod http;
mod memory;

pub use http::{HttpRemote, RemoteFormat};
pub use memory::MemoryRemote;
