//! Persistence gateway implementations.

mod filesystem;
mod memory;
mod sqlite;

pub use filesystem::FilesystemGateway;
pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;
