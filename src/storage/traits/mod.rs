//! Storage traits.

mod persistence;
mod remote;

pub use persistence::{LAST_CATEGORY_KEY, PersistenceGateway, QUOTES_KEY};
pub use remote::RemoteProvider;
