//! Remote provider trait.

use crate::Result;
use crate::models::Quote;
use async_trait::async_trait;

/// The remote collection a store is reconciled against.
///
/// Fetching and pushing are the only suspending operations in a sync pass.
/// Implementations report every transport or decoding failure as
/// [`crate::Error::RemoteUnavailable`].
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    /// Returns a short provider name for logs.
    fn name(&self) -> &str;

    /// Fetches the full remote collection, in remote order.
    async fn fetch_all(&self) -> Result<Vec<Quote>>;

    /// Pushes a single quote. Errors are reported per item.
    async fn push(&self, quote: &Quote) -> Result<()>;
}
