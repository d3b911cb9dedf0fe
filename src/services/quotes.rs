//! Local quote operations.
//!
//! [`QuoteService`] owns the user-facing commands that touch the record
//! store without a sync pass: adding, importing, browsing and the persisted
//! category preference. Every mutation is persisted before it becomes
//! visible in the store.

use crate::models::Quote;
use crate::storage::codec::{load_last_category, load_quotes, save_last_category, save_quotes};
use crate::storage::{
    PersistenceGateway, RecordStore, RemoteProvider, SharedStore, read_store, write_store,
};
use crate::{Error, Result};
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Add, import, browse and export quotes.
#[derive(Clone)]
pub struct QuoteService {
    store: SharedStore,
    gateway: Arc<dyn PersistenceGateway>,
    remote: Option<Arc<dyn RemoteProvider>>,
}

impl QuoteService {
    /// Hydrates a store from `gateway`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway fails or the stored collection is
    /// not valid JSON.
    pub fn open(gateway: Arc<dyn PersistenceGateway>) -> Result<Self> {
        let records = load_quotes(gateway.as_ref())?;
        debug!(
            count = records.len(),
            backend = gateway.backend_name(),
            "Hydrated record store"
        );
        Ok(Self::new(RecordStore::from_records(records).into_shared(), gateway))
    }

    /// Wraps an existing store.
    #[must_use]
    pub fn new(store: SharedStore, gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            store,
            gateway,
            remote: None,
        }
    }

    /// Enables [`Self::publish`].
    #[must_use]
    pub fn with_remote(mut self, remote: Arc<dyn RemoteProvider>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Returns the shared store.
    #[must_use]
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Returns the persistence gateway.
    #[must_use]
    pub fn gateway(&self) -> Arc<dyn PersistenceGateway> {
        Arc::clone(&self.gateway)
    }

    /// Adds a quote, replacing any record with the same text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for empty text or category and a
    /// persistence error if the save fails. The store is unchanged on error.
    #[instrument(skip(self, text, category), fields(operation = "add"))]
    pub fn add(&self, text: &str, category: &str) -> Result<Quote> {
        let quote = Quote::new(text, category)?;
        self.mutate(|store| store.add(quote.clone()))?;
        metrics::counter!("quote_added_total").increment(1);
        Ok(quote)
    }

    /// Appends `quotes` verbatim, duplicates included. Returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any quote is invalid (nothing is
    /// imported) and a persistence error if the save fails.
    #[instrument(skip(self, quotes), fields(operation = "import", count = quotes.len()))]
    pub fn import(&self, quotes: Vec<Quote>) -> Result<usize> {
        let count = self.mutate(|store| store.extend(quotes))?;
        info!(count, "Imported quotes");
        Ok(count)
    }

    /// Applies `f` to a copy of the store, persists the copy, then commits it.
    fn mutate<T>(&self, f: impl FnOnce(&mut RecordStore) -> Result<T>) -> Result<T> {
        let mut store = write_store(&self.store)?;
        let mut candidate = store.clone();
        let value = f(&mut candidate)?;
        save_quotes(self.gateway.as_ref(), candidate.all())?;
        *store = candidate;
        Ok(value)
    }

    /// Returns every quote in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the store lock is poisoned.
    pub fn all(&self) -> Result<Vec<Quote>> {
        Ok(read_store(&self.store)?.all().to_vec())
    }

    /// Returns the quotes in `category` (`"all"` for every quote).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the store lock is poisoned.
    pub fn by_category(&self, category: &str) -> Result<Vec<Quote>> {
        Ok(read_store(&self.store)?
            .by_category(category)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Returns `"all"` followed by every category in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the store lock is poisoned.
    pub fn categories(&self) -> Result<Vec<String>> {
        Ok(read_store(&self.store)?.categories())
    }

    /// Picks a random quote from `category`, or `None` if it is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the store lock is poisoned.
    pub fn random(&self, category: &str) -> Result<Option<Quote>> {
        let store = read_store(&self.store)?;
        let pool = store.by_category(category);
        Ok(pool.choose(&mut rand::thread_rng()).map(|q| (*q).clone()))
    }

    /// Persists the selected category filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty category and a persistence
    /// error if the save fails.
    pub fn select_category(&self, category: &str) -> Result<()> {
        let category = category.trim();
        if category.is_empty() {
            return Err(Error::Validation("category must not be empty".to_string()));
        }
        save_last_category(self.gateway.as_ref(), category)
    }

    /// Returns the persisted category filter, `"all"` if none was selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway fails.
    pub fn last_category(&self) -> Result<String> {
        load_last_category(self.gateway.as_ref())
    }

    /// Serializes the collection as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if serialization fails.
    pub fn export_json(&self) -> Result<String> {
        let store = read_store(&self.store)?;
        serde_json::to_string_pretty(store.all()).map_err(|e| Error::OperationFailed {
            operation: "export_json".to_string(),
            cause: e.to_string(),
        })
    }

    /// Pushes one quote to the remote.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no remote is configured and
    /// [`Error::RemoteUnavailable`] if the push fails.
    pub async fn publish(&self, quote: &Quote) -> Result<()> {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| Error::Config("no remote configured".to_string()))?;
        remote.push(quote).await?;
        debug!(remote = remote.name(), "Published quote");
        Ok(())
    }

    /// Returns the category to browse when none is given: the persisted one.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway fails.
    pub fn effective_category(&self, requested: Option<&str>) -> Result<String> {
        match requested {
            Some(category) if !category.trim().is_empty() => Ok(category.trim().to_string()),
            _ => self.last_category(),
        }
    }
}

impl std::fmt::Debug for QuoteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteService")
            .field("backend", &self.gateway.backend_name())
            .field("has_remote", &self.remote.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ALL_CATEGORIES;
    use crate::storage::{MemoryGateway, MemoryRemote};

    fn service() -> (QuoteService, Arc<MemoryGateway>) {
        let gateway = Arc::new(MemoryGateway::new());
        let service = QuoteService::open(Arc::clone(&gateway) as Arc<dyn PersistenceGateway>)
            .unwrap();
        (service, gateway)
    }

    #[test]
    fn test_add_persists_and_upserts() {
        let (service, gateway) = service();
        service.add("A", "x").unwrap();
        service.add(" A ", "y").unwrap();

        assert_eq!(service.all().unwrap(), vec![Quote::new("A", "y").unwrap()]);
        assert_eq!(load_quotes(gateway.as_ref()).unwrap(), service.all().unwrap());
    }

    #[test]
    fn test_add_rejects_blank_without_mutation() {
        let (service, _gateway) = service();
        service.add("A", "x").unwrap();

        assert!(matches!(service.add("  ", "x"), Err(Error::Validation(_))));
        assert!(matches!(service.add("B", ""), Err(Error::Validation(_))));
        assert_eq!(service.all().unwrap().len(), 1);
    }

    #[test]
    fn test_add_save_failure_leaves_store_unchanged() {
        let (service, gateway) = service();
        gateway.fail_saves(true);

        assert!(service.add("A", "x").is_err());
        assert!(service.all().unwrap().is_empty());
    }

    #[test]
    fn test_import_keeps_duplicates() {
        let (service, _gateway) = service();
        let quotes = vec![Quote::new("A", "x").unwrap(), Quote::new("A", "x").unwrap()];
        assert_eq!(service.import(quotes).unwrap(), 2);
        assert_eq!(service.all().unwrap().len(), 2);
    }

    #[test]
    fn test_open_hydrates_from_gateway() {
        let gateway = Arc::new(MemoryGateway::new());
        save_quotes(gateway.as_ref(), &[Quote::new("A", "x").unwrap()]).unwrap();

        let service = QuoteService::open(gateway).unwrap();
        assert_eq!(service.all().unwrap().len(), 1);
    }

    #[test]
    fn test_random_respects_category() {
        let (service, _gateway) = service();
        assert!(service.random(ALL_CATEGORIES).unwrap().is_none());

        service.add("A", "x").unwrap();
        service.add("B", "y").unwrap();
        assert_eq!(service.random("y").unwrap().map(|q| q.text), Some("B".to_string()));
        assert!(service.random("z").unwrap().is_none());
    }

    #[test]
    fn test_category_preference() {
        let (service, _gateway) = service();
        assert_eq!(service.last_category().unwrap(), "all");

        service.select_category("Motivation").unwrap();
        assert_eq!(service.last_category().unwrap(), "Motivation");
        assert_eq!(service.effective_category(None).unwrap(), "Motivation");
        assert_eq!(service.effective_category(Some("x")).unwrap(), "x");
    }

    #[test]
    fn test_categories_and_export() {
        let (service, _gateway) = service();
        service.add("A", "x").unwrap();
        service.add("B", "y").unwrap();
        service.add("C", "x").unwrap();

        assert_eq!(service.categories().unwrap(), vec!["all", "x", "y"]);
        let json = service.export_json().unwrap();
        let parsed: Vec<Quote> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 3);
    }

    #[tokio::test]
    async fn test_publish_requires_remote() {
        let (service, _gateway) = service();
        let quote = Quote::new("A", "x").unwrap();
        assert!(matches!(service.publish(&quote).await, Err(Error::Config(_))));

        let remote = Arc::new(MemoryRemote::new());
        let service = service.with_remote(Arc::clone(&remote) as Arc<dyn RemoteProvider>);
        service.publish(&quote).await.unwrap();
        assert_eq!(remote.quotes(), vec![quote]);
    }
}
