//! In-memory record store.
//!
//! The store is the single source of truth while the process runs. It is not
//! synchronized internally; callers share it through [`SharedStore`] and take
//! the write lock for every mutation.

use crate::models::{ALL_CATEGORIES, Quote};
use crate::{Error, Result};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Record store shared between the quote service and the sync engine.
pub type SharedStore = Arc<RwLock<RecordStore>>;

/// Ordered collection of quotes, insertion order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<Quote>,
}

impl RecordStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Creates a store holding `records` as given.
    #[must_use]
    pub const fn from_records(records: Vec<Quote>) -> Self {
        Self { records }
    }

    /// Wraps the store for sharing.
    #[must_use]
    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    /// Returns every record in order.
    #[must_use]
    pub fn all(&self) -> &[Quote] {
        &self.records
    }

    /// Returns the records in `category`, or every record for `"all"`.
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<&Quote> {
        self.records
            .iter()
            .filter(|q| q.matches_category(category))
            .collect()
    }

    /// Returns the record stored under `text`.
    #[must_use]
    pub fn get(&self, text: &str) -> Option<&Quote> {
        self.records.iter().find(|q| q.text == text)
    }

    /// Adds a quote after validating it.
    ///
    /// A quote whose text is already present replaces that entry in place;
    /// otherwise it is appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if text or category is empty after
    /// trimming. The store is unchanged in that case.
    pub fn add(&mut self, quote: Quote) -> Result<()> {
        let quote = quote.normalized()?;
        match self.records.iter_mut().find(|q| q.text == quote.text) {
            Some(existing) => *existing = quote,
            None => self.records.push(quote),
        }
        Ok(())
    }

    /// Appends quotes verbatim, duplicates included.
    ///
    /// Every quote is validated before any is appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if any quote is invalid.
    pub fn extend(&mut self, quotes: Vec<Quote>) -> Result<usize> {
        let quotes = quotes
            .into_iter()
            .map(Quote::normalized)
            .collect::<Result<Vec<_>>>()?;
        let count = quotes.len();
        self.records.extend(quotes);
        Ok(count)
    }

    /// Swaps the whole collection.
    pub fn replace_all(&mut self, records: Vec<Quote>) {
        self.records = records;
    }

    /// Returns `"all"` followed by every category in first-seen order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        for quote in &self.records {
            if !categories.iter().any(|c| c == &quote.category) {
                categories.push(quote.category.clone());
            }
        }
        categories
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Takes the read lock, mapping poison to an error.
pub(crate) fn read_store(store: &SharedStore) -> Result<RwLockReadGuard<'_, RecordStore>> {
    store.read().map_err(|e| Error::OperationFailed {
        operation: "read_store".to_string(),
        cause: e.to_string(),
    })
}

/// Takes the write lock, mapping poison to an error.
pub(crate) fn write_store(store: &SharedStore) -> Result<RwLockWriteGuard<'_, RecordStore>> {
    store.write().map_err(|e| Error::OperationFailed {
        operation: "write_store".to_string(),
        cause: e.to_string(),
    })
}
