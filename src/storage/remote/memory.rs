//! In-process remote provider.
//!
//! Holds the "server" collection in memory. Pushed quotes are upserted into
//! it by text. Failure switches and an optional fetch delay make it usable
//! for exercising the failure and concurrency paths of the sync engine.

use crate::models::Quote;
use crate::storage::traits::RemoteProvider;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Remote collection living in process memory.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    quotes: Mutex<Vec<Quote>>,
    pushed: Mutex<Vec<Quote>>,
    fetch_delay: Mutex<Option<Duration>>,
    push_budget: Mutex<Option<usize>>,
    fail_fetch: AtomicBool,
    fetches: AtomicUsize,
}

impl MemoryRemote {
    /// Creates an empty remote.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a remote holding `quotes`.
    #[must_use]
    pub fn with_quotes(quotes: Vec<Quote>) -> Self {
        Self {
            quotes: Mutex::new(quotes),
            ..Self::default()
        }
    }

    /// Replaces the remote collection.
    pub fn set_quotes(&self, quotes: Vec<Quote>) {
        *lock(&self.quotes) = quotes;
    }

    /// Returns a copy of the remote collection.
    #[must_use]
    pub fn quotes(&self) -> Vec<Quote> {
        lock(&self.quotes).clone()
    }

    /// Returns every quote accepted by `push`, in order.
    #[must_use]
    pub fn pushed(&self) -> Vec<Quote> {
        lock(&self.pushed).clone()
    }

    /// Returns how many fetches have started.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Makes fetches fail (or succeed again).
    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Lets `budget` more pushes succeed, then fails every push. `None` lifts the limit.
    pub fn limit_pushes(&self, budget: Option<usize>) {
        *lock(&self.push_budget) = budget;
    }

    /// Delays every fetch by `delay`.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        *lock(&self.fetch_delay) = delay;
    }
}

/// Locks a mutex, recovering the value if a panicking test poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl RemoteProvider for MemoryRemote {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_all(&self) -> Result<Vec<Quote>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.fetch_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Error::remote("fetch_all", "remote is offline"));
        }
        Ok(self.quotes())
    }

    async fn push(&self, quote: &Quote) -> Result<()> {
        {
            let mut budget = lock(&self.push_budget);
            match budget.as_mut() {
                Some(0) => return Err(Error::remote("push", "remote rejected push")),
                Some(remaining) => *remaining -= 1,
                None => {},
            }
        }

        let mut quotes = lock(&self.quotes);
        match quotes.iter_mut().find(|q| q.text == quote.text) {
            Some(existing) => *existing = quote.clone(),
            None => quotes.push(quote.clone()),
        }
        drop(quotes);
        lock(&self.pushed).push(quote.clone());
        Ok(())
    }
}
