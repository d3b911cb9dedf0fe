//! Quote records.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved category sentinel meaning "no filter".
pub const ALL_CATEGORIES: &str = "all";

/// A single quote.
///
/// The `text` is the identity key: two quotes with the same text are the same
/// record, whatever their category says. Quotes are value objects; updating one
/// means replacing the entry stored under its text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Quote {
    /// The quote body. Non-empty and trimmed.
    pub text: String,
    /// The category the quote is filed under. Non-empty and trimmed.
    pub category: String,
}

impl Quote {
    /// Creates a validated quote, trimming both fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either field is empty after trimming.
    pub fn new(text: impl AsRef<str>, category: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref().trim();
        let category = category.as_ref().trim();
        if text.is_empty() {
            return Err(Error::Validation("quote text is empty".to_string()));
        }
        if category.is_empty() {
            return Err(Error::Validation("quote category is empty".to_string()));
        }
        Ok(Self {
            text: text.to_string(),
            category: category.to_string(),
        })
    }

    /// Re-validates a quote that may have come from an untrusted source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either field is empty after trimming.
    pub fn normalized(self) -> Result<Self> {
        Self::new(&self.text, &self.category)
    }

    /// Returns the identity key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.text
    }

    /// Returns true if the quote belongs to `category` (or `category` is the sentinel).
    #[must_use]
    pub fn matches_category(&self, category: &str) -> bool {
        category == ALL_CATEGORIES || self.category == category
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" [{}]", self.text, self.category)
    }
}
