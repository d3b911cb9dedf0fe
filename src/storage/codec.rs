//! JSON encoding of the quote collection and the category preference.

use crate::models::{ALL_CATEGORIES, Quote};
use crate::storage::traits::{LAST_CATEGORY_KEY, PersistenceGateway, QUOTES_KEY};
use crate::{Error, Result};
use tracing::warn;

/// Serializes quotes as a JSON array of `{text, category}` objects.
///
/// # Errors
///
/// Returns [`Error::Persistence`] if serialization fails.
pub fn encode_quotes(quotes: &[Quote]) -> Result<Vec<u8>> {
    serde_json::to_vec(quotes).map_err(|e| Error::persistence("encode_quotes", e))
}

/// Parses a JSON array of quotes.
///
/// Records are trimmed; records left empty are dropped with a warning.
///
/// # Errors
///
/// Returns [`Error::Persistence`] if the bytes are not a JSON array of quotes.
pub fn decode_quotes(bytes: &[u8]) -> Result<Vec<Quote>> {
    let raw: Vec<Quote> =
        serde_json::from_slice(bytes).map_err(|e| Error::persistence("decode_quotes", e))?;
    let total = raw.len();
    let quotes: Vec<Quote> = raw
        .into_iter()
        .filter_map(|q| q.normalized().ok())
        .collect();
    if quotes.len() < total {
        warn!(
            dropped = total - quotes.len(),
            "Dropped invalid quotes while decoding"
        );
    }
    Ok(quotes)
}

/// Loads the persisted quote collection; a missing key yields an empty list.
///
/// # Errors
///
/// Returns an error if the gateway fails or the payload is corrupt.
pub fn load_quotes(gateway: &dyn PersistenceGateway) -> Result<Vec<Quote>> {
    gateway
        .load(QUOTES_KEY)?
        .map_or_else(|| Ok(Vec::new()), |bytes| decode_quotes(&bytes))
}

/// Persists the full quote collection.
///
/// # Errors
///
/// Returns an error if encoding or the gateway fails.
pub fn save_quotes(gateway: &dyn PersistenceGateway, quotes: &[Quote]) -> Result<()> {
    let bytes = encode_quotes(quotes)?;
    gateway.save(QUOTES_KEY, &bytes)?;
    metrics::counter!("quote_store_saves_total", "backend" => gateway.backend_name())
        .increment(1);
    Ok(())
}

/// Loads the last selected category, defaulting to `"all"`.
///
/// # Errors
///
/// Returns an error if the gateway fails.
pub fn load_last_category(gateway: &dyn PersistenceGateway) -> Result<String> {
    let category = gateway
        .load(LAST_CATEGORY_KEY)?
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Ok(category.unwrap_or_else(|| ALL_CATEGORIES.to_string()))
}

/// Persists the last selected category.
///
/// # Errors
///
/// Returns an error if the gateway fails.
pub fn save_last_category(gateway: &dyn PersistenceGateway, category: &str) -> Result<()> {
    gateway.save(LAST_CATEGORY_KEY, category.trim().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryGateway;

    #[test]
    fn test_decode_drops_blank_records() {
        let bytes = br#"[{"text":" A ","category":"x"},{"text":"  ","category":"y"}]"#;
        let quotes = decode_quotes(bytes).unwrap();
        assert_eq!(quotes, vec![Quote::new("A", "x").unwrap()]);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_quotes(b"not json").unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }

    #[test]
    fn test_decode_rejects_unknown_fields() {
        let bytes = br#"[{"text":"A","category":"x","id":7}]"#;
        let err = decode_quotes(bytes).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }

    #[test]
    fn test_load_missing_key_is_empty() {
        let gateway = MemoryGateway::new();
        assert!(load_quotes(&gateway).unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let gateway = MemoryGateway::new();
        let quotes = vec![
            Quote::new("B", "y").unwrap(),
            Quote::new("A", "x").unwrap(),
        ];
        save_quotes(&gateway, &quotes).unwrap();
        assert_eq!(load_quotes(&gateway).unwrap(), quotes);
    }

    #[test]
    fn test_last_category_defaults_to_all() {
        let gateway = MemoryGateway::new();
        assert_eq!(load_last_category(&gateway).unwrap(), "all");

        save_last_category(&gateway, "life").unwrap();
        assert_eq!(load_last_category(&gateway).unwrap(), "life");
    }
}
