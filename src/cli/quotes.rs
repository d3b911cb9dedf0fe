//! Local quote commands: add, list, categories, random, select, import, export.

use super::{AppContext, io_error};
use crate::models::Quote;
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;

/// Adds a quote and optionally publishes it to the remote.
///
/// A failed publish is reported but the local add stands.
///
/// # Errors
///
/// Returns an error if validation or persistence fails.
pub async fn cmd_add(
    ctx: &AppContext,
    text: &str,
    category: &str,
    push: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let quote = ctx.quotes().add(text, category)?;
    writeln!(out, "Added: {quote}").map_err(io_error)?;

    if push {
        match ctx.quotes().publish(&quote).await {
            Ok(()) => writeln!(out, "Published to remote").map_err(io_error)?,
            Err(e) => writeln!(out, "Publish failed: {e}").map_err(io_error)?,
        }
    }
    Ok(())
}

/// Lists quotes in a category; defaults to the last selected one.
///
/// # Errors
///
/// Returns an error if the store or gateway fails.
pub fn cmd_list(ctx: &AppContext, category: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let category = ctx.quotes().effective_category(category)?;
    let quotes = ctx.quotes().by_category(&category)?;
    if quotes.is_empty() {
        writeln!(out, "No quotes in '{category}'").map_err(io_error)?;
        return Ok(());
    }
    for quote in &quotes {
        writeln!(out, "{quote}").map_err(io_error)?;
    }
    Ok(())
}

/// Prints `all` followed by every category.
///
/// # Errors
///
/// Returns an error if the store lock is poisoned.
pub fn cmd_categories(ctx: &AppContext, out: &mut dyn Write) -> Result<()> {
    for category in ctx.quotes().categories()? {
        writeln!(out, "{category}").map_err(io_error)?;
    }
    Ok(())
}

/// Prints one random quote from a category.
///
/// # Errors
///
/// Returns an error if the store or gateway fails.
pub fn cmd_random(ctx: &AppContext, category: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let category = ctx.quotes().effective_category(category)?;
    match ctx.quotes().random(&category)? {
        Some(quote) => writeln!(out, "{quote}"),
        None => writeln!(out, "No quotes available in '{category}'"),
    }
    .map_err(io_error)
}

/// Persists the category filter.
///
/// # Errors
///
/// Returns an error if the category is empty or the save fails.
pub fn cmd_select(ctx: &AppContext, category: &str, out: &mut dyn Write) -> Result<()> {
    ctx.quotes().select_category(category)?;
    writeln!(out, "Selected category: {}", category.trim()).map_err(io_error)
}

/// Imports a JSON array of `{text, category}` objects.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any record is
/// invalid, or persistence fails.
pub fn cmd_import(ctx: &AppContext, path: &Path, out: &mut dyn Write) -> Result<()> {
    let contents = std::fs::read(path).map_err(|e| Error::OperationFailed {
        operation: "read_import_file".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    let quotes: Vec<Quote> = serde_json::from_slice(&contents)
        .map_err(|e| Error::InvalidInput(format!("{} is not a quote array: {e}", path.display())))?;
    let count = ctx.quotes().import(quotes)?;
    writeln!(out, "Quotes imported successfully! ({count})").map_err(io_error)
}

/// Writes the collection as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn cmd_export(ctx: &AppContext, out: &mut dyn Write) -> Result<()> {
    let json = ctx.quotes().export_json()?;
    writeln!(out, "{json}").map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuoteSyncConfig;
    use crate::services::QuoteService;
    use crate::storage::{MemoryGateway, MemoryRemote, RemoteProvider};
    use std::sync::Arc;

    fn context(remote: Option<Arc<MemoryRemote>>) -> AppContext {
        let quotes = QuoteService::open(Arc::new(MemoryGateway::new())).unwrap();
        AppContext::with_remote(
            QuoteSyncConfig::default(),
            quotes,
            remote.map(|r| r as Arc<dyn RemoteProvider>),
        )
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let ctx = context(None);
        let mut buf = Vec::new();
        cmd_add(&ctx, "Stay hungry", "Motivation", false, &mut buf).await.unwrap();
        cmd_list(&ctx, None, &mut buf).unwrap();

        let text = output(buf);
        assert!(text.contains("Added: \"Stay hungry\" [Motivation]"));
        assert_eq!(text.matches("\"Stay hungry\"").count(), 2);
    }

    #[tokio::test]
    async fn test_add_with_push_reports_missing_remote() {
        let ctx = context(None);
        let mut buf = Vec::new();
        cmd_add(&ctx, "A", "x", true, &mut buf).await.unwrap();
        assert!(output(buf).contains("Publish failed"));
        assert_eq!(ctx.quotes().all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_with_push_publishes() {
        let remote = Arc::new(MemoryRemote::new());
        let ctx = context(Some(Arc::clone(&remote)));
        let mut buf = Vec::new();
        cmd_add(&ctx, "A", "x", true, &mut buf).await.unwrap();
        assert_eq!(remote.pushed().len(), 1);
    }

    #[test]
    fn test_select_filters_list() {
        let ctx = context(None);
        ctx.quotes().add("A", "x").unwrap();
        ctx.quotes().add("B", "y").unwrap();

        let mut buf = Vec::new();
        cmd_select(&ctx, "y", &mut buf).unwrap();
        let mut buf = Vec::new();
        cmd_list(&ctx, None, &mut buf).unwrap();

        let text = output(buf);
        assert!(text.contains("\"B\""));
        assert!(!text.contains("\"A\""));
    }

    #[test]
    fn test_import_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(&path, r#"[{"text":"A","category":"x"},{"text":"B","category":"y"}]"#)
            .unwrap();

        let ctx = context(None);
        let mut buf = Vec::new();
        cmd_import(&ctx, &path, &mut buf).unwrap();
        assert!(output(buf).contains("(2)"));

        let mut buf = Vec::new();
        cmd_export(&ctx, &mut buf).unwrap();
        let exported: Vec<Quote> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(exported.len(), 2);
    }

    #[test]
    fn test_import_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(&path, r#"{"text":"A"}"#).unwrap();

        let ctx = context(None);
        let result = cmd_import(&ctx, &path, &mut Vec::new());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_random_on_empty_category() {
        let ctx = context(None);
        let mut buf = Vec::new();
        cmd_random(&ctx, Some("nothing"), &mut buf).unwrap();
        assert!(output(buf).contains("No quotes available"));
    }
}
