//! Sync CLI commands: sync, resolve, watch.

use super::{AppContext, io_error};
use crate::Result;
use crate::models::{ConflictPolicy, ResolveAction, SyncEvent, SyncOutcome};
use crate::services::{ConflictResolver, SyncScheduler};
use std::future::Future;
use std::io::Write;
use tokio::sync::broadcast::error::RecvError;

/// Runs one sync pass. Uses the configured policy when none is given.
///
/// # Errors
///
/// Returns an error if no remote is configured, the fetch fails or the
/// result cannot be persisted.
pub async fn cmd_sync(
    ctx: &AppContext,
    policy: Option<ConflictPolicy>,
    out: &mut dyn Write,
) -> Result<()> {
    let engine = ctx.engine()?;
    let policy = policy.unwrap_or_else(|| engine.policy());
    let outcome = engine.sync(policy).await?;
    write_outcome(&outcome, out)
}

fn write_outcome(outcome: &SyncOutcome, out: &mut dyn Write) -> Result<()> {
    let Some(report) = outcome.report() else {
        return writeln!(out, "Sync already in progress; nothing to do").map_err(io_error);
    };
    writeln!(out, "Sync completed ({}): {}", report.policy, report.result.summary())
        .map_err(io_error)?;
    if let Some(push) = &report.push {
        match &push.error {
            None => writeln!(out, "Pushed {} of {} local quotes", push.pushed, push.attempted),
            Some(e) => writeln!(
                out,
                "Push stopped after {} of {} quotes: {e}",
                push.pushed, push.attempted
            ),
        }
        .map_err(io_error)?;
    }
    Ok(())
}

/// Applies a manual resolution.
///
/// # Errors
///
/// Returns an error if no remote is configured or the resolution fails.
pub async fn cmd_resolve(
    ctx: &AppContext,
    action: ResolveAction,
    out: &mut dyn Write,
) -> Result<()> {
    let resolver = ConflictResolver::new(ctx.engine()?);
    resolver.resolve(action).await?;
    let count = ctx.quotes().all()?.len();
    writeln!(out, "Resolved with '{action}': {count} quotes stored").map_err(io_error)
}

/// Runs the scheduler and prints sync events until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if no remote is configured or the interval is invalid.
pub async fn cmd_watch<S>(
    ctx: &AppContext,
    interval_ms: Option<u64>,
    shutdown: S,
    out: &mut dyn Write,
) -> Result<()>
where
    S: Future<Output = ()>,
{
    let engine = ctx.engine()?;
    let scheduler = SyncScheduler::new(engine);
    let mut events = ctx.events().subscribe();

    // An explicit interval arms the timer even when auto_start is off.
    if interval_ms.is_some() || ctx.config().sync.auto_start {
        scheduler.start(interval_ms.unwrap_or(ctx.config().sync.interval_ms))?;
    } else {
        writeln!(out, "Auto-sync disabled; waiting for Ctrl-C").map_err(io_error)?;
    }

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            event = events.recv() => match event {
                Ok(event) => write_event(&event, out)?,
                Err(RecvError::Lagged(skipped)) => {
                    writeln!(out, "({skipped} events skipped)").map_err(io_error)?;
                },
                Err(RecvError::Closed) => break,
            },
        }
    }

    scheduler.stop();
    Ok(())
}

fn write_event(event: &SyncEvent, out: &mut dyn Write) -> Result<()> {
    let at = chrono::Local::now().format("%H:%M:%S");
    match event {
        SyncEvent::Completed {
            new_count,
            conflict_count,
            ..
        } => writeln!(out, "[{at}] sync: {new_count} new, {conflict_count} conflicts"),
        SyncEvent::Failed { cause, .. } => writeln!(out, "[{at}] sync failed: {cause}"),
        SyncEvent::ConflictDetected { .. } => {
            writeln!(out, "[{at}] divergence found; run `quote-sync resolve <local|server|merge>`")
        },
        SyncEvent::PushFailed { pushed, cause } => {
            writeln!(out, "[{at}] push stopped after {pushed}: {cause}")
        },
        SyncEvent::SchedulerStarted { interval_ms } => {
            writeln!(out, "[{at}] auto-sync every {interval_ms}ms")
        },
        SyncEvent::SchedulerStopped => writeln!(out, "[{at}] auto-sync stopped"),
        SyncEvent::Coalesced | SyncEvent::Resolved { .. } => return Ok(()),
    }
    .map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuoteSyncConfig;
    use crate::models::{PushMode, Quote};
    use crate::services::QuoteService;
    use crate::storage::{MemoryGateway, MemoryRemote, RemoteProvider};
    use std::sync::Arc;

    fn context(remote: &Arc<MemoryRemote>, push: PushMode) -> AppContext {
        let mut config = QuoteSyncConfig::default();
        config.sync.push = push;
        let quotes = QuoteService::open(Arc::new(MemoryGateway::new())).unwrap();
        AppContext::with_remote(
            config,
            quotes,
            Some(Arc::clone(remote) as Arc<dyn RemoteProvider>),
        )
    }

    fn q(text: &str, category: &str) -> Quote {
        Quote::new(text, category).unwrap()
    }

    #[tokio::test]
    async fn test_sync_prints_summary() {
        let remote = Arc::new(MemoryRemote::with_quotes(vec![q("R", "Server")]));
        let ctx = context(&remote, PushMode::OnlyLocal);
        ctx.quotes().add("L", "x").unwrap();

        let mut buf = Vec::new();
        cmd_sync(&ctx, None, &mut buf).await.unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Fetched 1 new quotes from server"));
        assert!(text.contains("Pushed 1 of 1"));
        assert_eq!(ctx.quotes().all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sync_without_remote_is_config_error() {
        let quotes = QuoteService::open(Arc::new(MemoryGateway::new())).unwrap();
        let ctx = AppContext::with_remote(QuoteSyncConfig::default(), quotes, None);
        let result = cmd_sync(&ctx, None, &mut Vec::new()).await;
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[tokio::test]
    async fn test_resolve_server() {
        let remote = Arc::new(MemoryRemote::with_quotes(vec![q("R", "Server")]));
        let ctx = context(&remote, PushMode::None);
        ctx.quotes().add("L", "x").unwrap();

        let mut buf = Vec::new();
        cmd_resolve(&ctx, ResolveAction::Server, &mut buf).await.unwrap();
        assert_eq!(ctx.quotes().all().unwrap(), vec![q("R", "Server")]);
        assert!(String::from_utf8(buf).unwrap().contains("1 quotes stored"));
    }

    #[tokio::test]
    async fn test_watch_stops_on_shutdown() {
        let remote = Arc::new(MemoryRemote::new());
        let ctx = context(&remote, PushMode::None);

        let mut buf = Vec::new();
        cmd_watch(&ctx, Some(1000), async {}, &mut buf).await.unwrap();
    }

    #[tokio::test]
    async fn test_watch_rejects_fast_interval() {
        let remote = Arc::new(MemoryRemote::new());
        let ctx = context(&remote, PushMode::None);
        let result = cmd_watch(&ctx, Some(10), async {}, &mut Vec::new()).await;
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }
}
