//! CLI command implementations.
//!
//! Each handler takes an [`AppContext`] and writes its human-readable output
//! to the given writer; `main.rs` passes stdout.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `add` | Add (or replace) a quote, optionally publishing it |
//! | `list` | List quotes in a category |
//! | `categories` | List categories |
//! | `random` | Show a random quote |
//! | `select` | Persist the category filter |
//! | `import` | Append quotes from a JSON file |
//! | `export` | Print the collection as JSON |
//! | `sync` | Run one sync pass |
//! | `resolve` | Settle a divergence: `local`, `server` or `merge` |
//! | `watch` | Run the auto-sync scheduler until Ctrl-C |
//!
//! # Example Usage
//!
//! ```bash
//! quote-sync add "The best way out is always through." Motivation --push
//! quote-sync sync --policy merge
//! QUOTE_SYNC_REMOTE_URL=http://localhost:8080/quotes quote-sync watch --interval-ms 30000
//! ```

mod context;
mod quotes;
mod sync;

pub use context::AppContext;
pub use quotes::{
    cmd_add, cmd_categories, cmd_export, cmd_import, cmd_list, cmd_random, cmd_select,
};
pub use sync::{cmd_resolve, cmd_sync, cmd_watch};

use crate::Error;

#[allow(clippy::needless_pass_by_value)]
fn io_error(e: std::io::Error) -> Error {
    Error::OperationFailed {
        operation: "write_output".to_string(),
        cause: e.to_string(),
    }
}
