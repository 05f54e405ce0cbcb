//! Application layer - the create and update flows.
//!
//! Sequences the package components:
//! - create: resolve targets, write the archive, upload
//! - update: catalog lookup, download, extract

mod sync;

pub use sync::{SyncManager, UpdateSummary};
