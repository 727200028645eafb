//! DMS Sync Engine
//!
//! Multi-backend synchronization and archive backup for a document-management
//! storage tree. Replicates local documents and logs to a network share,
//! a WebDAV server, or a local mirror, and snapshots/restores the whole
//! storage root as a portable zip archive.

pub mod backend;
pub mod backup;
pub mod config;
pub mod engine;
pub mod fs;
pub mod report;
pub mod utils;

// Re-export commonly used types and operations
pub use backend::{RemoteTreeClient, SyncBackend};
pub use backup::archive::{create_backup, fetch_backup, list_backups};
pub use backup::restore::restore;
pub use config::{BackendConfig, SyncScope};
pub use engine::{run_sync, sync_log_file, sync_tree, test_connection};
pub use report::{SyncOutcome, SyncReport, SyncSummary};
pub use utils::errors::SyncError;
pub type Result<T> = std::result::Result<T, SyncError>;
