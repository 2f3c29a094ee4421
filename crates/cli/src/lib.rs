//! Shelf - versioned, change-aware backups of named jobs
//!
//! The [`BackupCoordinator`] ties together the storage primitives of
//! `shelf-core` and the version journal of `shelf-journal`:
//! - job definitions come from a [`ConfigProvider`]
//! - a backup is skipped when the sources' digest matches the stored one
//! - otherwise a new `<job>-<N>.tar.gz` archive is written
//! - any archived version can be restored into a target directory

pub mod cmd;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod locks;
pub mod util;

pub use config::{
    ConfigError, ConfigProvider, FileConfigProvider, JobConfig, JobDefinition,
    StaticConfigProvider,
};
pub use coordinator::{BackupCoordinator, BackupOutcome, BackupStage, RestoreOutcome};
pub use error::{Result, ShelfError};
pub use locks::JobLock;
