pub mod ai;
pub mod analytics;
pub mod backend;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod fixtures;
pub mod mapper;
pub mod snapshot;
pub mod sync;
pub mod validation;

pub mod types;

pub use crate::backend::{Backend, MemoryBackend, Row};
pub use crate::config::Config;
pub use crate::dashboard::{Dashboard, RequestContext};
pub use crate::error::PulseError;
pub use crate::fixtures::FixtureDataset;
pub use crate::snapshot::{FallbackReason, Snapshot, SnapshotSource};
pub use crate::sync::SyncController;
