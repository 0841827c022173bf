//! File-system side of Parley: attachment ingestion, config and secret
//! storage, and platform paths.

pub mod ingest;
pub mod paths;
pub mod storage;

pub use crate::ingest::{AttachmentIngestor, IngestReport, SelectedFile};
pub use crate::paths::ParleyPaths;
pub use crate::storage::{ConfigStorage, SecretStorage};
