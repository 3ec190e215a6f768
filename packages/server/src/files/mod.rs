//! File lifecycle: records, owner mappings, content references and orphan
//! garbage collection.

pub mod collector;
pub mod content;
mod error;
pub mod gc;
pub mod mapping;
pub mod scheduler;
pub mod store;
pub mod upload;

pub use collector::{CollectorRegistry, MappingCollector, UsageCollector};
pub use content::{ContentDiff, compute_diff, extract_references};
pub use error::FileError;
pub use gc::{GcReport, run_gc};
pub use mapping::{FileRole, MappingService, OwnerKind, OwnerRef};
pub use scheduler::{GarbageCollector, run_file_gc};
pub use store::{FileRecordStore, NewFileRecord};
