//! Ingestion pipeline services
//!
//! Leaf first: normalizer, validation engine, media resolver, persistence
//! engine, batch orchestrator.

pub mod batch_orchestrator;
pub mod media_resolver;
pub mod question_persistence;
pub mod record_normalizer;
pub mod validation_engine;

pub use batch_orchestrator::{BatchError, BatchImporter, EntryError};
pub use media_resolver::{
    FsMediaStore, HttpImageFetcher, ImageFetcher, MediaError, MediaResolver, MediaStore,
};
pub use question_persistence::{persist_question, PersistError};
pub use record_normalizer::{normalize, normalize_all};
pub use validation_engine::validate_batch;
