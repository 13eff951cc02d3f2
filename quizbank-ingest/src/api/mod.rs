//! HTTP API handlers for quizbank-ingest

pub mod health;
pub mod images;
pub mod import;
pub mod lookups;
pub mod questions;

pub use health::health_routes;
pub use images::image_routes;
pub use import::import_routes;
pub use lookups::lookup_routes;
pub use questions::question_routes;
