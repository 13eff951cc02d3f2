//! Database access for quizbank-ingest
//!
//! Schema creation and lookup seeding live in `quizbank_common::db`.

pub mod lookups;
pub mod questions;
