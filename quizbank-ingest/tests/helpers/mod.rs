//! Test Helper Utilities
//!
//! Shared utilities for testing quizbank-ingest

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::{
    count_rows, fill_record, matching_record, mcq_record, reorder_record, test_app_state,
    test_importer, truefalse_record, StubFetcher,
};
