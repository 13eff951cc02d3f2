//! # Quizbank Common Library
//!
//! Shared code for the quizbank services:
//! - Error type used across crates
//! - Configuration loading and root folder resolution
//! - Database initialization (schema and lookup seeding)

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
