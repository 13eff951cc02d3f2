//! Database initialization and lookup data

pub mod init;

pub use init::*;
