//! Command implementations for the CLI
//!
//! - start: Start the HTTP server
//! - test: Test configuration validity

pub mod start;
