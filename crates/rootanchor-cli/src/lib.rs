//! # rootanchor-cli
//!
//! Command-line interface over the `rootanchor` trust engine.
//!
//! ## Commands
//!
//! - **install**: trust a CA certificate in every applicable store
//! - **uninstall**: remove it again, receipt-driven or by file
//! - **status**: per-store trust state plus the aggregate verdict
//! - **expiry**: validity window and renewal warning
//! - **browser**: what the default browser is and how it decides trust

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
