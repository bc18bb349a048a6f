//! Common infrastructure shared by the northfoot crates
//!
//! Currently this is the logging layer: `env_logger` initialization driven by
//! `RUST_LOG`, plus helpers that keep key material and certificate bodies out
//! of log lines.

#![forbid(unsafe_code)]

pub mod logging;

pub use logging::LoggingTransformer;
