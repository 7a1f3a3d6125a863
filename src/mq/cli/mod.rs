//! # CLI Layer
//!
//! The command-line client for mq. It is the only code that:
//! - Reads `std::env::args`, environment variables and the config file
//! - Writes to stdout/stderr
//! - Chooses the process exit code
//!
//! ## Environment
//!
//! - `MQ_SPOOL_DIR`: spool root, overriding `spool_dir` from the config file
//! - `MQ_CONFIG_DIR`: directory holding `config.json`, overriding the platform config dir
//! - `RUST_LOG`: log filter (default `warn`), logs go to stderr
//!
//! ## Exit codes
//!
//! - `0`: transfer completed, or usage was shown (no arguments, or invalid arguments)
//! - `1`: the transfer started and failed, or the client could not be set up

mod commands;
mod print;

pub use commands::run;
