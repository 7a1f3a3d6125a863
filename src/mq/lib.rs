//! # mq Architecture
//!
//! mq moves data between a directory and a message queue: **import** sends every matching file
//! to a queue, one message per file, and **export** drains queued messages back into files.
//! Either direction can run with one transaction per message.
//!
//! The crate is a library with a thin CLI client on top.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Reads argv, env and config, prints results               │
//! │  - The ONLY place that knows about stdout/exit codes        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Operation → address + transaction boundary               │
//! │  - Dispatches to import or export                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - The transfer loops                                       │
//! │  - Collect counts and messages into a TransferResult        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                 ┌────────────┴────────────┐
//!                 ▼                         ▼
//! ┌───────────────────────────┐ ┌───────────────────────────┐
//! │  Queue Layer (queue/)     │ │  File Layer (store/)      │
//! │  - QueueService trait     │ │  - FileStore trait        │
//! │  - Spool, InMemory        │ │  - LocalStore, InMemory   │
//! └───────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! From `api.rs` inward nothing prints and nothing exits. Failures end up on the
//! `TransferResult` next to the count of messages moved before the failure.
//!
//! ## Testing Strategy
//!
//! 1. **Commands**: the loops against `InMemoryQueueService` and `InMemoryStore`. Most
//!    behavior is pinned down here.
//! 2. **Backends**: `queue/spool.rs` and `store/fs.rs` against temp directories.
//! 3. **API**: dispatch only.
//! 4. **Binary**: `tests/` drives the built executable end to end.
//!
//! ## Module Overview
//!
//! - [`args`]: Command-line grammar and the `Operation` it produces
//! - [`address`]: Machine + queue name → queue address
//! - [`api`]: The API facade
//! - [`commands`]: Import and export loops, transaction boundaries
//! - [`queue`]: Queue service abstraction and implementations
//! - [`store`]: File store abstraction and implementations
//! - [`model`]: The `Message` type
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod address;
pub mod api;
pub mod args;
pub mod commands;
pub mod config;
pub mod error;
pub mod model;
pub mod queue;
pub mod store;
