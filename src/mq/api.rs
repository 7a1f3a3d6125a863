//! # API Facade
//!
//! The single entry point for running a transfer, whatever front end drives it.
//!
//! The facade:
//! - **Resolves** the queue address from the operation's machine and queue names
//! - **Selects** the transaction boundary once per run
//! - **Dispatches** to the import or export loop in `commands/`
//!
//! It does no printing and never exits the process; everything the caller needs to report is
//! on the returned [`TransferResult`].
//!
//! ## Generic Over Backends
//!
//! `MqApi<S: QueueService, F: FileStore>`:
//! - Production: `MqApi<SpoolQueueService, LocalStore>`
//! - Testing: `MqApi<InMemoryQueueService, InMemoryStore>`
//!
//! API tests check dispatch and argument plumbing only. Loop behavior is tested in the
//! command modules, backend behavior in `queue/` and `store/`.
//!
//! [`TransferResult`]: crate::commands::TransferResult

use crate::args::{Mode, Operation};
use crate::commands::{self, TransactionBoundary, TransferResult};
use crate::error::MqError;
use crate::queue::QueueService;
use crate::store::FileStore;
use log::info;

pub struct MqApi<S: QueueService, F: FileStore> {
    service: S,
    files: F,
}

impl<S: QueueService, F: FileStore> MqApi<S, F> {
    pub fn new(service: S, files: F) -> Self {
        Self { service, files }
    }

    /// Run `operation` to completion.
    pub fn run(&mut self, operation: &Operation) -> TransferResult {
        let Some(address) = operation.address() else {
            let mut result = TransferResult::default();
            result.fail(MqError::InvalidAddress(format!(
                "machine '{}', queue '{}'",
                operation.machine_name(),
                operation.queue_name()
            )));
            return result;
        };
        let address = address.to_string();
        let boundary = TransactionBoundary::for_transactional(operation.is_transactional());
        info!("{:?} {} ({:?})", operation.mode(), address, boundary);

        match operation.mode() {
            Mode::Import => self.import(&address, boundary, operation.file_patterns()),
            Mode::Export => self.export(&address, boundary, operation.max_count()),
        }
    }

    pub fn import(
        &mut self,
        address: &str,
        boundary: TransactionBoundary,
        patterns: &[String],
    ) -> TransferResult {
        commands::import::run(&self.service, &self.files, address, boundary, patterns)
    }

    pub fn export(
        &mut self,
        address: &str,
        boundary: TransactionBoundary,
        max_count: u32,
    ) -> TransferResult {
        commands::export::run(&self.service, &mut self.files, address, boundary, max_count)
    }
}
