//! # Queue Service Layer
//!
//! The transfer engine never talks to a transport directly. It goes through three traits:
//!
//! - [`QueueService`]: turns an address string (the display form of a [`QueueAddress`](crate::address::QueueAddress))
//!   into an open queue handle
//! - [`MessageQueue`]: blocking send and receive-with-timeout, optionally inside a transaction
//! - [`QueueTransaction`]: a begin/commit unit of work
//!
//! ## Scoped resources
//!
//! Handles and transactions are ordinary values. A transaction that is dropped without
//! [`QueueTransaction::commit`] is rolled back: staged sends are discarded and received
//! messages go back to the queue.
//!
//! ## Receive results
//!
//! [`MessageQueue::receive`] returns `Ok(Some(message))`, `Ok(None)` when the timeout elapsed
//! with nothing to read, or `Err` for anything else. A timeout is not an error.
//!
//! ## Implementations
//!
//! - [`memory::InMemoryQueueService`]: shared in-process queues for tests
//! - [`spool::SpoolQueueService`]: directory-backed queues, one file per message

use crate::error::Result;
use crate::model::Message;
use std::time::Duration;

pub mod memory;
pub mod spool;

pub trait QueueService {
    type Queue: MessageQueue;

    /// Open the queue named by an address string (see [`crate::address::QueueAddress`]).
    /// Fails if the queue does not exist.
    fn open(&self, address: &str) -> Result<Self::Queue>;
}

pub trait MessageQueue {
    type Transaction: QueueTransaction;

    /// Start a new transaction against this queue.
    fn begin(&mut self) -> Result<Self::Transaction>;

    /// Enqueue `message`. Inside a transaction it only becomes visible on commit.
    fn send(&mut self, message: &Message, txn: Option<&mut Self::Transaction>) -> Result<()>;

    /// Dequeue one message, waiting up to `timeout`.
    fn receive(
        &mut self,
        timeout: Duration,
        txn: Option<&mut Self::Transaction>,
    ) -> Result<Option<Message>>;
}

pub trait QueueTransaction {
    /// Make the transaction's sends visible and its receives permanent.
    fn commit(self) -> Result<()>;
}
