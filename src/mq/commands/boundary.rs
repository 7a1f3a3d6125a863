use crate::error::Result;
use crate::queue::{MessageQueue, QueueTransaction};

/// How each unit of work in a transfer loop is framed.
///
/// Chosen once per run; the loop bodies are the same either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionBoundary {
    /// Run the unit directly against the queue.
    None,
    /// Begin a transaction, run the unit inside it, commit.
    PerMessage,
}

impl TransactionBoundary {
    pub fn for_transactional(transactional: bool) -> Self {
        if transactional {
            TransactionBoundary::PerMessage
        } else {
            TransactionBoundary::None
        }
    }

    /// Run `unit` inside this boundary. If `unit` fails the open transaction is dropped
    /// uncommitted, which rolls it back.
    pub fn run<Q, T, F>(self, queue: &mut Q, unit: F) -> Result<T>
    where
        Q: MessageQueue,
        F: FnOnce(&mut Q, Option<&mut Q::Transaction>) -> Result<T>,
    {
        match self {
            TransactionBoundary::None => unit(queue, None),
            TransactionBoundary::PerMessage => {
                let mut txn = queue.begin()?;
                let output = unit(queue, Some(&mut txn))?;
                txn.commit()?;
                Ok(output)
            }
        }
    }
}
