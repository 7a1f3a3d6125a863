use crate::commands::{CmdMessage, TransactionBoundary, TransferResult};
use crate::error::Result;
use crate::model::Message;
use crate::queue::{MessageQueue, QueueService};
use crate::store::FileStore;
use log::debug;

/// Send every file matched by `patterns` to the queue at `address`, one message per file.
///
/// Patterns are processed in order. The first failure ends the run; files sent before it
/// stay sent.
pub fn run<S: QueueService, F: FileStore>(
    service: &S,
    files: &F,
    address: &str,
    boundary: TransactionBoundary,
    patterns: &[String],
) -> TransferResult {
    let mut result = TransferResult::default();

    if let Err(e) = send_patterns(service, files, address, boundary, patterns, &mut result) {
        result.fail(e);
    }

    result.add_message(CmdMessage::success(format!(
        "Send {} message(s) into {}",
        result.count, address
    )));
    result
}

fn send_patterns<S: QueueService, F: FileStore>(
    service: &S,
    files: &F,
    address: &str,
    boundary: TransactionBoundary,
    patterns: &[String],
    result: &mut TransferResult,
) -> Result<()> {
    let mut queue = service.open(address)?;

    for pattern in patterns {
        let matched = files.expand(pattern)?;
        if matched.is_empty() {
            result.add_message(CmdMessage::warning(format!("No files match {}", pattern)));
            continue;
        }

        for path in matched {
            let message = Message::binary(files.read_all(&path)?);
            boundary.run(&mut queue, |q, txn| q.send(&message, txn))?;
            debug!("Sent {} ({} bytes)", path.display(), message.body().map_or(0, <[u8]>::len));

            result.count += 1;
            result.add_message(CmdMessage::info(path.display().to_string()));
        }
    }
    Ok(())
}
