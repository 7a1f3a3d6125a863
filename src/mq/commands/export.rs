use crate::commands::{CmdMessage, TransactionBoundary, TransferResult};
use crate::error::{MqError, Result};
use crate::model::Message;
use crate::queue::{MessageQueue, QueueService};
use crate::store::{FileStore, UniqueFile};
use log::debug;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

/// How long each receive waits for a message before the queue is treated as drained.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Bodies are copied to disk in pieces of this many bytes.
pub const CHUNK_SIZE: usize = 500;

/// Drain up to `max_count` messages from the queue at `address` into new files.
///
/// At least one receive is always attempted, even when `max_count` is 0. An empty queue
/// ends the run normally.
pub fn run<S: QueueService, F: FileStore>(
    service: &S,
    files: &mut F,
    address: &str,
    boundary: TransactionBoundary,
    max_count: u32,
) -> TransferResult {
    let mut result = TransferResult::default();

    if let Err(e) = receive_messages(service, files, address, boundary, max_count, &mut result) {
        result.fail(e);
    }

    result.add_message(CmdMessage::success(format!(
        "Retrieve {} message(s)",
        result.count
    )));
    result
}

fn receive_messages<S: QueueService, F: FileStore>(
    service: &S,
    files: &mut F,
    address: &str,
    boundary: TransactionBoundary,
    max_count: u32,
    result: &mut TransferResult,
) -> Result<()> {
    let mut queue = service.open(address)?;
    let limit = max_count as usize;

    loop {
        // A saved message is counted before the commit, so a refused commit still reports
        // the file it left behind.
        let received = boundary.run(&mut queue, |q, txn| {
            let Some(message) = q.receive(RECEIVE_TIMEOUT, txn)? else {
                return Ok(false);
            };
            if let Some(path) = save_body(files, &message)? {
                result.add_message(CmdMessage::info(path.display().to_string()));
            }
            result.count += 1;
            Ok(true)
        })?;

        if !received {
            debug!("No message within {:?}, stopping", RECEIVE_TIMEOUT);
            break;
        }
        if result.count >= limit {
            break;
        }
    }
    Ok(())
}

fn save_body<F: FileStore>(files: &mut F, message: &Message) -> Result<Option<PathBuf>> {
    let Some(mut body) = message.body_stream() else {
        return Ok(None);
    };

    let mut out = files.create_unique()?;
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let read = body.read(&mut chunk).map_err(MqError::Io)?;
        if read == 0 {
            break;
        }
        out.write_all(&chunk[..read]).map_err(MqError::Io)?;
    }

    let path = out.persist()?;
    debug!("Saved message body to {}", path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::commands::import;
    use crate::queue::memory::InMemoryQueueService;
    use crate::store::memory::InMemoryStore;

    const ADDRESS: &str = r".\Private$\outbox";

    fn service_with(bodies: &[&str]) -> InMemoryQueueService {
        let service = InMemoryQueueService::new().with_queue(ADDRESS);
        for body in bodies {
            service.push(ADDRESS, Message::binary(body.as_bytes().to_vec()));
        }
        service
    }

    fn contents(store: &InMemoryStore) -> Vec<Vec<u8>> {
        store.files().into_iter().map(|(_, c)| c).collect()
    }

    #[test]
    fn test_drains_queue_until_timeout() {
        let service = service_with(&["one", "two"]);
        let mut store = InMemoryStore::new("/out");
        let result = run(&service, &mut store, ADDRESS, TransactionBoundary::None, u32::MAX);

        assert!(result.is_success());
        assert_eq!(result.count, 2);
        assert_eq!(contents(&store), vec![b"one".to_vec(), b"two".to_vec()]);
        // Two messages plus the receive that timed out.
        assert_eq!(service.receive_attempts(), 3);
        assert_eq!(
            result.messages.last().unwrap().content,
            "Retrieve 2 message(s)"
        );
    }

    #[test]
    fn test_empty_queue_is_not_an_error() {
        let service = service_with(&[]);
        let mut store = InMemoryStore::new("/out");
        let result = run(&service, &mut store, ADDRESS, TransactionBoundary::None, 10);

        assert!(result.is_success());
        assert_eq!(result.count, 0);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].level, MessageLevel::Success);
        assert!(store.files().is_empty());
    }

    #[test]
    fn test_max_count_caps_receives() {
        let service = service_with(&["a", "b", "c", "d", "e"]);
        let mut store = InMemoryStore::new("/out");
        let result = run(&service, &mut store, ADDRESS, TransactionBoundary::None, 3);

        assert_eq!(result.count, 3);
        assert_eq!(service.receive_attempts(), 3);
        assert_eq!(service.messages(ADDRESS).len(), 2);
    }

    #[test]
    fn test_max_zero_still_receives_once() {
        let service = service_with(&["a", "b"]);
        let mut store = InMemoryStore::new("/out");
        let result = run(&service, &mut store, ADDRESS, TransactionBoundary::None, 0);

        assert_eq!(service.receive_attempts(), 1);
        assert_eq!(result.count, 1);
        assert_eq!(service.messages(ADDRESS).len(), 1);
    }

    #[test]
    fn test_message_without_body_counts_but_writes_nothing() {
        let service = service_with(&[]);
        service.push(ADDRESS, Message::without_body(0));
        service.push(ADDRESS, Message::binary(b"real".to_vec()));
        let mut store = InMemoryStore::new("/out");
        let result = run(&service, &mut store, ADDRESS, TransactionBoundary::None, u32::MAX);

        assert_eq!(result.count, 2);
        assert_eq!(contents(&store), vec![b"real".to_vec()]);
        let info_lines = result
            .messages
            .iter()
            .filter(|m| m.level == MessageLevel::Info)
            .count();
        assert_eq!(info_lines, 1);
    }

    #[test]
    fn test_large_body_written_in_full() {
        let payload: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        let service = service_with(&[]);
        service.push(ADDRESS, Message::binary(payload.clone()));
        let mut store = InMemoryStore::new("/out");
        run(&service, &mut store, ADDRESS, TransactionBoundary::None, u32::MAX);

        assert_eq!(contents(&store), vec![payload]);
    }

    #[test]
    fn test_transactional_write_failure_leaves_message_queued() {
        let service = service_with(&["keep me"]);
        let mut store = InMemoryStore::new("/out").failing_writes();
        let result = run(
            &service,
            &mut store,
            ADDRESS,
            TransactionBoundary::PerMessage,
            u32::MAX,
        );

        assert!(matches!(result.error, Some(MqError::Io(_))));
        assert_eq!(result.count, 0);
        assert_eq!(service.messages(ADDRESS).len(), 1);
        assert_eq!(
            result.messages.last().unwrap().content,
            "Retrieve 0 message(s)"
        );
    }

    #[test]
    fn test_non_transactional_write_failure_loses_message() {
        let service = service_with(&["gone"]);
        let mut store = InMemoryStore::new("/out").failing_writes();
        let result = run(&service, &mut store, ADDRESS, TransactionBoundary::None, u32::MAX);

        assert!(!result.is_success());
        assert!(service.messages(ADDRESS).is_empty());
    }

    #[test]
    fn test_receive_failure_keeps_count_so_far() {
        let service = service_with(&["one", "two", "three"]).fail_receive_at(3);
        let mut store = InMemoryStore::new("/out");
        let result = run(&service, &mut store, ADDRESS, TransactionBoundary::None, u32::MAX);

        assert!(matches!(result.error, Some(MqError::Queue(_))));
        assert_eq!(result.count, 2);
        assert_eq!(contents(&store), vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(service.messages(ADDRESS).len(), 1);

        let last = result.messages.last().unwrap();
        assert_eq!(last.level, MessageLevel::Success);
        assert_eq!(last.content, "Retrieve 2 message(s)");
        assert_eq!(
            result.messages[result.messages.len() - 2].level,
            MessageLevel::Error
        );
    }

    #[test]
    fn test_refused_commit_still_counts_written_file() {
        let service = service_with(&["first", "second"]).fail_commit_at(2);
        let mut store = InMemoryStore::new("/out");
        let result = run(
            &service,
            &mut store,
            ADDRESS,
            TransactionBoundary::PerMessage,
            u32::MAX,
        );

        assert!(matches!(result.error, Some(MqError::Transaction(_))));
        // Both files were written, so both are counted and listed.
        assert_eq!(result.count, 2);
        assert_eq!(store.files().len(), 2);
        let info_lines = result
            .messages
            .iter()
            .filter(|m| m.level == MessageLevel::Info)
            .count();
        assert_eq!(info_lines, 2);
        // The uncommitted receive went back to the queue.
        assert_eq!(service.messages(ADDRESS).len(), 1);
        assert_eq!(
            result.messages.last().unwrap().content,
            "Retrieve 2 message(s)"
        );
    }

    #[test]
    fn test_missing_queue_is_reported() {
        let service = InMemoryQueueService::new();
        let mut store = InMemoryStore::new("/out");
        let result = run(&service, &mut store, ADDRESS, TransactionBoundary::None, 1);

        assert!(matches!(result.error, Some(MqError::QueueNotFound(_))));
        assert_eq!(service.receive_attempts(), 0);
    }

    #[test]
    fn test_round_trip_through_queue() {
        let original: Vec<u8> = (0..=255u8).cycle().take(1337).collect();
        let source = InMemoryStore::new("/in").with_file("payload.bin", original.clone());
        let service = InMemoryQueueService::new().with_queue(ADDRESS);

        let sent = import::run(
            &service,
            &source,
            ADDRESS,
            TransactionBoundary::PerMessage,
            &["*.bin".to_string()],
        );
        assert_eq!(sent.count, 1);

        let mut target = InMemoryStore::new("/out");
        let received = run(
            &service,
            &mut target,
            ADDRESS,
            TransactionBoundary::PerMessage,
            u32::MAX,
        );
        assert_eq!(received.count, 1);
        assert_eq!(contents(&target), vec![original]);
    }
}
