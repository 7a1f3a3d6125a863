use super::{MessageQueue, QueueService, QueueTransaction};
use crate::error::{MqError, Result};
use crate::model::Message;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

#[derive(Default)]
struct MemoryState {
    queues: HashMap<String, VecDeque<Message>>,
    send_attempts: usize,
    receive_attempts: usize,
    commit_attempts: usize,
    fail_send_at: Option<usize>,
    fail_receive_at: Option<usize>,
    fail_commit_at: Option<usize>,
}

/// In-process queue service for testing.
///
/// Clones share the same queues, so a test can keep one handle for assertions while the
/// engine works through another. Receives never wait: an empty queue times out immediately.
#[derive(Clone, Default)]
pub struct InMemoryQueueService {
    state: Rc<RefCell<MemoryState>>,
}

impl InMemoryQueueService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue at `address`.
    pub fn with_queue(self, address: &str) -> Self {
        self.state
            .borrow_mut()
            .queues
            .entry(address.to_string())
            .or_default();
        self
    }

    /// Fail the `attempt`-th send (1-based) with a queue error.
    pub fn fail_send_at(self, attempt: usize) -> Self {
        self.state.borrow_mut().fail_send_at = Some(attempt);
        self
    }

    /// Fail the `attempt`-th receive (1-based) with a queue error.
    pub fn fail_receive_at(self, attempt: usize) -> Self {
        self.state.borrow_mut().fail_receive_at = Some(attempt);
        self
    }

    /// Fail the `attempt`-th commit (1-based). The transaction is then rolled back.
    pub fn fail_commit_at(self, attempt: usize) -> Self {
        self.state.borrow_mut().fail_commit_at = Some(attempt);
        self
    }

    /// Append `message` directly, creating the queue if needed.
    pub fn push(&self, address: &str, message: Message) {
        self.state
            .borrow_mut()
            .queues
            .entry(address.to_string())
            .or_default()
            .push_back(message);
    }

    /// Snapshot of the messages currently visible in the queue.
    pub fn messages(&self, address: &str) -> Vec<Message> {
        self.state
            .borrow()
            .queues
            .get(address)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn send_attempts(&self) -> usize {
        self.state.borrow().send_attempts
    }

    pub fn receive_attempts(&self) -> usize {
        self.state.borrow().receive_attempts
    }
}

impl QueueService for InMemoryQueueService {
    type Queue = InMemoryQueue;

    fn open(&self, address: &str) -> Result<InMemoryQueue> {
        let key = address.to_string();
        if !self.state.borrow().queues.contains_key(&key) {
            return Err(MqError::QueueNotFound(key));
        }
        Ok(InMemoryQueue {
            state: Rc::clone(&self.state),
            key,
        })
    }
}

pub struct InMemoryQueue {
    state: Rc<RefCell<MemoryState>>,
    key: String,
}

impl MessageQueue for InMemoryQueue {
    type Transaction = InMemoryTransaction;

    fn begin(&mut self) -> Result<InMemoryTransaction> {
        Ok(InMemoryTransaction {
            state: Rc::clone(&self.state),
            key: self.key.clone(),
            staged: Vec::new(),
            taken: Vec::new(),
            committed: false,
        })
    }

    fn send(&mut self, message: &Message, txn: Option<&mut InMemoryTransaction>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.send_attempts += 1;
        if state.fail_send_at == Some(state.send_attempts) {
            return Err(MqError::Queue(format!(
                "send {} rejected by {}",
                state.send_attempts, self.key
            )));
        }

        match txn {
            Some(txn) => txn.staged.push(message.clone()),
            None => state
                .queues
                .entry(self.key.clone())
                .or_default()
                .push_back(message.clone()),
        }
        Ok(())
    }

    fn receive(
        &mut self,
        _timeout: Duration,
        txn: Option<&mut InMemoryTransaction>,
    ) -> Result<Option<Message>> {
        let mut state = self.state.borrow_mut();
        state.receive_attempts += 1;
        if state.fail_receive_at == Some(state.receive_attempts) {
            return Err(MqError::Queue(format!(
                "receive {} rejected by {}",
                state.receive_attempts, self.key
            )));
        }
        let message = state
            .queues
            .get_mut(&self.key)
            .and_then(|queue| queue.pop_front());

        if let (Some(txn), Some(message)) = (txn, &message) {
            txn.taken.push(message.clone());
        }
        Ok(message)
    }
}

pub struct InMemoryTransaction {
    state: Rc<RefCell<MemoryState>>,
    key: String,
    staged: Vec<Message>,
    taken: Vec<Message>,
    committed: bool,
}

impl QueueTransaction for InMemoryTransaction {
    fn commit(mut self) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            state.commit_attempts += 1;
            if state.fail_commit_at == Some(state.commit_attempts) {
                return Err(MqError::Transaction(format!(
                    "commit {} refused by {}",
                    state.commit_attempts, self.key
                )));
            }
        }
        let staged = std::mem::take(&mut self.staged);
        self.state
            .borrow_mut()
            .queues
            .entry(self.key.clone())
            .or_default()
            .extend(staged);
        self.taken.clear();
        self.committed = true;
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut state = self.state.borrow_mut();
        let queue = state.queues.entry(self.key.clone()).or_default();
        for message in self.taken.drain(..).rev() {
            queue.push_front(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = r".\Private$\test";

    const WAIT: Duration = Duration::from_millis(10);

    #[test]
    fn test_open_unknown_queue() {
        let service = InMemoryQueueService::new();
        assert!(matches!(
            service.open(ADDRESS),
            Err(MqError::QueueNotFound(_))
        ));
    }

    #[test]
    fn test_send_then_receive_in_order() {
        let service = InMemoryQueueService::new().with_queue(ADDRESS);
        let mut queue = service.open(ADDRESS).unwrap();
        queue.send(&Message::binary(b"one".to_vec()), None).unwrap();
        queue.send(&Message::binary(b"two".to_vec()), None).unwrap();

        let first = queue.receive(WAIT, None).unwrap().unwrap();
        let second = queue.receive(WAIT, None).unwrap().unwrap();
        assert_eq!(first.body(), Some(&b"one"[..]));
        assert_eq!(second.body(), Some(&b"two"[..]));
        assert!(queue.receive(WAIT, None).unwrap().is_none());
        assert_eq!(service.receive_attempts(), 3);
    }

    #[test]
    fn test_transactional_send_visible_after_commit() {
        let service = InMemoryQueueService::new().with_queue(ADDRESS);
        let mut queue = service.open(ADDRESS).unwrap();

        let mut txn = queue.begin().unwrap();
        queue
            .send(&Message::binary(b"x".to_vec()), Some(&mut txn))
            .unwrap();
        assert!(service.messages(ADDRESS).is_empty());

        txn.commit().unwrap();
        assert_eq!(service.messages(ADDRESS).len(), 1);
    }

    #[test]
    fn test_dropped_transaction_discards_sends() {
        let service = InMemoryQueueService::new().with_queue(ADDRESS);
        let mut queue = service.open(ADDRESS).unwrap();
        {
            let mut txn = queue.begin().unwrap();
            queue
                .send(&Message::binary(b"x".to_vec()), Some(&mut txn))
                .unwrap();
        }
        assert!(service.messages(ADDRESS).is_empty());
    }

    #[test]
    fn test_dropped_transaction_restores_receives() {
        let service = InMemoryQueueService::new().with_queue(ADDRESS);
        service.push(ADDRESS, Message::binary(b"a".to_vec()));
        service.push(ADDRESS, Message::binary(b"b".to_vec()));
        let mut queue = service.open(ADDRESS).unwrap();
        {
            let mut txn = queue.begin().unwrap();
            queue.receive(WAIT, Some(&mut txn)).unwrap().unwrap();
            queue.receive(WAIT, Some(&mut txn)).unwrap().unwrap();
        }
        let bodies: Vec<_> = service
            .messages(ADDRESS)
            .iter()
            .map(|m| m.body().unwrap().to_vec())
            .collect();
        assert_eq!(bodies, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn test_injected_send_failure() {
        let service = InMemoryQueueService::new()
            .with_queue(ADDRESS)
            .fail_send_at(2);
        let mut queue = service.open(ADDRESS).unwrap();
        let message = Message::binary(b"x".to_vec());
        assert!(queue.send(&message, None).is_ok());
        assert!(matches!(queue.send(&message, None), Err(MqError::Queue(_))));
        assert!(queue.send(&message, None).is_ok());
        assert_eq!(service.messages(ADDRESS).len(), 2);
    }

    #[test]
    fn test_injected_receive_failure_keeps_message() {
        let service = InMemoryQueueService::new()
            .with_queue(ADDRESS)
            .fail_receive_at(1);
        service.push(ADDRESS, Message::binary(b"x".to_vec()));
        let mut queue = service.open(ADDRESS).unwrap();

        assert!(matches!(queue.receive(WAIT, None), Err(MqError::Queue(_))));
        assert!(queue.receive(WAIT, None).unwrap().is_some());
    }

    #[test]
    fn test_refused_commit_rolls_back() {
        let service = InMemoryQueueService::new()
            .with_queue(ADDRESS)
            .fail_commit_at(1);
        service.push(ADDRESS, Message::binary(b"kept".to_vec()));
        let mut queue = service.open(ADDRESS).unwrap();

        let mut txn = queue.begin().unwrap();
        queue.receive(WAIT, Some(&mut txn)).unwrap().unwrap();
        queue
            .send(&Message::binary(b"staged".to_vec()), Some(&mut txn))
            .unwrap();
        assert!(matches!(txn.commit(), Err(MqError::Transaction(_))));

        let bodies: Vec<_> = service
            .messages(ADDRESS)
            .iter()
            .map(|m| m.body().unwrap().to_vec())
            .collect();
        assert_eq!(bodies, vec![b"kept".to_vec()]);
    }
}
