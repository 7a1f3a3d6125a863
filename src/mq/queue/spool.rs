//! # Spool Queues
//!
//! A directory-backed queue service. Each queue is a directory under the spool root:
//!
//! ```text
//! <spool>/
//! ├── local/                  # machine "." (local private queues)
//! │   └── orders/             # one directory per queue
//! │       ├── 20250101120000000000001-<uuid>.msg       # ready message
//! │       ├── 20250101120000000000002-<uuid>.pending   # staged by an open transaction
//! │       └── 20250101120000000000003-<uuid>.claimed   # received inside an open transaction
//! └── srv01/
//!     └── inbox/
//! ```
//!
//! Queue directories are never created here; a missing one means the queue does not exist.
//!
//! Message files start with a 6-byte header (format version, body flag, big-endian body type)
//! followed by the raw body. A file is written under a `.writing` name and renamed into place,
//! so readers never see a partial message. Ready messages are consumed in file-name order,
//! which follows send time.

use super::{MessageQueue, QueueService, QueueTransaction};
use crate::address::{QueueAddress, Transport};
use crate::error::{MqError, Result};
use crate::model::Message;
use chrono::Utc;
use log::{debug, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

const LOCAL_MACHINE_DIR: &str = "local";
const MESSAGE_EXT: &str = "msg";
const PENDING_EXT: &str = "pending";
const CLAIMED_EXT: &str = "claimed";
const WRITING_EXT: &str = "writing";

const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct SpoolQueueService {
    root: PathBuf,
    poll_interval: Duration,
}

impl SpoolQueueService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Directory holding the queue for `address`.
    pub fn queue_dir(&self, address: &QueueAddress) -> PathBuf {
        let machine = match address.transport() {
            Transport::Local => LOCAL_MACHINE_DIR.to_string(),
            Transport::Tcp | Transport::Os => {
                sanitize_segment(&address.machine().trim().to_ascii_lowercase())
            }
        };
        self.root
            .join(machine)
            .join(sanitize_segment(address.queue()))
    }
}

impl QueueService for SpoolQueueService {
    type Queue = SpoolQueue;

    fn open(&self, address: &str) -> Result<SpoolQueue> {
        let parsed: QueueAddress = address.parse()?;
        let dir = self.queue_dir(&parsed);
        if !dir.is_dir() {
            return Err(MqError::QueueNotFound(address.to_string()));
        }
        debug!("Opened spool queue {} at {}", address, dir.display());
        Ok(SpoolQueue {
            dir,
            poll_interval: self.poll_interval,
        })
    }
}

pub struct SpoolQueue {
    dir: PathBuf,
    poll_interval: Duration,
}

impl SpoolQueue {
    fn write_message(&self, message: &Message, ext: &str) -> Result<PathBuf> {
        let name = message_stem();
        let staging = self.dir.join(format!("{}.{}", name, WRITING_EXT));
        let target = self.dir.join(format!("{}.{}", name, ext));

        fs::write(&staging, encode(message)).map_err(MqError::Io)?;
        if let Err(e) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(MqError::Io(e));
        }
        Ok(target)
    }

    fn ready_messages(&self) -> Result<Vec<PathBuf>> {
        let mut ready = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(MqError::Io)? {
            let path = entry.map_err(MqError::Io)?.path();
            if path.extension().is_some_and(|ext| ext == MESSAGE_EXT) {
                ready.push(path);
            }
        }
        ready.sort();
        Ok(ready)
    }

    /// Claim the oldest ready message by renaming it. Returns `(ready, claimed)` paths.
    fn try_claim(&self) -> Result<Option<(PathBuf, PathBuf)>> {
        for ready in self.ready_messages()? {
            let claimed = ready.with_extension(CLAIMED_EXT);
            match fs::rename(&ready, &claimed) {
                Ok(()) => return Ok(Some((ready, claimed))),
                // Taken by another reader between listing and rename.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(MqError::Io(e)),
            }
        }
        Ok(None)
    }
}

impl MessageQueue for SpoolQueue {
    type Transaction = SpoolTransaction;

    fn begin(&mut self) -> Result<SpoolTransaction> {
        Ok(SpoolTransaction::default())
    }

    fn send(&mut self, message: &Message, txn: Option<&mut SpoolTransaction>) -> Result<()> {
        match txn {
            Some(txn) => {
                let staged = self.write_message(message, PENDING_EXT)?;
                txn.pending.push(staged);
            }
            None => {
                self.write_message(message, MESSAGE_EXT)?;
            }
        }
        Ok(())
    }

    fn receive(
        &mut self,
        timeout: Duration,
        txn: Option<&mut SpoolTransaction>,
    ) -> Result<Option<Message>> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some((ready, claimed)) = self.try_claim()? {
                let message = match read_message(&claimed) {
                    Ok(message) => message,
                    Err(e) => {
                        restore_claim(&claimed, &ready);
                        return Err(e);
                    }
                };
                match txn {
                    Some(txn) => txn.claimed.push((claimed, ready)),
                    None => consume_claim(&claimed, &ready)?,
                }
                return Ok(Some(message));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }
}

/// Open spool transaction. Dropping it uncommitted deletes staged sends and puts claimed
/// messages back.
#[derive(Default)]
pub struct SpoolTransaction {
    pending: Vec<PathBuf>,
    claimed: Vec<(PathBuf, PathBuf)>,
    committed: bool,
}

impl QueueTransaction for SpoolTransaction {
    fn commit(mut self) -> Result<()> {
        while let Some(staged) = self.pending.pop() {
            let target = staged.with_extension(MESSAGE_EXT);
            if let Err(e) = fs::rename(&staged, &target) {
                let reason = format!("publishing {}: {}", staged.display(), e);
                self.pending.push(staged);
                return Err(MqError::Transaction(reason));
            }
        }
        self.committed = true;

        for (claimed, _) in self.claimed.drain(..) {
            fs::remove_file(&claimed).map_err(|e| {
                MqError::Transaction(format!("removing {}: {}", claimed.display(), e))
            })?;
        }
        Ok(())
    }
}

impl Drop for SpoolTransaction {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for staged in self.pending.drain(..) {
            if let Err(e) = fs::remove_file(&staged) {
                warn!("Could not discard {}: {}", staged.display(), e);
            }
        }
        for (claimed, ready) in self.claimed.drain(..) {
            restore_claim(&claimed, &ready);
        }
    }
}

/// Delete a claim taken outside a transaction. If that fails the message goes back to the
/// queue rather than staying claimed with no owner.
fn consume_claim(claimed: &Path, ready: &Path) -> Result<()> {
    if let Err(e) = fs::remove_file(claimed) {
        restore_claim(claimed, ready);
        return Err(MqError::Io(e));
    }
    Ok(())
}

fn restore_claim(claimed: &Path, ready: &Path) {
    if let Err(e) = fs::rename(claimed, ready) {
        warn!("Could not return {} to the queue: {}", claimed.display(), e);
    }
}

fn read_message(path: &Path) -> Result<Message> {
    let bytes = fs::read(path).map_err(MqError::Io)?;
    decode(&bytes).ok_or_else(|| {
        MqError::Queue(format!("unreadable message file {}", path.display()))
    })
}

fn message_stem() -> String {
    format!(
        "{}-{}",
        Utc::now().format("%Y%m%d%H%M%S%9f"),
        Uuid::new_v4().simple()
    )
}

fn encode(message: &Message) -> Vec<u8> {
    let body = message.body();
    let mut out = Vec::with_capacity(HEADER_LEN + body.map_or(0, <[u8]>::len));
    out.push(FORMAT_VERSION);
    out.push(u8::from(body.is_some()));
    out.extend_from_slice(&message.body_type().to_be_bytes());
    if let Some(body) = body {
        out.extend_from_slice(body);
    }
    out
}

fn decode(bytes: &[u8]) -> Option<Message> {
    if bytes.len() < HEADER_LEN || bytes[0] != FORMAT_VERSION {
        return None;
    }
    let body_type = i32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
    let body = match bytes[1] {
        0 => None,
        _ => Some(bytes[HEADER_LEN..].to_vec()),
    };
    Some(Message::from_parts(body, body_type))
}

fn sanitize_segment(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    // "." and ".." would escape the spool root.
    if cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}
