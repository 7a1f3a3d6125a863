//! # Queue Addresses
//!
//! A queue is named by a machine and a queue name. The queue service wants a single address
//! string whose shape depends on how the machine should be reached:
//!
//! | Machine            | Address                                         |
//! |--------------------|-------------------------------------------------|
//! | `.`                | `.\Private$\<queue>`                            |
//! | dotted IPv4 quad   | `Formatname:DIRECT=TCP:<machine>\Private$\<queue>` |
//! | anything else      | `Formatname:DIRECT=OS:<machine>\Private$\<queue>`  |
//!
//! The rules are checked in that order and the first match wins.

use crate::error::MqError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

const LOCAL_MACHINE: &str = ".";
const PRIVATE_SEGMENT: &str = r"\Private$\";
const TCP_PREFIX: &str = "Formatname:DIRECT=TCP:";
const OS_PREFIX: &str = "Formatname:DIRECT=OS:";

static IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b").expect("IPv4 pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Private queue on this machine.
    Local,
    /// Direct TCP to an IP address.
    Tcp,
    /// Direct, resolved through the OS by host name.
    Os,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueAddress {
    transport: Transport,
    machine: String,
    queue: String,
}

impl QueueAddress {
    /// Builds the address for `machine`/`queue`, or `None` if either is empty.
    pub fn resolve(machine: &str, queue: &str) -> Option<Self> {
        if machine.is_empty() || queue.is_empty() {
            return None;
        }

        let transport = if machine.trim() == LOCAL_MACHINE {
            Transport::Local
        } else if IPV4.is_match(machine) {
            Transport::Tcp
        } else {
            Transport::Os
        };

        Some(Self {
            transport,
            machine: machine.to_string(),
            queue: queue.to_string(),
        })
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn machine(&self) -> &str {
        &self.machine
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }
}

impl fmt::Display for QueueAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.transport {
            Transport::Local => "",
            Transport::Tcp => TCP_PREFIX,
            Transport::Os => OS_PREFIX,
        };
        write!(f, "{}{}{}{}", prefix, self.machine, PRIVATE_SEGMENT, self.queue)
    }
}

impl FromStr for QueueAddress {
    type Err = MqError;

    /// Reads an address string back into its parts, for backends that route on them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (transport, rest) = if let Some(rest) = strip_prefix_ignore_case(s, TCP_PREFIX) {
            (Transport::Tcp, rest)
        } else if let Some(rest) = strip_prefix_ignore_case(s, OS_PREFIX) {
            (Transport::Os, rest)
        } else {
            (Transport::Local, s)
        };

        let (machine, queue) = split_private(rest)
            .filter(|(m, q)| !m.is_empty() && !q.is_empty())
            .ok_or_else(|| MqError::InvalidAddress(s.to_string()))?;

        if transport == Transport::Local && machine.trim() != LOCAL_MACHINE {
            return Err(MqError::InvalidAddress(s.to_string()));
        }

        Ok(Self {
            transport,
            machine: machine.to_string(),
            queue: queue.to_string(),
        })
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        s.get(prefix.len()..)
    } else {
        None
    }
}

fn split_private(s: &str) -> Option<(&str, &str)> {
    let lower = s.to_ascii_lowercase();
    let at = lower.find(&PRIVATE_SEGMENT.to_ascii_lowercase())?;
    Some((&s[..at], &s[at + PRIVATE_SEGMENT.len()..]))
}
