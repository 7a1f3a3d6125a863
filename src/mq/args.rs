//! # Argument Parser
//!
//! Turns the raw command line into an [`Operation`]. The grammar is small but positional:
//!
//! ```text
//! mq -[ei] <machine> <queue> [-t] [file-pattern ...] [-m <max>]
//! ```
//!
//! Parsing walks a token cursor left to right. Mode flags consume the two tokens that follow
//! them, `-m`/`-max` consumes one. Everything is collected into a private draft and only turned
//! into an `Operation` once the whole list has been accepted, so a failed parse never leaves a
//! half-built value behind.

use crate::address::QueueAddress;
use crate::error::ArgsError;
use std::vec::IntoIter;

const FLAG_PREFIX: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Import,
    Export,
}

impl Mode {
    fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "-i" => Some(Mode::Import),
            "-e" => Some(Mode::Export),
            _ => None,
        }
    }
}

/// A validated transfer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    mode: Mode,
    transactional: bool,
    machine_name: String,
    queue_name: String,
    max_count: u32,
    file_patterns: Vec<String>,
}

impl Operation {
    pub fn parse<I, S>(args: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut cursor = Cursor::new(tokens);
        let mut draft = Draft::default();

        while let Some(token) = cursor.next() {
            draft.accept(token, &mut cursor)?;
        }

        draft.finish()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Export cap. `u32::MAX` means no limit. Ignored for imports.
    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn file_patterns(&self) -> &[String] {
        &self.file_patterns
    }

    /// `None` only when the machine or queue name is empty.
    pub fn address(&self) -> Option<QueueAddress> {
        QueueAddress::resolve(&self.machine_name, &self.queue_name)
    }
}

struct Cursor {
    tokens: IntoIter<String>,
}

impl Cursor {
    fn new(tokens: Vec<String>) -> Self {
        Self {
            tokens: tokens.into_iter(),
        }
    }

    fn next(&mut self) -> Option<String> {
        self.tokens.next()
    }

    fn remaining(&self) -> usize {
        self.tokens.len()
    }
}

#[derive(Default)]
struct Draft {
    target: Option<(Mode, String, String)>,
    transactional: bool,
    max_count: Option<u32>,
    file_patterns: Vec<String>,
}

impl Draft {
    fn accept(&mut self, token: String, cursor: &mut Cursor) -> Result<(), ArgsError> {
        if let Some(mode) = Mode::from_flag(&token) {
            return self.set_target(mode, token, cursor);
        }

        match token.as_str() {
            "-t" => self.transactional = true,
            "-m" | "-max" => {
                let value = cursor.next().ok_or(ArgsError::MissingMaxValue)?;
                let max = value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| ArgsError::InvalidMaxValue(value.clone()))?;
                self.max_count = Some(max);
            }
            _ if token.starts_with(FLAG_PREFIX) => return Err(ArgsError::InvalidArgument(token)),
            _ => self.file_patterns.push(token),
        }
        Ok(())
    }

    fn set_target(
        &mut self,
        mode: Mode,
        flag: String,
        cursor: &mut Cursor,
    ) -> Result<(), ArgsError> {
        if self.target.is_some() {
            return Err(ArgsError::ModeAlreadyDefined(flag));
        }
        if cursor.remaining() < 2 {
            return Err(ArgsError::MissingQueueArguments(flag));
        }
        let (Some(machine), Some(queue)) = (cursor.next(), cursor.next()) else {
            return Err(ArgsError::MissingQueueArguments(flag));
        };
        self.target = Some((mode, machine, queue));
        Ok(())
    }

    fn finish(self) -> Result<Operation, ArgsError> {
        let (mode, machine_name, queue_name) = self.target.ok_or(ArgsError::ModeUnspecified)?;
        Ok(Operation {
            mode,
            transactional: self.transactional,
            machine_name,
            queue_name,
            max_count: self.max_count.unwrap_or(u32::MAX),
            file_patterns: self.file_patterns,
        })
    }
}
