use crate::error::MqError;

pub mod boundary;
pub mod export;
pub mod import;

pub use boundary::TransactionBoundary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Outcome of one import or export run.
///
/// `count` is the number of messages moved before the run ended. When the run ended on a
/// failure, `error` holds it and an error line has been added to `messages`.
#[derive(Debug, Default)]
pub struct TransferResult {
    pub count: usize,
    pub messages: Vec<CmdMessage>,
    pub error: Option<MqError>,
}

impl TransferResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn fail(&mut self, error: MqError) {
        self.add_message(CmdMessage::error(error.to_string()));
        self.error = Some(error);
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
