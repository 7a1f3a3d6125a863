use thiserror::Error;

/// Errors produced while reading the command line.
///
/// These never reach the queue: the run stops before anything is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    #[error("Mode is already defined. Argument : {0}")]
    ModeAlreadyDefined(String),

    #[error("Unexpected number of arguments for {0}, expected <machine> <queue>")]
    MissingQueueArguments(String),

    #[error("Unexpected number of arguments for max value")]
    MissingMaxValue,

    #[error("Unexpected value for max value: {0}")]
    InvalidMaxValue(String),

    #[error("Invalid argument : {0}")]
    InvalidArgument(String),

    #[error("Mode is unspecified")]
    ModeUnspecified,
}

#[derive(Error, Debug)]
pub enum MqError {
    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Invalid queue address: {0}")]
    InvalidAddress(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Invalid file pattern: {0}")]
    Pattern(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MqError>;
