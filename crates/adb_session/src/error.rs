/// Error types for adb session operations
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdbError {
    #[error("adb connect failed: {0}")]
    Connection(String),

    #[error("command `{args}` failed with status {code:?}: {stderr}")]
    Process {
        args: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("install failed: {0}")]
    Install(String),

    #[error("interaction failed: {0}")]
    Interaction(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AdbError>;
