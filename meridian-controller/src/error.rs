//! Error types for the controller runtime

use meridian_core::motion::MotionError;
use meridian_core::traits::OutputError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Controller error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Board too old for this controller
    #[error("Unsupported board revision: {0}")]
    UnsupportedRevision(u8),

    /// Move target outside the focuser range
    #[error("Target {target} outside range [{min}, {max}]")]
    OutOfRange {
        /// Requested position
        target: i32,
        /// Lower bound
        min: i32,
        /// Upper bound
        max: i32,
    },

    /// Output line failure
    #[error("Output error: {0:?}")]
    Output(OutputError),

    /// Step lines were lost with a crashed worker
    #[error("Step lines unavailable")]
    StepLinesUnavailable,

    /// Step worker panicked
    #[error("Step worker panicked")]
    WorkerPanicked,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration serialize error
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Poll loop is no longer running
    #[error("Poll loop stopped")]
    Stopped,
}

impl From<MotionError> for Error {
    fn from(err: MotionError) -> Self {
        match err {
            MotionError::OutOfRange { target, min, max } => Error::OutOfRange { target, min, max },
        }
    }
}

impl From<OutputError> for Error {
    fn from(err: OutputError) -> Self {
        Error::Output(err)
    }
}
