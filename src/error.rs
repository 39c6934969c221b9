use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the simulation core.
///
/// Every variant describes a caller contract violation. Degenerate geometry and
/// transiently out-of-grid particles are handled inside the step and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid user or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Spawn pattern name that does not match any known pattern.
    #[error("unknown spawn pattern: {0:?}")]
    UnknownPattern(String),
}
