use thiserror::Error;

pub type DriverResult<T> = Result<T, DriverError>;

/// Errors reported by a driver backend.
///
/// Backends map their native errors into these variants, usually by message.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("could not connect to display server: {0}")]
    Connection(String),

    #[error("window creation failed: {0}")]
    WindowCreationFailed(String),

    #[error("surface creation failed: {0}")]
    SurfaceCreationFailed(String),

    #[error("release failed: {0}")]
    ReleaseFailed(String),

    #[error("native protocol error: {0}")]
    Protocol(String),

    #[error("driver already released")]
    Released,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("driver not found: {name}")]
    DriverNotFound { name: String },

    #[error("driver \"{name}\" failed to initialize: {source}")]
    Factory {
        name: String,
        #[source]
        source: DriverError,
    },
}
