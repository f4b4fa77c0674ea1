use paneui_core::{DriverError, RegistryError};
use thiserror::Error;

pub type UiResult<T> = Result<T, UiError>;

#[derive(Debug, Error)]
pub enum UiError {
    #[error("no driver registered as '{0}'")]
    NoMatchingDriver(String),

    #[error("driver '{name}' failed to initialize: {source}")]
    DriverInitializationFailed {
        name: String,
        #[source]
        source: DriverError,
    },

    #[error("window creation failed: {0}")]
    WindowCreationFailed(#[source] DriverError),

    #[error("surface creation failed: {0}")]
    SurfaceCreationFailed(#[source] DriverError),

    #[error("driver release failed: {0}")]
    ReleaseFailed(#[source] DriverError),

    #[error("config error: {0}")]
    Config(String),
}

impl From<RegistryError> for UiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::DriverNotFound { name } => Self::NoMatchingDriver(name),
            RegistryError::Factory { name, source } => {
                Self::DriverInitializationFailed { name, source }
            }
        }
    }
}
