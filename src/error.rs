use crate::status::DeviceError;
use crate::widget::ValueType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TetherError {
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Failed to fetch camera configuration: {0}")]
    ConfigFetch(#[source] DeviceError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Type mismatch on widget '{widget}': expected {expected} value, got {found}")]
    TypeMismatch {
        widget: String,
        expected: ValueType,
        found: &'static str,
    },

    #[error("Widget '{0}' is read-only")]
    ReadOnly(String),

    #[error("Duplicate widget name '{0}'")]
    DuplicateWidget(String),

    #[error("Operation on closed {0}")]
    Closed(&'static str),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(i64),

    #[error("An event wait is already outstanding on this session")]
    EventPending,

    #[error("Configuration error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("System error: {message}")]
    System { message: String },
}

impl TetherError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    /// The driver status code behind this error, if it came from the device.
    pub fn device_code(&self) -> Option<i32> {
        match self {
            Self::Device(err) | Self::ConfigFetch(err) => Some(err.code()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TetherError>;
