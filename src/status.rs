//! Driver status codes and their translation into structured errors.
//!
//! Drivers report failures as negative integer status codes using the
//! libgphoto2 numbering. [`DeviceError`] carries the code together with a
//! human readable message so callers can both match on the code and print
//! something useful.

use serde::Serialize;
use std::fmt;

pub const OK: i32 = 0;

// Generic and port level codes
pub const ERROR: i32 = -1;
pub const ERROR_BAD_PARAMETERS: i32 = -2;
pub const ERROR_NO_MEMORY: i32 = -3;
pub const ERROR_LIBRARY: i32 = -4;
pub const ERROR_UNKNOWN_PORT: i32 = -5;
pub const ERROR_NOT_SUPPORTED: i32 = -6;
pub const ERROR_IO: i32 = -7;
pub const ERROR_FIXED_LIMIT_EXCEEDED: i32 = -8;
pub const ERROR_TIMEOUT: i32 = -10;
pub const ERROR_IO_SUPPORTED_SERIAL: i32 = -20;
pub const ERROR_IO_SUPPORTED_USB: i32 = -21;
pub const ERROR_IO_INIT: i32 = -31;
pub const ERROR_IO_READ: i32 = -34;
pub const ERROR_IO_WRITE: i32 = -35;
pub const ERROR_IO_UPDATE: i32 = -37;
pub const ERROR_IO_SERIAL_SPEED: i32 = -41;
pub const ERROR_IO_USB_CLEAR_HALT: i32 = -51;
pub const ERROR_IO_USB_FIND: i32 = -52;
pub const ERROR_IO_USB_CLAIM: i32 = -53;
pub const ERROR_IO_LOCK: i32 = -60;
pub const ERROR_HAL: i32 = -70;

// Camera level codes
pub const ERROR_CORRUPTED_DATA: i32 = -102;
pub const ERROR_FILE_EXISTS: i32 = -103;
pub const ERROR_MODEL_NOT_FOUND: i32 = -105;
pub const ERROR_DIRECTORY_NOT_FOUND: i32 = -107;
pub const ERROR_FILE_NOT_FOUND: i32 = -108;
pub const ERROR_DIRECTORY_EXISTS: i32 = -109;
pub const ERROR_CAMERA_BUSY: i32 = -110;
pub const ERROR_PATH_NOT_ABSOLUTE: i32 = -111;
pub const ERROR_CANCEL: i32 = -112;
pub const ERROR_CAMERA_ERROR: i32 = -113;
pub const ERROR_OS_FAILURE: i32 = -114;
pub const ERROR_NO_SPACE: i32 = -115;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Human readable description of a driver status code.
pub fn result_as_str(code: i32) -> &'static str {
    match code {
        OK => "No error",
        ERROR => "Unspecified error",
        ERROR_BAD_PARAMETERS => "Bad parameters",
        ERROR_NO_MEMORY => "Out of memory",
        ERROR_LIBRARY => "Error loading a library",
        ERROR_UNKNOWN_PORT => "Unknown port",
        ERROR_NOT_SUPPORTED => "Unsupported operation",
        ERROR_IO => "I/O problem",
        ERROR_FIXED_LIMIT_EXCEEDED => "Fixed limit exceeded",
        ERROR_TIMEOUT => "Timeout reading from or writing to the port",
        ERROR_IO_SUPPORTED_SERIAL => "Serial port not supported",
        ERROR_IO_SUPPORTED_USB => "USB port not supported",
        ERROR_IO_INIT => "Error initializing the port",
        ERROR_IO_READ => "Error reading from the port",
        ERROR_IO_WRITE => "Error writing to the port",
        ERROR_IO_UPDATE => "Error updating the port settings",
        ERROR_IO_SERIAL_SPEED => "Error setting the serial port speed",
        ERROR_IO_USB_CLEAR_HALT => "Error clearing a halt condition on the USB port",
        ERROR_IO_USB_FIND => "Could not find the requested device on the USB port",
        ERROR_IO_USB_CLAIM => "Could not claim the USB device",
        ERROR_IO_LOCK => "Could not lock the device",
        ERROR_HAL => "libhal error",
        ERROR_CORRUPTED_DATA => "Corrupted data",
        ERROR_FILE_EXISTS => "File exists",
        ERROR_MODEL_NOT_FOUND => "Unknown model",
        ERROR_DIRECTORY_NOT_FOUND => "Directory not found",
        ERROR_FILE_NOT_FOUND => "File not found",
        ERROR_DIRECTORY_EXISTS => "Directory exists",
        ERROR_CAMERA_BUSY => "I/O in progress",
        ERROR_PATH_NOT_ABSOLUTE => "Path not absolute",
        ERROR_CANCEL => "Cancelled",
        ERROR_CAMERA_ERROR => "Camera error",
        ERROR_OS_FAILURE => "OS error",
        ERROR_NO_SPACE => "Not enough space",
        _ => UNKNOWN_ERROR,
    }
}

/// A failure reported by the driver, preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceError {
    code: i32,
    message: String,
}

impl DeviceError {
    /// Build an error for `code` using the standard status message.
    pub fn from_code(code: i32) -> Self {
        Self {
            code,
            message: result_as_str(code).to_string(),
        }
    }

    /// Build an error for `code` with a driver supplied message.
    ///
    /// An empty message falls back to the standard text for the code.
    pub fn with_message<S: Into<String>>(code: i32, message: S) -> Self {
        let message = message.into();
        if message.is_empty() {
            return Self::from_code(code);
        }
        Self { code, message }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when this error carries the given status code.
    pub fn is(&self, code: i32) -> bool {
        self.code == code
    }

    /// True for the driver's "file or directory not found" codes.
    pub fn is_not_found(&self) -> bool {
        matches!(self.code, ERROR_FILE_NOT_FOUND | ERROR_DIRECTORY_NOT_FOUND)
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for DeviceError {}

/// Translate a raw status code into `Ok(())` or a [`DeviceError`].
pub fn check(code: i32) -> Result<(), DeviceError> {
    if code == OK {
        Ok(())
    } else {
        Err(DeviceError::from_code(code))
    }
}
