use crate::error::TetherError;
use std::io;

/// Result of a single read.
///
/// A read may return data and end of stream together; the bytes are valid
/// and must not be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    pub bytes: usize,
    pub end_of_stream: bool,
}

impl ReadOutcome {
    pub fn data(bytes: usize) -> Self {
        Self {
            bytes,
            end_of_stream: false,
        }
    }

    pub fn last(bytes: usize) -> Self {
        Self {
            bytes,
            end_of_stream: true,
        }
    }
}

/// Common surface of the transfer readers.
///
/// Handles are single-owner: a reader must not be read and closed from two
/// threads at once.
pub trait AssetReader {
    /// Read into `buf`, advancing the cursor.
    fn read_chunk(&mut self, buf: &mut [u8]) -> crate::Result<ReadOutcome>;

    /// Release the underlying asset. Closing twice is a no-op.
    fn close(&mut self);

    fn is_closed(&self) -> bool;

    /// Current cursor position in bytes.
    fn offset(&self) -> u64;
}

pub(crate) fn into_io_error(err: TetherError) -> io::Error {
    match err {
        TetherError::Io(err) => err,
        TetherError::Closed(_) => io::Error::new(io::ErrorKind::BrokenPipe, err),
        TetherError::InvalidOffset(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
        TetherError::Unsupported(_) => io::Error::new(io::ErrorKind::Unsupported, err),
        other => io::Error::new(io::ErrorKind::Other, other),
    }
}
