use super::reader::{into_io_error, AssetReader, ReadOutcome};
use crate::driver::{CameraDriver, DeviceHandle};
use crate::error::{Result, TetherError};
use crate::types::AssetLocator;
use std::io::{self, SeekFrom};
use std::sync::Arc;
use tracing::{debug, trace};

/// Reader that requests each window from the device on demand.
///
/// The total size is never known; a read that returns fewer bytes than asked
/// for ends the stream. Seeking relative to the end is therefore unsupported.
pub struct ChunkedReader {
    driver: Arc<dyn CameraDriver>,
    handle: DeviceHandle,
    locator: AssetLocator,
    offset: u64,
    end_of_stream: bool,
    closed: bool,
}

impl ChunkedReader {
    pub fn new(driver: Arc<dyn CameraDriver>, handle: DeviceHandle, locator: AssetLocator) -> Self {
        debug!("Opening chunked reader for {}", locator);
        Self {
            driver,
            handle,
            locator,
            offset: 0,
            end_of_stream: false,
            closed: false,
        }
    }

    pub fn locator(&self) -> &AssetLocator {
        &self.locator
    }

    /// Move the cursor. Negative results are rejected and leave it unchanged.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        if self.closed {
            return Err(TetherError::Closed("transfer handle"));
        }

        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.offset) + i128::from(delta),
            SeekFrom::End(_) => {
                return Err(TetherError::Unsupported(
                    "seeking from the end of a chunked transfer".to_string(),
                ))
            }
        };

        if target < 0 {
            return Err(TetherError::InvalidOffset(
                i64::try_from(target).unwrap_or(i64::MIN),
            ));
        }

        self.offset = u64::try_from(target).unwrap_or(u64::MAX);
        self.end_of_stream = false;
        trace!("Chunked reader for {} moved to {}", self.locator, self.offset);
        Ok(self.offset)
    }
}

impl AssetReader for ChunkedReader {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        if self.closed {
            return Err(TetherError::Closed("transfer handle"));
        }
        if self.end_of_stream {
            return Ok(ReadOutcome::last(0));
        }
        if buf.is_empty() {
            return Ok(ReadOutcome::data(0));
        }

        let count = self
            .driver
            .file_read(self.handle, &self.locator, self.offset, buf)?
            .min(buf.len());
        self.offset += count as u64;
        trace!(
            "Chunked read of {}/{} bytes from {}, offset now {}",
            count,
            buf.len(),
            self.locator,
            self.offset
        );

        if count < buf.len() {
            self.end_of_stream = true;
            Ok(ReadOutcome::last(count))
        } else {
            Ok(ReadOutcome::data(count))
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        debug!("Closing chunked reader for {} at offset {}", self.locator, self.offset);
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn offset(&self) -> u64 {
        self.offset
    }
}

impl io::Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf)
            .map(|outcome| outcome.bytes)
            .map_err(into_io_error)
    }
}

impl io::Seek for ChunkedReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        ChunkedReader::seek(self, pos).map_err(into_io_error)
    }
}

impl Drop for ChunkedReader {
    fn drop(&mut self) {
        self.close();
    }
}
