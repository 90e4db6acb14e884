use super::download::copy_to_file;
use super::reader::{into_io_error, AssetReader, ReadOutcome};
use crate::driver::{CameraDriver, DeviceHandle};
use crate::error::{Result, TetherError};
use crate::types::AssetLocator;
use std::io;
use std::path::Path;
use tracing::{debug, trace};

/// Reader over an asset that was fetched from the device in one piece.
#[derive(Debug)]
pub struct BufferedReader {
    locator: Option<AssetLocator>,
    data: Vec<u8>,
    offset: usize,
    closed: bool,
}

impl BufferedReader {
    /// Fetch `locator` from the device and open a reader over it.
    pub fn open(
        driver: &dyn CameraDriver,
        handle: DeviceHandle,
        locator: &AssetLocator,
    ) -> Result<Self> {
        let data = driver.file_get(handle, locator)?;
        debug!("Fetched {} ({} bytes)", locator, data.len());
        Ok(Self::from_bytes(Some(locator.clone()), data))
    }

    /// Wrap bytes that are already in memory, such as a preview frame.
    pub fn from_bytes(locator: Option<AssetLocator>, data: Vec<u8>) -> Self {
        Self {
            locator,
            data,
            offset: 0,
            closed: false,
        }
    }

    /// Where the asset lives on the device; `None` for previews.
    pub fn locator(&self) -> Option<&AssetLocator> {
        self.locator.as_ref()
    }

    pub fn full_size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// The whole asset, independent of the read cursor.
    pub fn data(&self) -> Result<&[u8]> {
        if self.closed {
            return Err(TetherError::Closed("transfer handle"));
        }
        Ok(&self.data)
    }

    /// Write the remaining bytes to a new local file, then close the reader.
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<u64> {
        let window = self.remaining().max(1);
        copy_to_file(self, path.as_ref(), window)
    }
}

impl AssetReader for BufferedReader {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        if self.closed {
            return Err(TetherError::Closed("transfer handle"));
        }

        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(ReadOutcome::last(0));
        }
        if buf.is_empty() {
            return Ok(ReadOutcome::data(0));
        }

        let count = remaining.min(buf.len());
        buf[..count].copy_from_slice(&self.data[self.offset..self.offset + count]);
        self.offset += count;
        trace!("Buffered read of {} bytes, offset now {}", count, self.offset);

        if self.offset < self.data.len() {
            Ok(ReadOutcome::data(count))
        } else {
            Ok(ReadOutcome::last(count))
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        match &self.locator {
            Some(locator) => debug!("Releasing buffered transfer of {}", locator),
            None => debug!("Releasing buffered preview transfer"),
        }
        self.data = Vec::new();
        self.offset = 0;
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn offset(&self) -> u64 {
        self.offset as u64
    }
}

impl io::Read for BufferedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_chunk(buf)
            .map(|outcome| outcome.bytes)
            .map_err(into_io_error)
    }
}

impl Drop for BufferedReader {
    fn drop(&mut self) {
        self.close();
    }
}
