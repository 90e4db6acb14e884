use super::session::Camera;
use crate::error::Result;
use crate::transfer::{self, BufferedReader, ChunkedReader};
use crate::types::{AssetLocator, CaptureKind};
use std::path::Path;
use tracing::{debug, info};

impl Camera {
    /// Fire a capture and leave the result on the device.
    pub fn trigger(&self) -> Result<()> {
        self.ensure_open()?;
        self.driver.trigger_capture(self.handle)?;
        debug!("Triggered capture on {}", self.handle);
        Ok(())
    }

    pub fn capture(&self, kind: CaptureKind) -> Result<AssetLocator> {
        self.ensure_open()?;
        let locator = self.driver.capture(self.handle, kind)?;
        info!("Captured {} to {}", kind.as_str(), locator);
        Ok(locator)
    }

    /// Capture an image and report where the device stored it.
    pub fn trigger_to_locator(&self) -> Result<AssetLocator> {
        self.capture(CaptureKind::Image)
    }

    /// Capture an image and download it to `path`.
    ///
    /// The image stays on the device if the download fails.
    pub fn capture_and_save<P: AsRef<Path>>(&self, path: P) -> Result<AssetLocator> {
        let locator = self.trigger_to_locator()?;
        self.download(&locator, path)?;
        Ok(locator)
    }

    /// Capture a preview frame into memory.
    pub fn capture_preview(&self) -> Result<BufferedReader> {
        self.ensure_open()?;
        let data = self.driver.capture_preview(self.handle)?;
        debug!("Captured {} byte preview on {}", data.len(), self.handle);
        Ok(BufferedReader::from_bytes(None, data))
    }

    pub fn capture_preview_to_file<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        self.capture_preview()?.save_to_file(path)
    }

    /// Download a stored file to a new local file.
    pub fn download<P: AsRef<Path>>(&self, locator: &AssetLocator, path: P) -> Result<u64> {
        self.ensure_open()?;
        transfer::download_to_file(self.driver.as_ref(), self.handle, locator, path.as_ref())
    }

    /// Fetch a stored file into memory.
    pub fn file_reader(&self, locator: &AssetLocator) -> Result<BufferedReader> {
        self.ensure_open()?;
        BufferedReader::open(self.driver.as_ref(), self.handle, locator)
    }

    /// Open a reader that fetches the file window by window.
    pub fn chunked_reader(&self, locator: &AssetLocator) -> Result<ChunkedReader> {
        self.ensure_open()?;
        Ok(ChunkedReader::new(
            self.driver.clone(),
            self.handle,
            locator.clone(),
        ))
    }

    /// Copy a stored file to `path` in windows of the configured chunk size.
    pub fn copy_chunked_to_file<P: AsRef<Path>>(
        &self,
        locator: &AssetLocator,
        path: P,
    ) -> Result<u64> {
        let mut reader = self.chunked_reader(locator)?;
        transfer::copy_to_file(&mut reader, path.as_ref(), self.chunk_size)
    }
}
