use super::buffered::BufferedReader;
use super::reader::AssetReader;
use crate::driver::{CameraDriver, DeviceHandle};
use crate::error::Result;
use crate::types::AssetLocator;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// 1 MiB, the default window for chunked copies.
pub const DEFAULT_WINDOW_SIZE: usize = 1024 * 1024;

/// Copy everything left in `reader` into a newly created file at `path`.
///
/// The reader is closed on every exit path, including when the file cannot
/// be created. Returns the number of bytes written.
pub fn copy_to_file<R: AssetReader>(reader: &mut R, path: &Path, window: usize) -> Result<u64> {
    let result = write_all_chunks(reader, path, window.max(1));
    reader.close();

    if let Err(e) = &result {
        warn!("Transfer to {} failed: {}", path.display(), e);
    }
    result
}

fn write_all_chunks<R: AssetReader>(reader: &mut R, path: &Path, window: usize) -> Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut buf = vec![0u8; window];
    let mut total = 0u64;

    loop {
        let outcome = reader.read_chunk(&mut buf)?;
        writer.write_all(&buf[..outcome.bytes])?;
        total += outcome.bytes as u64;
        if outcome.end_of_stream {
            break;
        }
    }

    writer.flush()?;
    debug!("Wrote {} bytes to {}", total, path.display());
    Ok(total)
}

/// Fetch `locator` with a buffered reader and store it at `path`.
pub fn download_to_file(
    driver: &dyn CameraDriver,
    handle: DeviceHandle,
    locator: &AssetLocator,
    path: &Path,
) -> Result<u64> {
    let mut reader = BufferedReader::open(driver, handle, locator)?;
    let written = reader.save_to_file(path)?;
    info!("Downloaded {} to {} ({} bytes)", locator, path.display(), written);
    Ok(written)
}
