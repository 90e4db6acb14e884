use super::session::Camera;
use crate::error::{Result, TetherError};
use crate::status::DeviceError;
use crate::types::{normalize_folder, with_trailing_separator, AssetInfo, AssetLocator};
use tracing::{debug, trace};

/// Folder argument for the driver: no trailing separator except on the root.
fn device_folder(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

fn missing_asset(err: DeviceError, locator: &AssetLocator) -> TetherError {
    if err.is_not_found() {
        trace!("{} not found on device: {}", locator, err);
        TetherError::NotFound(locator.path())
    } else {
        TetherError::Device(err)
    }
}

impl Camera {
    /// Names of the folders directly under `path`, in device order.
    pub fn list_folders(&self, path: &str) -> Result<Vec<String>> {
        self.ensure_open()?;
        let folder = normalize_folder(path);
        let entries = self.driver.list_folders(self.handle, device_folder(folder))?;
        trace!("{} folders in {}", entries.len(), folder);
        Ok(entries.into_iter().map(|(name, _)| name).collect())
    }

    /// Every folder beneath `path`, depth first, each with a trailing separator.
    ///
    /// The first listing error aborts the walk.
    pub fn list_folders_recursive(&self, path: &str) -> Result<Vec<String>> {
        self.ensure_open()?;
        let start = with_trailing_separator(path);
        let mut found = Vec::new();
        let mut stack = vec![start.clone()];

        while let Some(current) = stack.pop() {
            let children = self.list_folders(device_folder(&current))?;
            stack.extend(
                children
                    .iter()
                    .rev()
                    .map(|child| format!("{}{}/", current, child)),
            );
            if current != start {
                found.push(current);
            }
        }

        debug!("Found {} folders beneath {}", found.len(), start);
        Ok(found)
    }

    /// Names of the files directly in `path`, in device order.
    pub fn list_files(&self, path: &str) -> Result<Vec<String>> {
        self.ensure_open()?;
        let folder = normalize_folder(path);
        let entries = self.driver.list_files(self.handle, device_folder(folder))?;
        trace!("{} files in {}", entries.len(), folder);
        Ok(entries.into_iter().map(|(name, _)| name).collect())
    }

    /// Full paths of every file in `path` and the folders beneath it.
    pub fn list_files_recursive(&self, path: &str) -> Result<Vec<String>> {
        let mut folders = vec![with_trailing_separator(path)];
        folders.extend(self.list_folders_recursive(path)?);

        let mut files = Vec::new();
        for folder in &folders {
            files.extend(
                self.list_files(folder)?
                    .into_iter()
                    .map(|name| format!("{}{}", folder, name)),
            );
        }
        Ok(files)
    }

    /// Metadata of a stored file. A missing file or folder is `NotFound`.
    pub fn info(&self, folder: &str, name: &str) -> Result<AssetInfo> {
        self.ensure_open()?;
        let locator = AssetLocator::new(device_folder(normalize_folder(folder)), name);
        self.driver
            .file_info(self.handle, &locator)
            .map_err(|e| missing_asset(e, &locator))
    }

    /// Remove a stored file. A missing file or folder is `NotFound`.
    pub fn delete(&self, folder: &str, name: &str) -> Result<()> {
        self.ensure_open()?;
        let locator = AssetLocator::new(device_folder(normalize_folder(folder)), name);
        self.driver
            .file_delete(self.handle, &locator)
            .map_err(|e| missing_asset(e, &locator))?;
        debug!("Deleted {}", locator);
        Ok(())
    }
}
