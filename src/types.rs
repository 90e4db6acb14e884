use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the connected device, fetched once after init.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abilities {
    /// Model name as reported by the driver
    pub model: String,
    /// Unique device id
    pub id: String,
    /// Driver library serving the device
    pub library: String,
}

/// Location of a file stored on the device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetLocator {
    pub folder: String,
    pub name: String,
}

impl AssetLocator {
    pub fn new<F: Into<String>, N: Into<String>>(folder: F, name: N) -> Self {
        Self {
            folder: folder.into(),
            name: name.into(),
        }
    }

    /// Full device path of the asset.
    pub fn path(&self) -> String {
        format!("{}{}", with_trailing_separator(&self.folder), self.name)
    }
}

impl fmt::Display for AssetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Snapshot of a stored file's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub size: u64,
    pub modified_time: DateTime<Utc>,
    /// 0 for non-image assets
    pub width: u32,
    /// 0 for non-image assets
    pub height: u32,
}

/// What a capture should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureKind {
    Image,
    Movie,
    Sound,
}

impl CaptureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureKind::Image => "image",
            CaptureKind::Movie => "movie",
            CaptureKind::Sound => "sound",
        }
    }
}

/// Normalize a device folder: empty becomes the storage root.
pub fn normalize_folder(folder: &str) -> &str {
    if folder.is_empty() {
        "/"
    } else {
        folder
    }
}

/// Folder path guaranteed to end with the `/` separator.
pub fn with_trailing_separator(folder: &str) -> String {
    let folder = normalize_folder(folder);
    if folder.ends_with('/') {
        folder.to_string()
    } else {
        format!("{}/", folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_normalization() {
        assert_eq!(normalize_folder(""), "/");
        assert_eq!(normalize_folder("/DCIM"), "/DCIM");
        assert_eq!(with_trailing_separator(""), "/");
        assert_eq!(with_trailing_separator("/DCIM"), "/DCIM/");
        assert_eq!(with_trailing_separator("/DCIM/"), "/DCIM/");
    }

    #[test]
    fn test_locator_path() {
        let locator = AssetLocator::new("/store_00010001/DCIM/100CANON", "IMG_0001.JPG");
        assert_eq!(locator.path(), "/store_00010001/DCIM/100CANON/IMG_0001.JPG");
        assert_eq!(AssetLocator::new("/", "a.jpg").to_string(), "/a.jpg");
    }
}
