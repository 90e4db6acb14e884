use crate::events::CameraEvent;
use crate::status::DeviceError;
use crate::types::{Abilities, AssetInfo, AssetLocator, CaptureKind};
use crate::widget::WidgetTree;
use std::fmt;
use std::time::Duration;

pub type DriverResult<T> = std::result::Result<T, DeviceError>;

/// Name/value pairs as reported by a driver listing, in device order.
pub type NameValueList = Vec<(String, String)>;

/// Opaque handle for one initialized device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle(u64);

impl DeviceHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// Minimal call surface a camera transport has to provide.
///
/// Every call blocks until the device answers. Implementations must be safe to
/// share between threads: the event wait runs on a blocking task while the
/// session keeps the driver, and `cancel` may be invoked concurrently with any
/// other call to interrupt it.
pub trait CameraDriver: Send + Sync {
    fn init(&self) -> DriverResult<DeviceHandle>;

    fn exit(&self, handle: DeviceHandle) -> DriverResult<()>;

    /// Interrupt whatever blocking call is in flight on `handle`.
    fn cancel(&self, handle: DeviceHandle);

    fn abilities(&self, handle: DeviceHandle) -> DriverResult<Abilities>;

    /// Fill a freshly allocated Window root with the device configuration.
    fn populate_config(&self, handle: DeviceHandle, root: &mut WidgetTree) -> DriverResult<()>;

    /// Push a whole configuration tree to the device.
    fn apply_config(&self, handle: DeviceHandle, tree: &WidgetTree) -> DriverResult<()>;

    fn list_folders(&self, handle: DeviceHandle, folder: &str) -> DriverResult<NameValueList>;

    fn list_files(&self, handle: DeviceHandle, folder: &str) -> DriverResult<NameValueList>;

    /// Fire a capture and let the device keep the result.
    fn trigger_capture(&self, handle: DeviceHandle) -> DriverResult<()>;

    /// Capture and report where the device stored the result.
    fn capture(&self, handle: DeviceHandle, kind: CaptureKind) -> DriverResult<AssetLocator>;

    /// Capture a low resolution preview straight into memory.
    fn capture_preview(&self, handle: DeviceHandle) -> DriverResult<Vec<u8>>;

    /// Fetch a whole file.
    fn file_get(&self, handle: DeviceHandle, locator: &AssetLocator) -> DriverResult<Vec<u8>>;

    /// Read up to `buf.len()` bytes starting at `offset`, returning the count.
    fn file_read(
        &self,
        handle: DeviceHandle,
        locator: &AssetLocator,
        offset: u64,
        buf: &mut [u8],
    ) -> DriverResult<usize>;

    fn file_info(&self, handle: DeviceHandle, locator: &AssetLocator) -> DriverResult<AssetInfo>;

    fn file_delete(&self, handle: DeviceHandle, locator: &AssetLocator) -> DriverResult<()>;

    /// Block until the device reports an event or `timeout` elapses.
    fn wait_for_event(&self, handle: DeviceHandle, timeout: Duration)
        -> DriverResult<CameraEvent>;
}
