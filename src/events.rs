use crate::driver::{CameraDriver, DeviceHandle};
use crate::error::{Result, TetherError};
use crate::types::AssetLocator;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, trace, warn};

/// Kind of an asynchronous device event.
///
/// Discriminants follow the driver's numeric event codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    Unknown = 0,
    Timeout = 1,
    FileAdded = 2,
}

impl EventKind {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => EventKind::Timeout,
            2 => EventKind::FileAdded,
            _ => EventKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Unknown => "unknown",
            EventKind::Timeout => "timeout",
            EventKind::FileAdded => "file_added",
        }
    }
}

/// Event reported by the device.
///
/// `folder` and `name` are only populated for `FileAdded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraEvent {
    pub kind: EventKind,
    pub folder: String,
    pub name: String,
}

impl CameraEvent {
    pub fn unknown() -> Self {
        Self {
            kind: EventKind::Unknown,
            folder: String::new(),
            name: String::new(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            kind: EventKind::Timeout,
            ..Self::unknown()
        }
    }

    pub fn file_added(locator: AssetLocator) -> Self {
        Self {
            kind: EventKind::FileAdded,
            folder: locator.folder,
            name: locator.name,
        }
    }

    /// Location of the new file for `FileAdded` events.
    pub fn locator(&self) -> Option<AssetLocator> {
        match self.kind {
            EventKind::FileAdded => Some(AssetLocator::new(self.folder.clone(), self.name.clone())),
            _ => None,
        }
    }

    pub fn description(&self) -> String {
        match self.kind {
            EventKind::FileAdded => format!(
                "File added: {}",
                AssetLocator::new(self.folder.as_str(), self.name.as_str()).path()
            ),
            EventKind::Timeout => "Timed out waiting for event".to_string(),
            EventKind::Unknown => "Unknown event".to_string(),
        }
    }
}

/// Result of one event wait, delivered exactly once.
///
/// Dropping a pending event does not stop the device wait: the blocking task
/// lives on until the driver call returns on its own (timeout or cancel).
#[derive(Debug)]
pub struct PendingEvent {
    receiver: oneshot::Receiver<Result<CameraEvent>>,
    delivered: bool,
}

impl PendingEvent {
    /// Wait for the event. A second call reports the channel as exhausted.
    pub async fn next(&mut self) -> Result<CameraEvent> {
        if self.delivered {
            return Err(TetherError::Closed("event channel"));
        }
        let outcome = (&mut self.receiver).await;
        self.delivered = true;
        outcome.map_err(|_| TetherError::system("Event wait task ended without a result"))?
    }

    /// Non-blocking poll: `Ok(None)` while the device is still waiting.
    pub fn try_next(&mut self) -> Result<Option<CameraEvent>> {
        if self.delivered {
            return Err(TetherError::Closed("event channel"));
        }
        match self.receiver.try_recv() {
            Ok(outcome) => {
                self.delivered = true;
                outcome.map(Some)
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Closed) => {
                self.delivered = true;
                Err(TetherError::system("Event wait task ended without a result"))
            }
        }
    }

    /// Block the current thread until the event arrives.
    ///
    /// Must not be called from within an async context.
    pub fn blocking_next(self) -> Result<CameraEvent> {
        if self.delivered {
            return Err(TetherError::Closed("event channel"));
        }
        self.receiver
            .blocking_recv()
            .map_err(|_| TetherError::system("Event wait task ended without a result"))?
    }

    pub fn is_exhausted(&self) -> bool {
        self.delivered
    }
}

/// Clears the outstanding flag when the wait task ends, including by panic.
struct OutstandingGuard(Arc<AtomicBool>);

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs device event waits on the blocking thread pool.
///
/// At most one wait may be outstanding per session; the device handle is not
/// safe for two concurrent waits.
pub struct EventNotifier {
    driver: Arc<dyn CameraDriver>,
    handle: DeviceHandle,
    outstanding: Arc<AtomicBool>,
}

impl EventNotifier {
    pub fn new(driver: Arc<dyn CameraDriver>, handle: DeviceHandle) -> Self {
        Self {
            driver,
            handle,
            outstanding: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while a wait is running on the device.
    pub fn is_waiting(&self) -> bool {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Start waiting for the next device event.
    ///
    /// Requires a Tokio runtime. Fails with `EventPending` if a previous wait
    /// has not returned from the device yet.
    pub fn wait_for_event(&self, timeout: Duration) -> Result<PendingEvent> {
        if self.outstanding.swap(true, Ordering::AcqRel) {
            warn!("Rejected event wait on {}: another wait is outstanding", self.handle);
            return Err(TetherError::EventPending);
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                self.outstanding.store(false, Ordering::Release);
                return Err(TetherError::system(format!(
                    "Event wait requires a Tokio runtime: {}",
                    e
                )));
            }
        };

        let (sender, receiver) = oneshot::channel();
        let driver = Arc::clone(&self.driver);
        let outstanding = Arc::clone(&self.outstanding);
        let handle = self.handle;

        debug!("Waiting up to {:?} for event on {}", timeout, handle);
        runtime.spawn_blocking(move || {
            let guard = OutstandingGuard(outstanding);
            let outcome = driver
                .wait_for_event(handle, timeout)
                .map_err(TetherError::from);
            drop(guard);

            match &outcome {
                Ok(event) => debug!("Event on {}: {}", handle, event.description()),
                Err(e) => debug!("Event wait on {} failed: {}", handle, e),
            }
            if sender.send(outcome).is_err() {
                trace!("Event receiver for {} was dropped", handle);
            }
        });

        Ok(PendingEvent {
            receiver,
            delivered: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{SimOp, SimulatedDriver};
    use crate::status;

    fn open_notifier() -> (Arc<SimulatedDriver>, EventNotifier) {
        let driver = Arc::new(SimulatedDriver::builder().build());
        let handle = driver.init().unwrap();
        let notifier = EventNotifier::new(driver.clone(), handle);
        (driver, notifier)
    }

    #[test]
    fn test_event_kind_from_raw() {
        assert_eq!(EventKind::from_raw(0), EventKind::Unknown);
        assert_eq!(EventKind::from_raw(1), EventKind::Timeout);
        assert_eq!(EventKind::from_raw(2), EventKind::FileAdded);
        assert_eq!(EventKind::from_raw(42), EventKind::Unknown);
    }

    #[test]
    fn test_locator_only_for_file_added() {
        assert!(CameraEvent::timeout().locator().is_none());
        assert!(CameraEvent::unknown().locator().is_none());

        let event = CameraEvent::file_added(AssetLocator::new("/DCIM", "IMG_0001.JPG"));
        assert_eq!(event.locator(), Some(AssetLocator::new("/DCIM", "IMG_0001.JPG")));
        assert_eq!(event.description(), "File added: /DCIM/IMG_0001.JPG");
    }

    #[tokio::test]
    async fn test_idle_device_times_out_once() {
        let (_driver, notifier) = open_notifier();

        let mut pending = notifier.wait_for_event(Duration::from_millis(50)).unwrap();
        let event = pending.next().await.unwrap();
        assert_eq!(event.kind, EventKind::Timeout);
        assert!(event.folder.is_empty());
        assert!(event.name.is_empty());

        assert!(pending.is_exhausted());
        assert!(matches!(pending.next().await, Err(TetherError::Closed(_))));
        assert!(matches!(pending.try_next(), Err(TetherError::Closed(_))));
    }

    #[tokio::test]
    async fn test_file_added_event_delivered() {
        let (driver, notifier) = open_notifier();
        driver.push_event(CameraEvent::file_added(AssetLocator::new("/DCIM", "IMG_0002.JPG")));

        let mut pending = notifier.wait_for_event(Duration::from_secs(5)).unwrap();
        let event = pending.next().await.unwrap();
        assert_eq!(event.kind, EventKind::FileAdded);
        assert_eq!(event.folder, "/DCIM");
        assert_eq!(event.name, "IMG_0002.JPG");
    }

    #[tokio::test]
    async fn test_event_pushed_while_waiting() {
        let (driver, notifier) = open_notifier();
        let mut pending = notifier.wait_for_event(Duration::from_secs(5)).unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        driver.push_event(CameraEvent::unknown());

        let event = pending.next().await.unwrap();
        assert_eq!(event.kind, EventKind::Unknown);
    }

    #[tokio::test]
    async fn test_second_wait_rejected_while_outstanding() {
        let (_driver, notifier) = open_notifier();
        let mut first = notifier.wait_for_event(Duration::from_millis(200)).unwrap();

        assert!(matches!(
            notifier.wait_for_event(Duration::from_millis(10)),
            Err(TetherError::EventPending)
        ));

        first.next().await.unwrap();
        assert!(!notifier.is_waiting());

        let mut second = notifier.wait_for_event(Duration::from_millis(10)).unwrap();
        assert_eq!(second.next().await.unwrap().kind, EventKind::Timeout);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_wait() {
        let (driver, notifier) = open_notifier();
        let handle = notifier.handle;
        let mut pending = notifier.wait_for_event(Duration::from_secs(30)).unwrap();

        while !driver.is_waiting() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        driver.cancel(handle);

        let err = pending.next().await.unwrap_err();
        assert_eq!(err.device_code(), Some(status::ERROR_CANCEL));
    }

    #[tokio::test]
    async fn test_device_error_propagated() {
        let (driver, notifier) = open_notifier();
        driver.fail_on(SimOp::WaitForEvent, status::ERROR_IO_READ);

        let mut pending = notifier.wait_for_event(Duration::from_secs(1)).unwrap();
        let err = pending.next().await.unwrap_err();
        assert_eq!(err.device_code(), Some(status::ERROR_IO_READ));
    }

    struct PanickingDriver {
        inner: SimulatedDriver,
    }

    impl CameraDriver for PanickingDriver {
        fn init(&self) -> crate::driver::DriverResult<DeviceHandle> {
            self.inner.init()
        }
        fn exit(&self, handle: DeviceHandle) -> crate::driver::DriverResult<()> {
            self.inner.exit(handle)
        }
        fn cancel(&self, handle: DeviceHandle) {
            self.inner.cancel(handle)
        }
        fn abilities(&self, handle: DeviceHandle) -> crate::driver::DriverResult<crate::types::Abilities> {
            self.inner.abilities(handle)
        }
        fn populate_config(
            &self,
            handle: DeviceHandle,
            root: &mut crate::widget::WidgetTree,
        ) -> crate::driver::DriverResult<()> {
            self.inner.populate_config(handle, root)
        }
        fn apply_config(
            &self,
            handle: DeviceHandle,
            tree: &crate::widget::WidgetTree,
        ) -> crate::driver::DriverResult<()> {
            self.inner.apply_config(handle, tree)
        }
        fn list_folders(
            &self,
            handle: DeviceHandle,
            folder: &str,
        ) -> crate::driver::DriverResult<crate::driver::NameValueList> {
            self.inner.list_folders(handle, folder)
        }
        fn list_files(
            &self,
            handle: DeviceHandle,
            folder: &str,
        ) -> crate::driver::DriverResult<crate::driver::NameValueList> {
            self.inner.list_files(handle, folder)
        }
        fn trigger_capture(&self, handle: DeviceHandle) -> crate::driver::DriverResult<()> {
            self.inner.trigger_capture(handle)
        }
        fn capture(
            &self,
            handle: DeviceHandle,
            kind: crate::types::CaptureKind,
        ) -> crate::driver::DriverResult<AssetLocator> {
            self.inner.capture(handle, kind)
        }
        fn capture_preview(&self, handle: DeviceHandle) -> crate::driver::DriverResult<Vec<u8>> {
            self.inner.capture_preview(handle)
        }
        fn file_get(
            &self,
            handle: DeviceHandle,
            locator: &AssetLocator,
        ) -> crate::driver::DriverResult<Vec<u8>> {
            self.inner.file_get(handle, locator)
        }
        fn file_read(
            &self,
            handle: DeviceHandle,
            locator: &AssetLocator,
            offset: u64,
            buf: &mut [u8],
        ) -> crate::driver::DriverResult<usize> {
            self.inner.file_read(handle, locator, offset, buf)
        }
        fn file_info(
            &self,
            handle: DeviceHandle,
            locator: &AssetLocator,
        ) -> crate::driver::DriverResult<crate::types::AssetInfo> {
            self.inner.file_info(handle, locator)
        }
        fn file_delete(
            &self,
            handle: DeviceHandle,
            locator: &AssetLocator,
        ) -> crate::driver::DriverResult<()> {
            self.inner.file_delete(handle, locator)
        }
        fn wait_for_event(
            &self,
            _handle: DeviceHandle,
            _timeout: Duration,
        ) -> crate::driver::DriverResult<CameraEvent> {
            panic!("driver crashed during event wait");
        }
    }

    #[tokio::test]
    async fn test_driver_panic_releases_outstanding_wait() {
        let driver = Arc::new(PanickingDriver {
            inner: SimulatedDriver::builder().build(),
        });
        let handle = driver.init().unwrap();
        let notifier = EventNotifier::new(driver, handle);

        let mut pending = notifier.wait_for_event(Duration::from_millis(10)).unwrap();
        assert!(matches!(pending.next().await, Err(TetherError::System { .. })));
        assert!(!notifier.is_waiting());

        let mut retry = notifier.wait_for_event(Duration::from_millis(10)).unwrap();
        assert!(matches!(retry.next().await, Err(TetherError::System { .. })));
    }

    #[test]
    fn test_wait_without_runtime_fails_cleanly() {
        let (_driver, notifier) = open_notifier();
        assert!(matches!(
            notifier.wait_for_event(Duration::from_millis(10)),
            Err(TetherError::System { .. })
        ));
        assert!(!notifier.is_waiting());
    }
}
