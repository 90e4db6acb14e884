use crate::config::TetherConfig;
use crate::driver::{CameraDriver, DeviceHandle};
use crate::error::{Result, TetherError};
use crate::events::{EventNotifier, PendingEvent};
use crate::types::Abilities;
use crate::widget::{WidgetTree, WidgetValue};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// An open session with one tethered camera.
///
/// Created by [`Camera::init`], invalidated by [`Camera::exit`]. Every call on an
/// exited session fails with `Closed`. The session keeps a copy of the device
/// configuration tree which can be edited locally and pushed back with
/// [`Camera::set_config`].
pub struct Camera {
    pub(super) driver: Arc<dyn CameraDriver>,
    pub(super) handle: DeviceHandle,
    abilities: Abilities,
    config: WidgetTree,
    notifier: EventNotifier,
    event_timeout: Duration,
    pub(super) chunk_size: usize,
    exited: bool,
}

/// Cloneable handle that interrupts the blocking call in flight on a session.
#[derive(Clone)]
pub struct Canceller {
    driver: Arc<dyn CameraDriver>,
    handle: DeviceHandle,
}

impl Canceller {
    pub fn cancel(&self) {
        debug!("Cancelling pending operation on {}", self.handle);
        self.driver.cancel(self.handle);
    }
}

impl Camera {
    /// Open the device with default settings.
    pub fn init(driver: Arc<dyn CameraDriver>) -> Result<Self> {
        Self::init_with(driver, &TetherConfig::default())
    }

    /// Open the device, fetch its abilities and its configuration tree.
    ///
    /// The device is closed again if anything after `init` fails.
    pub fn init_with(driver: Arc<dyn CameraDriver>, config: &TetherConfig) -> Result<Self> {
        let handle = driver.init()?;
        debug!("Device opened as {}", handle);

        let setup = driver
            .abilities(handle)
            .map_err(TetherError::from)
            .and_then(|abilities| {
                fetch_tree(driver.as_ref(), handle).map(|tree| (abilities, tree))
            });

        let (abilities, tree) = match setup {
            Ok(parts) => parts,
            Err(e) => {
                warn!("Camera setup failed on {}: {}", handle, e);
                if let Err(exit_err) = driver.exit(handle) {
                    warn!("Failed to close {} after setup error: {}", handle, exit_err);
                }
                return Err(e);
            }
        };

        info!(
            "Connected to {} ({}) via {}",
            abilities.model, abilities.id, abilities.library
        );

        Ok(Self {
            notifier: EventNotifier::new(Arc::clone(&driver), handle),
            driver,
            handle,
            abilities,
            config: tree,
            event_timeout: config.session.event_timeout(),
            chunk_size: config.transfer.chunk_size.max(1),
            exited: false,
        })
    }

    pub(super) fn ensure_open(&self) -> Result<()> {
        if self.exited {
            return Err(TetherError::Closed("camera session"));
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        !self.exited
    }

    pub fn handle(&self) -> DeviceHandle {
        self.handle
    }

    pub fn abilities(&self) -> Result<&Abilities> {
        self.ensure_open()?;
        Ok(&self.abilities)
    }

    pub fn model(&self) -> Result<&str> {
        Ok(&self.abilities()?.model)
    }

    pub fn id(&self) -> Result<&str> {
        Ok(&self.abilities()?.id)
    }

    pub fn library(&self) -> Result<&str> {
        Ok(&self.abilities()?.library)
    }

    /// Default timeout for [`Camera::wait_for_event`] callers.
    pub fn event_timeout(&self) -> Duration {
        self.event_timeout
    }

    /// Window size used for chunked copies.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fetch a fresh configuration tree, independent of the session's copy.
    pub fn fetch_config(&self) -> Result<WidgetTree> {
        self.ensure_open()?;
        fetch_tree(self.driver.as_ref(), self.handle)
    }

    /// Replace the session's tree with a freshly fetched one.
    ///
    /// The previous tree is kept if the fetch fails.
    pub fn update(&mut self) -> Result<()> {
        let fresh = self.fetch_config()?;
        let mut previous = std::mem::replace(&mut self.config, fresh);
        previous.release();
        debug!("Configuration of {} refreshed", self.handle);
        Ok(())
    }

    pub fn config(&self) -> Result<&WidgetTree> {
        self.ensure_open()?;
        Ok(&self.config)
    }

    pub fn config_mut(&mut self) -> Result<&mut WidgetTree> {
        self.ensure_open()?;
        Ok(&mut self.config)
    }

    /// Push the session's tree to the device.
    pub fn set_config(&self) -> Result<()> {
        self.apply_config(&self.config)
    }

    /// Push `tree` to the device in one call.
    pub fn apply_config(&self, tree: &WidgetTree) -> Result<()> {
        self.ensure_open()?;
        if tree.is_released() {
            return Err(TetherError::Closed("widget tree"));
        }
        self.driver.apply_config(self.handle, tree)?;
        debug!("Applied configuration with {} widgets to {}", tree.len(), self.handle);
        Ok(())
    }

    /// Set one widget by path and push the tree to the device.
    ///
    /// If the device rejects the tree, the widget gets its previous value back.
    pub fn set_widget(&mut self, path: &str, value: WidgetValue) -> Result<()> {
        let tree = self.config_mut()?;
        let id = tree.lookup(path)?;
        let previous = tree.value(id)?;
        tree.set_value(id, value)?;

        if let Err(e) = self.set_config() {
            if let Err(restore_err) = self.config.set_value(id, previous) {
                warn!("Failed to restore {} after rejected apply: {}", path, restore_err);
            }
            return Err(e);
        }
        info!("Set {} on {}", path, self.handle);
        Ok(())
    }

    /// Interrupt the blocking call in flight, typically an event wait.
    pub fn cancel(&self) {
        if self.exited {
            return;
        }
        self.driver.cancel(self.handle);
    }

    pub fn canceller(&self) -> Canceller {
        Canceller {
            driver: Arc::clone(&self.driver),
            handle: self.handle,
        }
    }

    /// Wait up to `timeout` for the next device event.
    pub fn wait_for_event(&self, timeout: Duration) -> Result<PendingEvent> {
        self.ensure_open()?;
        self.notifier.wait_for_event(timeout)
    }

    /// True while an event wait is running on the device.
    pub fn is_waiting_for_event(&self) -> bool {
        self.notifier.is_waiting()
    }

    /// Close the session. Any outstanding event wait is cancelled first.
    pub fn exit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.exited = true;

        if self.notifier.is_waiting() {
            debug!("Cancelling outstanding event wait on {}", self.handle);
            self.driver.cancel(self.handle);
        }
        self.config.release();

        self.driver.exit(self.handle)?;
        info!("Closed camera session {}", self.handle);
        Ok(())
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        if self.exited {
            return;
        }
        if let Err(e) = self.exit() {
            warn!("Failed to close camera session {}: {}", self.handle, e);
        }
    }
}

/// Allocate a Window root and let the driver populate it.
///
/// A partially populated tree is released before the error is returned.
fn fetch_tree(driver: &dyn CameraDriver, handle: DeviceHandle) -> Result<WidgetTree> {
    let mut tree = WidgetTree::new("");
    match driver.populate_config(handle, &mut tree) {
        Ok(()) => {
            debug!("Fetched configuration tree with {} widgets", tree.len());
            Ok(tree)
        }
        Err(e) => {
            tree.release();
            Err(TetherError::ConfigFetch(e))
        }
    }
}
