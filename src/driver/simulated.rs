use super::traits::{CameraDriver, DeviceHandle, DriverResult, NameValueList};
use crate::events::CameraEvent;
use crate::status::{self, DeviceError};
use crate::types::{Abilities, AssetInfo, AssetLocator, CaptureKind};
use crate::widget::{WidgetId, WidgetSpec, WidgetTree};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Driver operations that can be made to fail on the simulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOp {
    Init,
    Abilities,
    PopulateConfig,
    ApplyConfig,
    ListFolders,
    ListFiles,
    TriggerCapture,
    Capture,
    CapturePreview,
    FileGet,
    FileRead,
    FileInfo,
    FileDelete,
    WaitForEvent,
}

#[derive(Debug, Clone)]
struct StoredFile {
    locator: AssetLocator,
    data: Vec<u8>,
    modified: DateTime<Utc>,
    width: u32,
    height: u32,
}

#[derive(Debug)]
struct DeviceState {
    abilities: Abilities,
    folders: Vec<String>,
    files: Vec<StoredFile>,
    config: WidgetTree,
    preview: Vec<u8>,
    capture_folder: String,
    capture_counter: u32,
    events: VecDeque<CameraEvent>,
    failures: HashMap<SimOp, i32>,
    session: Option<DeviceHandle>,
    next_handle: u64,
    waiting: bool,
    cancelled: bool,
    triggers: u32,
    applies: u32,
}

impl DeviceState {
    fn check(&self, handle: DeviceHandle, op: SimOp) -> DriverResult<()> {
        if self.session != Some(handle) {
            return Err(DeviceError::with_message(
                status::ERROR_BAD_PARAMETERS,
                format!("{} is not initialized", handle),
            ));
        }
        self.injected(op)
    }

    fn injected(&self, op: SimOp) -> DriverResult<()> {
        match self.failures.get(&op) {
            Some(code) => {
                trace!("Simulated failure for {:?}: {}", op, code);
                Err(DeviceError::from_code(*code))
            }
            None => Ok(()),
        }
    }

    fn folder_exists(&self, folder: &str) -> bool {
        folder == "/" || self.folders.iter().any(|known| known == folder)
    }

    fn find_file(&self, locator: &AssetLocator) -> DriverResult<&StoredFile> {
        let folder = trim_folder(&locator.folder);
        self.files
            .iter()
            .find(|file| file.locator.folder == folder && file.locator.name == locator.name)
            .ok_or_else(|| DeviceError::from_code(status::ERROR_FILE_NOT_FOUND))
    }

    fn store_capture(&mut self, kind: CaptureKind) -> AssetLocator {
        self.capture_counter += 1;
        let name = match kind {
            CaptureKind::Image => format!("IMG_{:04}.JPG", self.capture_counter),
            CaptureKind::Movie => format!("MVI_{:04}.MOV", self.capture_counter),
            CaptureKind::Sound => format!("SND_{:04}.WAV", self.capture_counter),
        };
        let locator = AssetLocator::new(self.capture_folder.clone(), name);
        let (width, height) = match kind {
            CaptureKind::Image => (6000, 4000),
            _ => (0, 0),
        };
        self.files.push(StoredFile {
            locator: locator.clone(),
            data: synthetic_asset(self.capture_counter, 64 * 1024),
            modified: Utc::now(),
            width,
            height,
        });
        locator
    }
}

/// Strip the trailing separator from a folder path, keeping the root as `/`.
fn trim_folder(folder: &str) -> String {
    let trimmed = folder.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parent_folder(folder: &str) -> String {
    match folder.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => folder[..index].to_string(),
    }
}

fn leaf_name(folder: &str) -> &str {
    folder.rsplit('/').next().unwrap_or(folder)
}

/// Deterministic bytes standing in for captured media.
fn synthetic_asset(seed: u32, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| ((i as u32).wrapping_mul(31).wrapping_add(seed) % 251) as u8)
        .collect()
}

/// In-memory camera used by the tests and the command line tool.
///
/// Holds a storage tree, a configuration tree and an event queue behind one
/// lock. Any operation can be made to fail with a chosen status code.
pub struct SimulatedDriver {
    state: Mutex<DeviceState>,
    event_signal: Condvar,
}

impl SimulatedDriver {
    pub fn builder() -> SimulatedDriverBuilder {
        SimulatedDriverBuilder::new()
    }

    /// A device with a typical DSLR storage layout and configuration.
    pub fn demo() -> Self {
        Self::demo_builder().build()
    }

    /// Builder preloaded with the [`SimulatedDriver::demo`] layout.
    pub fn demo_builder() -> SimulatedDriverBuilder {
        Self::builder()
            .folder("/store_00010001/DCIM/100SIMCA")
            .image(
                "/store_00010001/DCIM/100SIMCA",
                "IMG_0001.JPG",
                synthetic_asset(1, 256 * 1024),
                6000,
                4000,
            )
            .file(
                "/store_00010001/DCIM/100SIMCA",
                "SND_0001.WAV",
                synthetic_asset(2, 32 * 1024),
            )
            .capture_folder("/store_00010001/DCIM/100SIMCA")
            .capture_counter(1)
    }

    /// Make every subsequent call of `op` fail with `code`.
    pub fn fail_on(&self, op: SimOp, code: i32) {
        self.state.lock().failures.insert(op, code);
    }

    pub fn clear_failure(&self, op: SimOp) {
        self.state.lock().failures.remove(&op);
    }

    /// Queue an event for the next `wait_for_event` call.
    pub fn push_event(&self, event: CameraEvent) {
        self.state.lock().events.push_back(event);
        self.event_signal.notify_all();
    }

    /// Number of captures the device has been asked to perform.
    pub fn capture_count(&self) -> u32 {
        self.state.lock().triggers
    }

    /// Number of configuration trees pushed to the device.
    pub fn apply_count(&self) -> u32 {
        self.state.lock().applies
    }

    /// Current value of a configuration widget on the device side.
    pub fn config_value(&self, path: &str) -> Option<crate::widget::WidgetValue> {
        let state = self.state.lock();
        let id = state.config.lookup(path).ok()?;
        state.config.value(id).ok()
    }

    pub fn has_file(&self, locator: &AssetLocator) -> bool {
        self.state.lock().find_file(locator).is_ok()
    }

    /// True while a `wait_for_event` call is blocked on the device.
    pub fn is_waiting(&self) -> bool {
        self.state.lock().waiting
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().session.is_some()
    }
}

impl CameraDriver for SimulatedDriver {
    fn init(&self) -> DriverResult<DeviceHandle> {
        let mut state = self.state.lock();
        state.injected(SimOp::Init)?;
        if state.session.is_some() {
            return Err(DeviceError::from_code(status::ERROR_IO_LOCK));
        }
        state.next_handle += 1;
        let handle = DeviceHandle::new(state.next_handle);
        state.session = Some(handle);
        debug!("Simulated device opened as {}", handle);
        Ok(handle)
    }

    fn exit(&self, handle: DeviceHandle) -> DriverResult<()> {
        let mut state = self.state.lock();
        if state.session != Some(handle) {
            return Err(DeviceError::from_code(status::ERROR_BAD_PARAMETERS));
        }
        state.session = None;
        debug!("Simulated device {} closed", handle);
        Ok(())
    }

    fn cancel(&self, handle: DeviceHandle) {
        let mut state = self.state.lock();
        if state.session == Some(handle) && state.waiting {
            state.cancelled = true;
            self.event_signal.notify_all();
        }
    }

    fn abilities(&self, handle: DeviceHandle) -> DriverResult<Abilities> {
        let state = self.state.lock();
        state.check(handle, SimOp::Abilities)?;
        Ok(state.abilities.clone())
    }

    fn populate_config(&self, handle: DeviceHandle, root: &mut WidgetTree) -> DriverResult<()> {
        let state = self.state.lock();
        state.check(handle, SimOp::PopulateConfig)?;

        let source = &state.config;
        let order = source
            .walk()
            .map_err(|e| DeviceError::with_message(status::ERROR_CORRUPTED_DATA, e.to_string()))?;
        let label = source
            .widget(source.root())
            .map(|w| w.label().to_string())
            .map_err(|e| DeviceError::with_message(status::ERROR_CORRUPTED_DATA, e.to_string()))?;
        root.set_label(root.root(), label)
            .map_err(|e| DeviceError::with_message(status::ERROR_BAD_PARAMETERS, e.to_string()))?;
        let mut mapped: HashMap<WidgetId, WidgetId> = HashMap::new();
        mapped.insert(source.root(), root.root());

        for id in order.into_iter().skip(1) {
            let widget = source
                .widget(id)
                .map_err(|e| DeviceError::with_message(status::ERROR_CORRUPTED_DATA, e.to_string()))?;
            let parent = widget
                .parent()
                .and_then(|parent| mapped.get(&parent).copied())
                .ok_or_else(|| DeviceError::from_code(status::ERROR_CORRUPTED_DATA))?;
            let mut spec = WidgetSpec::new(
                widget.kind(),
                widget.name(),
                widget.label(),
                widget.value().clone(),
            );
            spec.readonly = widget.readonly();
            let copy = root
                .add_child(parent, spec)
                .map_err(|e| DeviceError::with_message(status::ERROR_NO_MEMORY, e.to_string()))?;
            mapped.insert(id, copy);
        }
        Ok(())
    }

    fn apply_config(&self, handle: DeviceHandle, tree: &WidgetTree) -> DriverResult<()> {
        let mut state = self.state.lock();
        state.check(handle, SimOp::ApplyConfig)?;
        if tree.is_released() {
            return Err(DeviceError::from_code(status::ERROR_BAD_PARAMETERS));
        }
        state.config = tree.clone();
        state.applies += 1;
        Ok(())
    }

    fn list_folders(&self, handle: DeviceHandle, folder: &str) -> DriverResult<NameValueList> {
        let state = self.state.lock();
        state.check(handle, SimOp::ListFolders)?;
        let folder = trim_folder(folder);
        if !state.folder_exists(&folder) {
            return Err(DeviceError::from_code(status::ERROR_DIRECTORY_NOT_FOUND));
        }
        Ok(state
            .folders
            .iter()
            .filter(|known| parent_folder(known) == folder)
            .map(|known| (leaf_name(known).to_string(), String::new()))
            .collect())
    }

    fn list_files(&self, handle: DeviceHandle, folder: &str) -> DriverResult<NameValueList> {
        let state = self.state.lock();
        state.check(handle, SimOp::ListFiles)?;
        let folder = trim_folder(folder);
        if !state.folder_exists(&folder) {
            return Err(DeviceError::from_code(status::ERROR_DIRECTORY_NOT_FOUND));
        }
        Ok(state
            .files
            .iter()
            .filter(|file| file.locator.folder == folder)
            .map(|file| (file.locator.name.clone(), String::new()))
            .collect())
    }

    fn trigger_capture(&self, handle: DeviceHandle) -> DriverResult<()> {
        let mut state = self.state.lock();
        state.check(handle, SimOp::TriggerCapture)?;
        state.triggers += 1;
        let locator = state.store_capture(CaptureKind::Image);
        state.events.push_back(CameraEvent::file_added(locator));
        self.event_signal.notify_all();
        Ok(())
    }

    fn capture(&self, handle: DeviceHandle, kind: CaptureKind) -> DriverResult<AssetLocator> {
        let mut state = self.state.lock();
        state.check(handle, SimOp::Capture)?;
        state.triggers += 1;
        Ok(state.store_capture(kind))
    }

    fn capture_preview(&self, handle: DeviceHandle) -> DriverResult<Vec<u8>> {
        let state = self.state.lock();
        state.check(handle, SimOp::CapturePreview)?;
        Ok(state.preview.clone())
    }

    fn file_get(&self, handle: DeviceHandle, locator: &AssetLocator) -> DriverResult<Vec<u8>> {
        let state = self.state.lock();
        state.check(handle, SimOp::FileGet)?;
        Ok(state.find_file(locator)?.data.clone())
    }

    fn file_read(
        &self,
        handle: DeviceHandle,
        locator: &AssetLocator,
        offset: u64,
        buf: &mut [u8],
    ) -> DriverResult<usize> {
        let state = self.state.lock();
        state.check(handle, SimOp::FileRead)?;
        let data = &state.find_file(locator)?.data;
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(data.len());
        let count = buf.len().min(data.len() - start);
        buf[..count].copy_from_slice(&data[start..start + count]);
        Ok(count)
    }

    fn file_info(&self, handle: DeviceHandle, locator: &AssetLocator) -> DriverResult<AssetInfo> {
        let state = self.state.lock();
        state.check(handle, SimOp::FileInfo)?;
        let file = state.find_file(locator)?;
        Ok(AssetInfo {
            size: file.data.len() as u64,
            modified_time: file.modified,
            width: file.width,
            height: file.height,
        })
    }

    fn file_delete(&self, handle: DeviceHandle, locator: &AssetLocator) -> DriverResult<()> {
        let mut state = self.state.lock();
        state.check(handle, SimOp::FileDelete)?;
        state.find_file(locator)?;
        let folder = trim_folder(&locator.folder);
        state
            .files
            .retain(|file| !(file.locator.folder == folder && file.locator.name == locator.name));
        Ok(())
    }

    fn wait_for_event(
        &self,
        handle: DeviceHandle,
        timeout: Duration,
    ) -> DriverResult<CameraEvent> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        state.check(handle, SimOp::WaitForEvent)?;
        state.waiting = true;

        let outcome = loop {
            if state.cancelled {
                break Err(DeviceError::from_code(status::ERROR_CANCEL));
            }
            if let Some(event) = state.events.pop_front() {
                break Ok(event);
            }
            if Instant::now() >= deadline {
                break Ok(CameraEvent::timeout());
            }
            self.event_signal.wait_until(&mut state, deadline);
        };

        state.waiting = false;
        state.cancelled = false;
        outcome
    }
}

/// Builder for a [`SimulatedDriver`].
pub struct SimulatedDriverBuilder {
    abilities: Abilities,
    folders: Vec<String>,
    files: Vec<StoredFile>,
    config: Option<WidgetTree>,
    preview: Vec<u8>,
    capture_folder: String,
    capture_counter: u32,
}

impl SimulatedDriverBuilder {
    pub fn new() -> Self {
        Self {
            abilities: Abilities {
                model: "Simulated Camera".to_string(),
                id: "sim-0001".to_string(),
                library: "simulated".to_string(),
            },
            folders: Vec::new(),
            files: Vec::new(),
            config: None,
            preview: synthetic_asset(0, 16 * 1024),
            capture_folder: "/".to_string(),
            capture_counter: 0,
        }
    }

    pub fn abilities(mut self, abilities: Abilities) -> Self {
        self.abilities = abilities;
        self
    }

    /// Add a folder and any missing parents.
    pub fn folder(mut self, path: &str) -> Self {
        let path = trim_folder(path);
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            if !self.folders.contains(&current) {
                self.folders.push(current.clone());
            }
        }
        self
    }

    pub fn file(self, folder: &str, name: &str, data: Vec<u8>) -> Self {
        self.image(folder, name, data, 0, 0)
    }

    pub fn image(mut self, folder: &str, name: &str, data: Vec<u8>, width: u32, height: u32) -> Self {
        self = self.folder(folder);
        self.files.push(StoredFile {
            locator: AssetLocator::new(trim_folder(folder), name),
            data,
            modified: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_else(Utc::now),
            width,
            height,
        });
        self
    }

    pub fn config(mut self, config: WidgetTree) -> Self {
        self.config = Some(config);
        self
    }

    pub fn preview(mut self, data: Vec<u8>) -> Self {
        self.preview = data;
        self
    }

    /// Folder new captures are stored in.
    pub fn capture_folder(mut self, folder: &str) -> Self {
        self = self.folder(folder);
        self.capture_folder = trim_folder(folder);
        self
    }

    pub fn capture_counter(mut self, counter: u32) -> Self {
        self.capture_counter = counter;
        self
    }

    pub fn build(self) -> SimulatedDriver {
        let config = self.config.unwrap_or_else(default_config);
        debug!(
            "Building simulated device '{}' with {} folders and {} files",
            self.abilities.model,
            self.folders.len(),
            self.files.len()
        );
        SimulatedDriver {
            state: Mutex::new(DeviceState {
                abilities: self.abilities,
                folders: self.folders,
                files: self.files,
                config,
                preview: self.preview,
                capture_folder: self.capture_folder,
                capture_counter: self.capture_counter,
                events: VecDeque::new(),
                failures: HashMap::new(),
                session: None,
                next_handle: 0,
                waiting: false,
                cancelled: false,
                triggers: 0,
                applies: 0,
            }),
            event_signal: Condvar::new(),
        }
    }
}

impl Default for SimulatedDriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration tree resembling a typical DSLR.
fn default_config() -> WidgetTree {
    let mut tree = WidgetTree::new("Camera and Driver Configuration");
    if let Err(e) = populate_default_config(&mut tree) {
        warn!("Incomplete simulated configuration: {}", e);
    }
    tree
}

fn populate_default_config(tree: &mut WidgetTree) -> crate::error::Result<()> {
    let root = tree.root();

    let actions = tree.add_child(root, WidgetSpec::section("actions", "Camera Actions"))?;
    tree.add_child(actions, WidgetSpec::button("autofocusdrive", "Drive Canon DSLR Autofocus"))?;
    tree.add_child(actions, WidgetSpec::toggle("viewfinder", "Canon EOS Viewfinder", false))?;

    let settings = tree.add_child(root, WidgetSpec::section("settings", "Camera Settings"))?;
    tree.add_child(
        settings,
        WidgetSpec::date(
            "datetime",
            "Camera Date and Time",
            Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_else(Utc::now),
        ),
    )?;
    tree.add_child(settings, WidgetSpec::text("artist", "Artist", ""))?;
    tree.add_child(settings, WidgetSpec::text("copyright", "Copyright", ""))?;
    tree.add_child(settings, WidgetSpec::radio("capturetarget", "Capture Target", "Memory card"))?;

    let status = tree.add_child(root, WidgetSpec::section("status", "Camera Status Information"))?;
    tree.add_child(status, WidgetSpec::text("serialnumber", "Serial Number", "0042").readonly())?;
    tree.add_child(status, WidgetSpec::text("manufacturer", "Camera Manufacturer", "Simulated").readonly())?;
    tree.add_child(status, WidgetSpec::range("batterylevel", "Battery Level", 100).readonly())?;

    let imgsettings = tree.add_child(root, WidgetSpec::section("imgsettings", "Image Settings"))?;
    tree.add_child(imgsettings, WidgetSpec::radio("iso", "ISO Speed", "100"))?;
    tree.add_child(imgsettings, WidgetSpec::menu("whitebalance", "WhiteBalance", 0))?;

    let capturesettings =
        tree.add_child(root, WidgetSpec::section("capturesettings", "Capture Settings"))?;
    tree.add_child(capturesettings, WidgetSpec::radio("shutterspeed", "Shutter Speed", "1/125"))?;
    tree.add_child(capturesettings, WidgetSpec::radio("aperture", "Aperture", "5.6"))?;
    tree.add_child(capturesettings, WidgetSpec::range("exposurecompensation", "Exposure Compensation", 0))?;

    Ok(())
}
