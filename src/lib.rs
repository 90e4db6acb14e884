pub mod camera;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod status;
pub mod transfer;
pub mod types;
pub mod widget;

pub use camera::{Camera, CameraBuilder, Canceller};
pub use config::TetherConfig;
pub use driver::{CameraDriver, DeviceHandle, SimulatedDriver};
pub use error::{Result, TetherError};
pub use events::{CameraEvent, EventKind, PendingEvent};
pub use status::DeviceError;
pub use transfer::{AssetReader, BufferedReader, ChunkedReader, ReadOutcome};
pub use types::{Abilities, AssetInfo, AssetLocator, CaptureKind};
pub use widget::{ValueType, Widget, WidgetId, WidgetKind, WidgetSpec, WidgetTree, WidgetValue};
