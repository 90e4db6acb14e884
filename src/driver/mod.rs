//! Boundary with the transport that actually talks to the device.

mod simulated;
mod traits;
#[cfg(test)]
mod tests;

pub use simulated::{SimOp, SimulatedDriver, SimulatedDriverBuilder};
pub use traits::{CameraDriver, DeviceHandle, DriverResult, NameValueList};
