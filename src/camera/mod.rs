mod builder;
mod capture;
mod session;
mod storage;

pub use builder::CameraBuilder;
pub use session::{Camera, Canceller};
