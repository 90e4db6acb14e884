use super::session::Camera;
use crate::config::TetherConfig;
use crate::driver::CameraDriver;
use crate::error::{Result, TetherError};
use std::sync::Arc;

/// Builder for a camera session
pub struct CameraBuilder {
    driver: Option<Arc<dyn CameraDriver>>,
    config: Option<TetherConfig>,
}

impl CameraBuilder {
    pub fn new() -> Self {
        Self {
            driver: None,
            config: None,
        }
    }

    pub fn driver(mut self, driver: Arc<dyn CameraDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn config(mut self, config: TetherConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<Camera> {
        let driver = self
            .driver
            .ok_or_else(|| TetherError::system("Camera driver must be specified"))?;
        let config = self.config.unwrap_or_default();

        Camera::init_with(driver, &config)
    }
}

impl Default for CameraBuilder {
    fn default() -> Self {
        Self::new()
    }
}
