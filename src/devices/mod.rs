//! Device driver implementations
//!
//! Real transports (USB HID, Bluetooth) implement
//! [`crate::core::driver::ControllerDriver`] in their own crates; the
//! only in-tree driver is the scriptable mock for hardware-free tests.

pub mod mock;

use crate::config::Config;
use crate::core::driver::ControllerDriver;
use crate::error::{Error, Result};
use mock::MockController;

/// Create a controller driver based on configuration
pub fn create_driver(config: &Config) -> Result<Box<dyn ControllerDriver>> {
    match config.device.device_type.as_str() {
        "mock" => Ok(Box::new(MockController::new())),
        _ => Err(Error::UnknownDevice(config.device.device_type.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_driver() {
        let config = Config::default();
        let driver = create_driver(&config).unwrap();
        assert_eq!(
            driver.connection_type(),
            crate::core::types::ConnectionType::Usb
        );
    }

    #[test]
    fn test_unknown_device_type() {
        let mut config = Config::default();
        config.device.device_type = "warp-core".to_string();
        let err = match create_driver(&config) {
            Ok(_) => panic!("expected create_driver to fail for unknown device type"),
            Err(e) => e,
        };
        assert!(matches!(err, Error::UnknownDevice(_)));
    }
}
