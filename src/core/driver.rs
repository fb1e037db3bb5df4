//! ControllerDriver and OrientationSink trait definitions

use crate::core::types::{BtAddress, ConnectionType, FrameHalf, SensorKind};
use crate::error::Result;

/// Device driver trait for a connected motion controller.
///
/// Implemented by the transport layer (USB HID, Bluetooth); this crate
/// only consumes it. Drivers own the raw report buffer; `poll` advances
/// it by one cycle and the getters read out of the current report.
pub trait ControllerDriver: Send {
    /// Read the next input report.
    ///
    /// Returns the report sequence count on success, 0 when no new
    /// report was available this cycle.
    fn poll(&mut self) -> Result<u32>;

    /// Button state bitmask from the current report
    fn buttons(&self) -> u32;

    /// Magnetometer reading from the current report, one per cycle
    fn magnetometer(&self) -> [i32; 3];

    /// Accelerometer or gyroscope reading for one of the two
    /// half-frames of the current report
    fn half_frame(&self, kind: SensorKind, half: FrameHalf) -> [i32; 3];

    /// Read the factory calibration blob from the device.
    ///
    /// Only meaningful over USB; drivers for other transports should
    /// return [`crate::error::Error::NotSupported`].
    fn calibration_blob(&mut self) -> Result<Vec<u8>>;

    /// Serial string as reported by the device
    fn serial(&self) -> Result<String>;

    /// Transport this controller is connected over
    fn connection_type(&self) -> ConnectionType;

    /// Bluetooth address of the controller (readable over USB)
    fn bt_address(&mut self) -> Result<BtAddress>;
}

/// Consumer of calibrated sensor data.
///
/// The orientation filter behind this trait maintains its own
/// quaternion, updated incrementally from each half-frame. The filter
/// itself lives outside this crate.
pub trait OrientationSink {
    /// Feed one half-frame of calibrated data: gyro in rad/s, accel as
    /// a unit-less gravity proxy, magnetometer raw.
    fn update(&mut self, gyro: [f32; 3], accel: [f32; 3], mag: [f32; 3]);

    /// Current orientation quaternion (w, x, y, z)
    fn quaternion(&self) -> [f32; 4];
}
