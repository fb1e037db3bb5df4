//! Controller session: startup population and per-cycle mapping
//!
//! Owns one driver and one calibration record for the lifetime of a
//! device connection. At open, the record is populated from disk and -
//! over USB - refreshed with a fresh factory read; afterwards
//! [`ControllerSession::process_cycle`] maps each polling cycle's raw
//! samples and feeds the downstream orientation filter.
//!
//! The session is exclusively owned by one caller; `process_cycle`
//! performs no I/O beyond the driver calls and sits on the sampling
//! hot path.

use crate::calibration::{mapper, store, CalibrationMethod, CalibrationRecord};
use crate::calibration::{CUSTOM_FIELDS, CUSTOM_POSITIONS};
use crate::config::Config;
use crate::core::driver::{ControllerDriver, OrientationSink};
use crate::core::types::{ConnectionType, FrameHalf, RawSample, SensorKind};
use crate::error::Result;
use log::{debug, info};

/// One controller's calibration session
pub struct ControllerSession {
    driver: Box<dyn ControllerDriver>,
    record: CalibrationRecord,
}

impl ControllerSession {
    /// Open a session for a connected controller.
    ///
    /// Derives the device identity, loads any stored calibration, and
    /// over USB attempts a fresh factory read. A device without a
    /// readable blob falls back to whatever the record already holds;
    /// a device that hands over a wrong-size blob is a fatal error.
    pub fn open(mut driver: Box<dyn ControllerDriver>, config: &Config) -> Result<Self> {
        let connection = driver.connection_type();
        let identity = match connection {
            ConnectionType::Usb => {
                // USB reports an empty serial; identify by address
                let address = driver.bt_address()?;
                store::derive_identity(connection, "", &address.to_string())
            }
            ConnectionType::Bluetooth => {
                let serial = driver.serial()?;
                store::derive_identity(connection, &serial, "")
            }
        };

        let mut record = CalibrationRecord::for_identity(&identity, &config.storage.data_dir);
        if record.load()? {
            info!("{}: calibration restored from disk", identity);
        }

        if connection == ConnectionType::Usb {
            match driver.calibration_blob() {
                Ok(data) => {
                    record.apply_usb_blob(&data)?;
                    info!("{}: factory calibration refreshed from device", identity);
                }
                Err(e) => debug!("{}: factory read unavailable: {}", identity, e),
            }
        }

        Ok(ControllerSession { driver, record })
    }

    /// Calibration record owned by this session
    pub fn record(&self) -> &CalibrationRecord {
        &self.record
    }

    /// Calibration method the mapper will apply
    pub fn method(&self) -> CalibrationMethod {
        self.record.flags().active_method()
    }

    /// Store a user-captured six-position calibration matrix
    pub fn set_custom(&mut self, positions: &[[f32; CUSTOM_FIELDS]; CUSTOM_POSITIONS]) {
        self.record.set_custom(positions);
    }

    /// Persist the session's calibration record
    pub fn save(&self) -> Result<bool> {
        self.record.save()
    }

    /// Process one polling cycle.
    ///
    /// Polls the driver; when a fresh report is available, maps both
    /// half-frames (nine channels each, magnetometer sampled once per
    /// cycle) and feeds the calibrated gyro/accel plus raw mag to the
    /// sink. Returns the report sequence count, 0 when no new report
    /// was available.
    ///
    /// Requires factory calibration or passthrough; a custom-only
    /// record cannot map nine-channel samples.
    pub fn process_cycle(&mut self, sink: &mut dyn OrientationSink) -> Result<u32> {
        let sequence = self.driver.poll()?;
        if sequence == 0 {
            return Ok(0);
        }

        let mag = self.driver.magnetometer();
        for half in [FrameHalf::First, FrameHalf::Second] {
            let accel = self.driver.half_frame(SensorKind::Accelerometer, half);
            let gyro = self.driver.half_frame(SensorKind::Gyroscope, half);
            let raw = RawSample::Full([
                accel[0], accel[1], accel[2], gyro[0], gyro[1], gyro[2], mag[0], mag[1],
                mag[2],
            ]);

            let (output, _method) = mapper::map(&self.record, &raw)?;
            let values = output.values();
            sink.update(
                [values[3], values[4], values[5]],
                [values[0], values[1], values[2]],
                [values[6], values[7], values[8]],
            );
        }

        Ok(sequence)
    }
}
