//! Raw-to-physical sample mapping
//!
//! Selects a calibration method by the fixed priority (USB > Custom >
//! None) and applies the per-method linear math. Pure computation on
//! the record and the input sample, called once per half-frame on the
//! sampling hot path; no I/O, no blocking.

use crate::calibration::blob;
use crate::calibration::{CalibrationMethod, CalibrationRecord};
use crate::core::types::{CalibratedSample, RawSample};
use crate::error::{Error, Result};
use std::f32::consts::PI;

/// Gyroscope scale factor: rad/s corresponding to the 80 rev/min rate
/// the factory reference readings were recorded at.
///
/// 80 rpm = 80 * 2*pi / 60 s = ~8.3776 rad/s.
pub const RPM80_RAD_PER_SEC: f32 = 2.0 * PI * 80.0 / 60.0;

/// Reference-orientation rows of the custom matrix holding each axis
/// extreme, as (positive row, negative row) for axes x, y, z.
///
/// The row assignment is fixed by the six-position capture order.
const CUSTOM_AXIS_ROWS: [(usize, usize); 3] = [(4, 5), (0, 1), (2, 3)];

/// Map a raw sample to physical units.
///
/// Returns the calibrated sample together with the method that was
/// applied. Method selection is a total match on the record's flag
/// set: whenever factory calibration is present it is used, regardless
/// of any custom matrix.
///
/// The custom method only supports accelerometer-only samples; handing
/// it a 6- or 9-channel sample is a caller contract violation reported
/// as [`Error::NotSupported`].
pub fn map(
    record: &CalibrationRecord,
    input: &RawSample,
) -> Result<(CalibratedSample, CalibrationMethod)> {
    match record.flags().active_method() {
        CalibrationMethod::Usb => Ok((map_usb(record, input), CalibrationMethod::Usb)),
        CalibrationMethod::Custom => {
            let output = map_custom(record, input)?;
            Ok((output, CalibrationMethod::Custom))
        }
        CalibrationMethod::None => Ok((passthrough(input), CalibrationMethod::None)),
    }
}

/// Factory calibration: accel onto [-1, 1] from the per-axis raw
/// bounds, gyro through the 80 rpm reference, mag passed through.
fn map_usb(record: &CalibrationRecord, input: &RawSample) -> CalibratedSample {
    let data = record.blob();

    let mut accel = [0.0f32; 3];
    for (axis, out) in accel.iter_mut().enumerate() {
        let (min, max) = blob::accel_bounds(data, axis);
        let raw = input.values()[axis];
        // min maps to -1, max maps to +1
        *out = -1.0 + (raw - min as i32) as f32 / (max as i32 - min as i32) as f32 * 2.0;
    }

    match input {
        RawSample::Accel(_) => CalibratedSample::Accel(accel),
        RawSample::AccelGyro(v) => {
            let gyro = map_gyro(data, &v[3..6]);
            CalibratedSample::AccelGyro([
                accel[0], accel[1], accel[2], gyro[0], gyro[1], gyro[2],
            ])
        }
        RawSample::Full(v) => {
            let gyro = map_gyro(data, &v[3..6]);
            // Magnetometer values are reported as-is for now
            CalibratedSample::Full([
                accel[0], accel[1], accel[2], gyro[0], gyro[1], gyro[2], v[6] as f32,
                v[7] as f32, v[8] as f32,
            ])
        }
    }
}

fn map_gyro(data: &[u8; blob::BLOB_SIZE], raw: &[i32]) -> [f32; 3] {
    let mut gyro = [0.0f32; 3];
    for (axis, out) in gyro.iter_mut().enumerate() {
        let reference = blob::gyro_rpm80(data, axis);
        *out = raw[axis] as f32 / reference as f32 * RPM80_RAD_PER_SEC;
    }
    gyro
}

/// Custom calibration: accelerometer only, scaled by the spread between
/// the positive and negative reference rows of each axis.
fn map_custom(record: &CalibrationRecord, input: &RawSample) -> Result<CalibratedSample> {
    let raw = match input {
        RawSample::Accel(v) => v,
        _ => {
            return Err(Error::NotSupported(format!(
                "custom calibration maps accelerometer-only samples, got {} channels",
                input.channels()
            )))
        }
    };

    let matrix = record.custom_matrix();
    let mut accel = [0.0f32; 3];
    for (axis, out) in accel.iter_mut().enumerate() {
        let (pos, neg) = CUSTOM_AXIS_ROWS[axis];
        *out = raw[axis] as f32 / (matrix[pos][axis] - matrix[neg][axis]) * 2.0;
    }
    Ok(CalibratedSample::Accel(accel))
}

/// No calibration: raw values copied, cast to float
fn passthrough(input: &RawSample) -> CalibratedSample {
    match input {
        RawSample::Accel(v) => CalibratedSample::Accel(v.map(|x| x as f32)),
        RawSample::AccelGyro(v) => CalibratedSample::AccelGyro(v.map(|x| x as f32)),
        RawSample::Full(v) => CalibratedSample::Full(v.map(|x| x as f32)),
    }
}
