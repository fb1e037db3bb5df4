//! Flat-file persistence for calibration records
//!
//! File format, per device identity: three fixed-size binary sections
//! back-to-back, no header, no version tag, no checksum. The layout is
//! shared with records written by earlier tooling and must stay
//! byte-compatible:
//!
//! 1. custom matrix: 6 x 9 f32, little-endian, row-major (216 bytes)
//! 2. factory blob: 143 bytes
//! 3. flags: u32 little-endian (4 bytes)

use crate::calibration::blob::BLOB_SIZE;
use crate::calibration::{
    CalibrationRecord, MethodFlags, CUSTOM_FIELDS, CUSTOM_POSITIONS,
};
use crate::core::types::ConnectionType;
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Read, Write};

/// Custom matrix section size in bytes
pub const CUSTOM_SECTION_SIZE: usize = CUSTOM_POSITIONS * CUSTOM_FIELDS * 4;

/// Flags section size in bytes
pub const FLAGS_SECTION_SIZE: usize = 4;

/// Total record file size in bytes
pub const RECORD_SIZE: usize = CUSTOM_SECTION_SIZE + BLOB_SIZE + FLAGS_SECTION_SIZE;

/// Derive the storage identity for a device.
///
/// Over USB the serial string is empty, so the Bluetooth address is
/// used instead; any other transport reports a usable serial. Colons
/// in either source are replaced with underscores so the identity can
/// name a file.
pub fn derive_identity(connection: ConnectionType, serial: &str, bt_address: &str) -> String {
    let source = match connection {
        ConnectionType::Usb => bt_address,
        ConnectionType::Bluetooth => serial,
    };
    source.replace(':', "_")
}

fn read_section(file: &mut File, buf: &mut [u8], section: &'static str) -> Result<()> {
    file.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::TruncatedRecord { section }
        } else {
            Error::Io(e)
        }
    })
}

impl CalibrationRecord {
    /// Load this record from its file.
    ///
    /// Returns `Ok(false)` when the file does not exist - the expected
    /// state for a device that has never been calibrated; the record is
    /// left unchanged. A file that exists but ends before all three
    /// sections are read is a fatal [`Error::TruncatedRecord`].
    ///
    /// A full-size file with corrupted content is indistinguishable
    /// from a well-formed record; the format carries no checksum.
    pub fn load(&mut self) -> Result<bool> {
        let mut file = match File::open(self.path()) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("{}: no calibration file yet", self.identity());
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        // Read every section before touching the record, so a
        // truncated file cannot leave it half-updated.
        let mut matrix_bytes = [0u8; CUSTOM_SECTION_SIZE];
        read_section(&mut file, &mut matrix_bytes, "custom matrix")?;

        let mut blob_bytes = [0u8; BLOB_SIZE];
        read_section(&mut file, &mut blob_bytes, "usb blob")?;

        let mut flag_bytes = [0u8; FLAGS_SECTION_SIZE];
        read_section(&mut file, &mut flag_bytes, "flags")?;

        let mut matrix = [[0.0f32; CUSTOM_FIELDS]; CUSTOM_POSITIONS];
        for (i, row) in matrix.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                let at = (i * CUSTOM_FIELDS + j) * 4;
                *value = f32::from_le_bytes([
                    matrix_bytes[at],
                    matrix_bytes[at + 1],
                    matrix_bytes[at + 2],
                    matrix_bytes[at + 3],
                ]);
            }
        }

        self.custom = matrix;
        self.blob = blob_bytes;
        self.flags = MethodFlags::from_bits(u32::from_le_bytes(flag_bytes));

        log::info!(
            "{}: loaded calibration (flags {:x})",
            self.identity(),
            self.flags.bits()
        );
        Ok(true)
    }

    /// Save this record to its file.
    ///
    /// Creates the data directory if missing; returns `Ok(false)` when
    /// that creation fails (nothing is written). Write failures after
    /// the file is open are fatal. There is no atomic rename: a crash
    /// mid-write leaves a corrupt file.
    pub fn save(&self) -> Result<bool> {
        if let Some(parent) = self.path().parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    log::warn!(
                        "Failed to create calibration directory {}: {}",
                        parent.display(),
                        e
                    );
                    return Ok(false);
                }
            }
        }

        let mut file = File::create(self.path())?;

        let mut matrix_bytes = Vec::with_capacity(CUSTOM_SECTION_SIZE);
        for row in &self.custom {
            for value in row {
                matrix_bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        file.write_all(&matrix_bytes)?;
        file.write_all(&self.blob)?;
        file.write_all(&self.flags.bits().to_le_bytes())?;

        log::info!(
            "{}: saved calibration (flags {:x})",
            self.identity(),
            self.flags.bits()
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationMethod;

    #[test]
    fn test_derive_identity_usb_uses_bt_address() {
        let identity = derive_identity(ConnectionType::Usb, "", "00:1f:81:aa:0b:ff");
        assert_eq!(identity, "00_1f_81_aa_0b_ff");
    }

    #[test]
    fn test_derive_identity_bluetooth_uses_serial() {
        let identity =
            derive_identity(ConnectionType::Bluetooth, "00:1f:81:aa:0b:ff", "ignored");
        assert_eq!(identity, "00_1f_81_aa_0b_ff");
    }

    #[test]
    fn test_load_missing_file_is_soft() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = CalibrationRecord::for_identity("nope", dir.path());

        assert!(!record.load().unwrap());
        // Record untouched: no calibration sources available
        assert_eq!(record.flags().bits(), 0);
        assert!(!record.supports(CalibrationMethod::Usb));
        assert!(!record.supports(CalibrationMethod::Custom));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = CalibrationRecord::for_identity("dev", dir.path());

        let mut positions = [[0.0f32; CUSTOM_FIELDS]; CUSTOM_POSITIONS];
        for (i, row) in positions.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (i * CUSTOM_FIELDS + j) as f32 * 0.25 - 3.0;
            }
        }
        record.set_custom(&positions);

        let mut blob = [0u8; BLOB_SIZE];
        for (i, byte) in blob.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }
        record.apply_usb_blob(&blob).unwrap();

        assert!(record.save().unwrap());
        assert_eq!(
            fs::metadata(record.path()).unwrap().len(),
            RECORD_SIZE as u64
        );

        let mut reloaded = CalibrationRecord::for_identity("dev", dir.path());
        assert!(reloaded.load().unwrap());

        // Bit-identical round trip of all three sections
        assert_eq!(reloaded.custom_matrix(), record.custom_matrix());
        assert_eq!(reloaded.blob()[..], record.blob()[..]);
        assert_eq!(reloaded.flags(), record.flags());
    }

    #[test]
    fn test_load_truncated_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let record = CalibrationRecord::for_identity("dev", dir.path());

        // Custom matrix section present, blob section cut short
        let mut bytes = vec![0u8; CUSTOM_SECTION_SIZE + 10];
        bytes[0] = 0x3F;
        fs::write(record.path(), &bytes).unwrap();

        let mut reloading = CalibrationRecord::for_identity("dev", dir.path());
        let err = reloading.load().unwrap_err();
        match err {
            Error::TruncatedRecord { section } => assert_eq!(section, "usb blob"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_save_creates_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("state").join("calibration");
        let record = CalibrationRecord::for_identity("dev", &nested);

        assert!(record.save().unwrap());
        assert!(record.path().exists());
    }

    #[test]
    fn test_save_directory_failure_is_soft() {
        let dir = tempfile::tempdir().unwrap();

        // A file where the data directory should be makes creation fail
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"not a directory").unwrap();

        let record = CalibrationRecord::for_identity("dev", &blocker.join("sub"));
        assert!(!record.save().unwrap());
    }
}
