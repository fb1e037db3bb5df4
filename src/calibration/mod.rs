//! Calibration state for one controller
//!
//! A [`CalibrationRecord`] owns everything needed to map raw samples
//! for a single device: the user-captured custom matrix, the factory
//! blob read over USB, and the flag set recording which of the two is
//! populated. Identity and on-disk path are fixed at construction.
//!
//! Method availability resolves by a hard priority: factory (USB)
//! calibration wins over custom, custom wins over raw passthrough.

pub mod blob;
pub mod mapper;
pub mod store;

use crate::calibration::blob::BLOB_SIZE;
use crate::error::{Error, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Reference orientations captured during the custom procedure
pub const CUSTOM_POSITIONS: usize = 6;

/// Fields per reference orientation: ax,ay,az,gx,gy,gz,mx,my,mz
pub const CUSTOM_FIELDS: usize = 9;

/// File extension for stored records (binary content despite the name,
/// kept for compatibility with existing files)
pub const CALIBRATION_EXTENSION: &str = ".calibration.txt";

const FLAG_HAVE_CUSTOM: u32 = 1 << 0;
const FLAG_HAVE_USB: u32 = 1 << 1;

/// Calibration method applied to a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationMethod {
    /// Factory calibration read from the device over USB
    Usb,
    /// User-captured six-position calibration
    Custom,
    /// No calibration, raw values passed through
    None,
}

/// Which calibration sources are populated.
///
/// Stored on disk as a u32 bit-set; the bit assignment (custom = bit 0,
/// usb = bit 1) is part of the file format. Unknown bits round-trip
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodFlags(u32);

impl MethodFlags {
    /// Reconstruct from the stored bit-set
    pub fn from_bits(bits: u32) -> Self {
        MethodFlags(bits)
    }

    /// Raw bit-set as persisted
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn has_custom(self) -> bool {
        self.0 & FLAG_HAVE_CUSTOM != 0
    }

    pub fn has_usb(self) -> bool {
        self.0 & FLAG_HAVE_USB != 0
    }

    fn set_custom(&mut self) {
        self.0 |= FLAG_HAVE_CUSTOM;
    }

    fn set_usb(&mut self) {
        self.0 |= FLAG_HAVE_USB;
    }

    /// Resolve the method the mapper will apply: USB > Custom > None.
    ///
    /// Total over every flag combination, so the priority rule lives in
    /// exactly one place.
    pub fn active_method(self) -> CalibrationMethod {
        if self.has_usb() {
            CalibrationMethod::Usb
        } else if self.has_custom() {
            CalibrationMethod::Custom
        } else {
            CalibrationMethod::None
        }
    }
}

/// Calibration state for one controller session.
///
/// Created once per connected device; identity and path never change
/// afterwards. Exclusively owned by its session, no cross-device or
/// cross-thread sharing.
#[derive(Debug, Clone)]
pub struct CalibrationRecord {
    custom: [[f32; CUSTOM_FIELDS]; CUSTOM_POSITIONS],
    blob: [u8; BLOB_SIZE],
    flags: MethodFlags,
    identity: String,
    path: PathBuf,
}

impl CalibrationRecord {
    /// Create an empty record for a device identity.
    ///
    /// `identity` is the serial-derived string from
    /// [`store::derive_identity`]; the record file lives at
    /// `data_dir/<identity>.calibration.txt`.
    pub fn for_identity(identity: &str, data_dir: &Path) -> Self {
        let path = data_dir.join(format!("{}{}", identity, CALIBRATION_EXTENSION));
        CalibrationRecord {
            custom: [[0.0; CUSTOM_FIELDS]; CUSTOM_POSITIONS],
            blob: [0; BLOB_SIZE],
            flags: MethodFlags::default(),
            identity: identity.to_string(),
            path,
        }
    }

    /// Device identity this record belongs to
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// On-disk path of the record file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Populated calibration sources
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Factory calibration blob (meaningful only when HaveUSB is set)
    pub fn blob(&self) -> &[u8; BLOB_SIZE] {
        &self.blob
    }

    /// Custom calibration matrix (meaningful only when HaveCustom is set)
    pub fn custom_matrix(&self) -> &[[f32; CUSTOM_FIELDS]; CUSTOM_POSITIONS] {
        &self.custom
    }

    /// Store a freshly read factory calibration blob.
    ///
    /// The device must hand over the full fixed-size blob; anything
    /// else is rejected without touching the record.
    pub fn apply_usb_blob(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != BLOB_SIZE {
            return Err(Error::BlobSize {
                expected: BLOB_SIZE,
                actual: data.len(),
            });
        }
        self.blob.copy_from_slice(data);
        self.flags.set_usb();

        if log::log_enabled!(log::Level::Debug) {
            log::debug!("{}: factory blob applied", self.identity);
            for line in blob::hex_dump(&self.blob).lines() {
                log::debug!("  {}", line);
            }
        }
        Ok(())
    }

    /// Store a user-captured six-position calibration matrix.
    ///
    /// The 6x9 shape is enforced by the type; only the accelerometer
    /// columns (0-2) are consumed by the custom mapping method.
    pub fn set_custom(&mut self, positions: &[[f32; CUSTOM_FIELDS]; CUSTOM_POSITIONS]) {
        self.custom = *positions;
        self.flags.set_custom();
    }

    /// Whether a mapping method is currently available.
    ///
    /// Pure flag check; passthrough is always available.
    pub fn supports(&self, method: CalibrationMethod) -> bool {
        match method {
            CalibrationMethod::Usb => self.flags.has_usb(),
            CalibrationMethod::Custom => self.flags.has_custom(),
            CalibrationMethod::None => true,
        }
    }

    /// Human-readable summary of the record: path, flags, and whichever
    /// calibration tables are populated.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "File: {}", self.path.display());
        let _ = writeln!(out, "Flags: {:x}", self.flags.bits());

        if self.flags.has_usb() {
            let _ = writeln!(out, "Have USB calibration:");
            out.push_str(&blob::hex_dump(&self.blob));
            out.push_str(&blob::parse(&self.blob));
            out.push('\n');
        }

        if self.flags.has_custom() {
            let _ = writeln!(out, "Have custom calibration:");
            let _ = writeln!(
                out,
                "         ax         ay         az         mx         my         mz"
            );
            for (i, position) in self.custom.iter().enumerate() {
                let _ = write!(out, "#{}: ", i);
                for (j, value) in position.iter().enumerate() {
                    // Gyro columns are unused by the custom method
                    if !(3..6).contains(&j) {
                        let _ = write!(out, "{:10.2} ", value);
                    }
                }
                out.push('\n');
            }
        }

        out
    }
}
