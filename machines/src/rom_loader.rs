//! ROM set assembly and validation.
//!
//! Mask-ROM contents reach a machine as opaque byte slices collected in a
//! [`RomSet`]; how they got there (embedded blobs, a host file loader) is
//! the host's business. A machine declares its chip layout as static
//! [`RomRegion`] tables and calls [`RomRegion::load`] to assemble each
//! memory region, validating file sizes and, where pinned, CRC-32
//! checksums.

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// CRC-32 (private)
// ---------------------------------------------------------------------------

/// CRC-32 lookup table (reflected polynomial 0xEDB88320), the same
/// algorithm MAME DAT files use.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when assembling a ROM region.
#[derive(Debug)]
pub enum RomLoadError {
    /// A required ROM image was not found in the set.
    MissingFile(String),

    /// ROM image size does not match the chip size.
    SizeMismatch {
        file: String,
        expected: usize,
        actual: usize,
    },

    /// CRC-32 checksum does not match the pinned value.
    ChecksumMismatch {
        file: String,
        expected: u32,
        actual: u32,
    },
}

impl std::fmt::Display for RomLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFile(name) => write!(f, "missing ROM image: {name}"),
            Self::SizeMismatch {
                file,
                expected,
                actual,
            } => write!(f, "ROM {file}: expected {expected} bytes, got {actual}"),
            Self::ChecksumMismatch {
                file,
                expected,
                actual,
            } => write!(
                f,
                "ROM {file}: CRC32 expected 0x{expected:08X}, got 0x{actual:08X}"
            ),
        }
    }
}

impl std::error::Error for RomLoadError {}

// ---------------------------------------------------------------------------
// RomSet
// ---------------------------------------------------------------------------

/// A collection of ROM images, keyed by chip/file name.
pub struct RomSet {
    files: HashMap<String, Vec<u8>>,
}

impl RomSet {
    /// Build a set from (name, data) pairs of borrowed slices.
    pub fn from_slices(entries: &[(&str, &[u8])]) -> Self {
        let mut files = HashMap::new();
        for (name, data) in entries {
            files.insert(name.to_string(), data.to_vec());
        }
        Self { files }
    }

    /// Build a set from already-owned (name, data) pairs.
    pub fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            files: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|v| v.as_slice())
    }

    pub fn require(&self, name: &str) -> Result<&[u8], RomLoadError> {
        self.get(name)
            .ok_or_else(|| RomLoadError::MissingFile(name.to_string()))
    }

    /// Get an image's data, validating its size against the chip size.
    pub fn require_sized(&self, name: &str, expected_size: usize) -> Result<&[u8], RomLoadError> {
        let data = self.require(name)?;
        if data.len() != expected_size {
            return Err(RomLoadError::SizeMismatch {
                file: name.to_string(),
                expected: expected_size,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.files.keys().map(|s| s.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// RomEntry / RomRegion
// ---------------------------------------------------------------------------

/// Describes how a single ROM chip maps into a memory region.
pub struct RomEntry {
    /// Image name in the ROM set.
    pub name: &'static str,
    /// Chip size in bytes.
    pub size: usize,
    /// Offset within the target memory region.
    pub offset: usize,
    /// Pinned CRC-32 checksum; `None` accepts any content of the right
    /// size, `Some` is validated during [`RomRegion::load`].
    pub crc32: Option<u32>,
}

/// The complete chip layout of one memory region.
pub struct RomRegion {
    /// Total size of the region in bytes.
    pub size: usize,
    pub entries: &'static [RomEntry],
}

impl RomRegion {
    /// Assemble the region, validating sizes and pinned checksums.
    pub fn load(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.load_inner(rom_set, true)
    }

    /// Assemble the region, validating sizes only. Useful for modified or
    /// development ROM images.
    pub fn load_skip_checksums(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.load_inner(rom_set, false)
    }

    fn load_inner(&self, rom_set: &RomSet, verify_checksums: bool) -> Result<Vec<u8>, RomLoadError> {
        let mut region = vec![0u8; self.size];

        for entry in self.entries {
            debug_assert!(
                entry.offset + entry.size <= self.size,
                "RomEntry '{}' exceeds region bounds",
                entry.name,
            );

            let data = rom_set.require_sized(entry.name, entry.size)?;

            if verify_checksums && let Some(expected) = entry.crc32 {
                let actual = crc32(data);
                if actual != expected {
                    return Err(RomLoadError::ChecksumMismatch {
                        file: entry.name.to_string(),
                        expected,
                        actual,
                    });
                }
            }

            region[entry.offset..entry.offset + entry.size].copy_from_slice(data);
        }

        Ok(region)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
