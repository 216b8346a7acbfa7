//! ROM image loading.
//!
//! A [`RomSet`] holds the image files found in a directory (or handed over
//! as byte slices in tests). A [`RomRegion`] describes where each file lands
//! in a board's ROM space, and may carry CRC32 values to check the images
//! against. Checks can be skipped for patched or home-built ROMs.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CRC-32
// ---------------------------------------------------------------------------

/// Reflected CRC-32 table, polynomial 0xEDB88320.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
            bit += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

/// CRC-32 of an image, as printed by `crc32` and zip tools.
pub fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(0xFFFF_FFFF, |crc: u32, &byte| {
        (crc >> 8) ^ CRC32_TABLE[((crc ^ byte as u32) & 0xFF) as usize]
    })
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing ROM image: {0}")]
    MissingFile(String),

    #[error("ROM image {file}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        file: String,
        expected: usize,
        actual: usize,
    },

    #[error("ROM image {file}: CRC32 expected 0x{expected:08X}, got 0x{actual:08X}")]
    ChecksumMismatch {
        file: String,
        expected: u32,
        actual: u32,
    },
}

// ---------------------------------------------------------------------------
// RomSet
// ---------------------------------------------------------------------------

/// ROM images keyed by file name.
#[derive(Clone, Debug, Default)]
pub struct RomSet {
    files: HashMap<String, Vec<u8>>,
}

impl RomSet {
    /// Read every regular file in `path` (not recursive).
    pub fn from_directory(path: &Path) -> Result<Self, RomLoadError> {
        let mut files = HashMap::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            let Some(name) = file_path.file_name() else {
                continue;
            };
            let data = std::fs::read(&file_path)?;
            debug!("ROM image {} ({} bytes)", file_path.display(), data.len());
            files.insert(name.to_string_lossy().into_owned(), data);
        }
        info!("Read {} ROM image(s) from {}", files.len(), path.display());
        Ok(Self { files })
    }

    /// Build a set from (file name, contents) pairs.
    pub fn from_slices(entries: &[(&str, &[u8])]) -> Self {
        let files = entries
            .iter()
            .map(|(name, data)| (name.to_string(), data.to_vec()))
            .collect();
        Self { files }
    }

    /// Build a set from owned (file name, contents) pairs, e.g. the members
    /// of an archive.
    pub fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            files: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn require(&self, name: &str) -> Result<&[u8], RomLoadError> {
        self.get(name)
            .ok_or_else(|| RomLoadError::MissingFile(name.to_string()))
    }

    /// Fetch an image and check its length.
    pub fn require_sized(&self, name: &str, expected: usize) -> Result<&[u8], RomLoadError> {
        let data = self.require(name)?;
        if data.len() != expected {
            return Err(RomLoadError::SizeMismatch {
                file: name.to_string(),
                expected,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// File names in the set, sorted.
    pub fn file_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.files.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ---------------------------------------------------------------------------
// RomEntry / RomRegion
// ---------------------------------------------------------------------------

/// One image and where it lands inside its region.
pub struct RomEntry {
    pub name: &'static str,
    pub size: usize,
    pub offset: usize,
    /// Expected CRC32, if the image is a known release.
    pub crc32: Option<u32>,
    /// Optional images leave their part of the region at the fill value
    /// when absent.
    pub required: bool,
}

/// A block of ROM space assembled from one or more images.
pub struct RomRegion {
    pub size: usize,
    /// Value read from parts of the region no image covers.
    pub fill: u8,
    pub entries: &'static [RomEntry],
}

impl RomRegion {
    /// Assemble the region, checking sizes and any known CRC32 values.
    pub fn load(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.assemble(rom_set, true)
    }

    /// Assemble the region, checking sizes only.
    pub fn load_unchecked(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.assemble(rom_set, false)
    }

    fn assemble(&self, rom_set: &RomSet, verify: bool) -> Result<Vec<u8>, RomLoadError> {
        let mut region = vec![self.fill; self.size];

        for entry in self.entries {
            debug_assert!(entry.offset + entry.size <= self.size, "{} overflows its region", entry.name);

            if !entry.required && rom_set.get(entry.name).is_none() {
                debug!("Optional ROM image {} not present", entry.name);
                continue;
            }
            let data = rom_set.require_sized(entry.name, entry.size)?;

            if verify && let Some(expected) = entry.crc32 {
                let actual = crc32(data);
                if actual != expected {
                    return Err(RomLoadError::ChecksumMismatch {
                        file: entry.name.to_string(),
                        expected,
                        actual,
                    });
                }
            }

            info!("Loaded ROM image {} at offset 0x{:04X}", entry.name, entry.offset);
            region[entry.offset..entry.offset + entry.size].copy_from_slice(data);
        }

        Ok(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TWO_SLOTS: RomRegion = RomRegion {
        size: 8,
        fill: 0xFF,
        entries: &[
            RomEntry { name: "lo.rom", size: 4, offset: 0, crc32: None, required: true },
            RomEntry { name: "hi.rom", size: 4, offset: 4, crc32: None, required: false },
        ],
    };

    static CHECKED: RomRegion = RomRegion {
        size: 4,
        fill: 0x00,
        entries: &[RomEntry {
            name: "sys.rom",
            size: 4,
            offset: 0,
            crc32: Some(0xDEAD_BEEF),
            required: true,
        }],
    };

    #[test]
    fn crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn required_sizes_enforced() {
        let set = RomSet::from_slices(&[("rom.bin", &[0u8; 10])]);
        assert!(set.require_sized("rom.bin", 10).is_ok());
        assert!(matches!(
            set.require_sized("rom.bin", 8),
            Err(RomLoadError::SizeMismatch { expected: 8, actual: 10, .. })
        ));
        assert!(matches!(set.require("other.bin"), Err(RomLoadError::MissingFile(_))));
    }

    #[test]
    fn file_names_sorted() {
        let set = RomSet::from_slices(&[("b.rom", &[]), ("a.rom", &[])]);
        assert_eq!(set.file_names(), vec!["a.rom", "b.rom"]);
    }

    #[test]
    fn optional_image_leaves_fill() {
        let set = RomSet::from_slices(&[("lo.rom", &[1, 2, 3, 4])]);
        assert_eq!(TWO_SLOTS.load(&set).unwrap(), vec![1, 2, 3, 4, 0xFF, 0xFF, 0xFF, 0xFF]);

        let set = RomSet::from_slices(&[("lo.rom", &[1, 2, 3, 4]), ("hi.rom", &[5, 6, 7, 8])]);
        assert_eq!(TWO_SLOTS.load(&set).unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn missing_required_image() {
        let set = RomSet::from_slices(&[("hi.rom", &[0; 4])]);
        assert!(matches!(TWO_SLOTS.load(&set), Err(RomLoadError::MissingFile(name)) if name == "lo.rom"));
    }

    #[test]
    fn wrong_size_optional_image_still_rejected() {
        let set = RomSet::from_slices(&[("lo.rom", &[0; 4]), ("hi.rom", &[0; 3])]);
        assert!(matches!(TWO_SLOTS.load(&set), Err(RomLoadError::SizeMismatch { .. })));
    }

    #[test]
    fn checksum_mismatch_and_bypass() {
        let set = RomSet::from_slices(&[("sys.rom", &[1, 2, 3, 4])]);
        assert!(matches!(CHECKED.load(&set), Err(RomLoadError::ChecksumMismatch { expected: 0xDEAD_BEEF, .. })));
        assert_eq!(CHECKED.load_unchecked(&set).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn from_directory_reads_files() {
        let dir = std::env::temp_dir().join(format!("mtx_rom_loader_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("os.rom"), [0xAA, 0xBB]).unwrap();

        let set = RomSet::from_directory(&dir).unwrap();
        assert_eq!(set.get("os.rom"), Some(&[0xAA, 0xBB][..]));
        assert_eq!(set.file_names(), vec!["os.rom"], "Directories are skipped");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
