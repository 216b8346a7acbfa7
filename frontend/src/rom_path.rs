//! ROM path resolution: a ZIP archive, a ROM directory holding
//! `{rom_name}.zip` or a `{rom_name}/` subdirectory, or a directory of loose
//! images.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;
use mtx_machines::rom_loader::{RomLoadError, RomSet};

/// Resolution order:
/// 1. `path` ends in `.zip`: read the archive.
/// 2. `path` is a directory containing `{rom_name}.zip`: read that.
/// 3. `path` is a directory containing `{rom_name}/`: read its files.
/// 4. `path` is a directory: read its files.
pub fn load_rom_set(rom_name: &str, path: &Path) -> Result<RomSet, RomLoadError> {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
    {
        return load_from_zip(path);
    }

    if path.is_dir() {
        let zip_path = path.join(format!("{rom_name}.zip"));
        if zip_path.is_file() {
            return load_from_zip(&zip_path);
        }
        let sub_dir = path.join(rom_name);
        if sub_dir.is_dir() {
            return RomSet::from_directory(&sub_dir);
        }
        return RomSet::from_directory(path);
    }

    Err(RomLoadError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("ROM path not found: {}", path.display()),
    )))
}

fn zip_error(e: zip::result::ZipError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, format!("invalid ZIP: {e}"))
}

fn load_from_zip(path: &Path) -> Result<RomSet, RomLoadError> {
    let mut archive = zip::ZipArchive::new(BufReader::new(File::open(path)?)).map_err(zip_error)?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_error)?;
        if entry.is_dir() {
            continue;
        }
        // Archives sometimes wrap the images in a folder
        let name = entry
            .name()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        entries.push((name, data));
    }

    info!("Read {} ROM image(s) from {}", entries.len(), path.display());
    Ok(RomSet::from_entries(entries))
}
