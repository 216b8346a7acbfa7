//! Machine registry for front-end discovery.
//!
//! Each board registers itself with [`inventory::submit!`], giving the name
//! the front-end selects it by, the ROM directory it expects and a factory.
//! There is no central list to keep up to date.

use mtx_core::core::Machine;

use crate::mtx::BoardConfig;
use crate::rom_loader::{RomLoadError, RomSet};

pub type CreateFn = fn(&RomSet, &BoardConfig) -> Result<Box<dyn Machine>, RomLoadError>;

pub struct MachineEntry {
    /// Name used on the command line (e.g. "mtx512").
    pub name: &'static str,
    /// Subdirectory of the ROM directory holding this machine's images.
    pub rom_name: &'static str,
    /// RAM pages fitted as standard; the board configuration may override.
    pub ram_pages: usize,
    pub create: CreateFn,
}

impl MachineEntry {
    pub const fn new(
        name: &'static str,
        rom_name: &'static str,
        ram_pages: usize,
        create: CreateFn,
    ) -> Self {
        Self {
            name,
            rom_name,
            ram_pages,
            create,
        }
    }
}

inventory::collect!(MachineEntry);

/// Every registered machine, sorted by name.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name == name)
}
