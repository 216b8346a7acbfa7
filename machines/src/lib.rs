pub mod mtx;
pub mod registry;
pub mod rom_loader;
pub mod simplez80;

pub use mtx::{BoardConfig, MtxDevice, MtxSystem};
pub use rom_loader::{RomLoadError, RomSet};
pub use simplez80::SimpleZ80System;
