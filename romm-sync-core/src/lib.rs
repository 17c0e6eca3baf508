//! Static device data for romm-sync: firmware layouts and BIOS tables.

pub mod bios;
pub mod error;
pub mod layout;

pub use bios::{BiosFile, BiosTables, CoreBiosRequirement, normalize_core_name};
pub use error::CoreError;
pub use layout::{DeviceLayout, FolderGrouping, LayoutParseError, parse_tag};
