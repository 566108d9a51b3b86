pub mod identity;
pub mod rows;

pub use identity::{option_collection_hash, platform_key};
pub use rows::{MachineRow, NamedRow, PlatformRow};
