pub mod metadata;
pub mod registry;

pub use metadata::{file_name_from_url, GameFile, VersionMetadata};
pub use registry::VersionRegistry;
