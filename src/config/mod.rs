pub mod builtin;
pub mod loader;
pub mod schema;

pub use builtin::{builtin_specs, BUILTIN_CATALOG};
pub use loader::{load_from_path, load_from_str, load_specs, patch_files_in, ConfigError};
pub use schema::{Metadata, PatchConfig, PatchDefinition, ValidationError, ValidationIssue};
