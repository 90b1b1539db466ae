//! Patch catalog compiled into the binary.

use crate::config::loader::{load_from_str, ConfigError};
use crate::patch::PatchSpec;

/// Source of the built-in catalog.
pub const BUILTIN_CATALOG: &str = include_str!("../../patches/react-native-css-interop.toml");

/// PatchSpecs applied when no patch files are given.
pub fn builtin_specs() -> Result<Vec<PatchSpec>, ConfigError> {
    Ok(load_from_str(BUILTIN_CATALOG)?.specs())
}
