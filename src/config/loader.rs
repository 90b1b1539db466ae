use crate::config::schema::{PatchConfig, ValidationError, ValidationIssue};
use crate::patch::PatchSpec;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    NoPatchFiles {
        dir: PathBuf,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read patch file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Walk { path, source } => {
                write!(f, "failed to list {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse patch file TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse patch file TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid patch file ({}): {}", path.display(), source),
                None => write!(f, "invalid patch file: {}", source),
            },
            ConfigError::NoPatchFiles { dir } => {
                write!(f, "no .toml patch files found in {}", dir.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Walk { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::NoPatchFiles { .. } => None,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<PatchConfig, ConfigError> {
    let config: PatchConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Every `*.toml` directly inside `dir`, sorted by name.
pub fn patch_files_in(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| ConfigError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(ConfigError::NoPatchFiles {
            dir: dir.to_path_buf(),
        });
    }
    Ok(files)
}

/// Load PatchSpecs from files and directories, preserving the given order.
///
/// Ids must be unique across everything loaded.
pub fn load_specs(paths: &[PathBuf]) -> Result<Vec<PatchSpec>, ConfigError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(patch_files_in(path)?);
        } else {
            files.push(path.clone());
        }
    }

    let mut specs = Vec::new();
    let mut seen = HashSet::new();
    for file in &files {
        for spec in load_from_path(file)?.specs() {
            if !seen.insert(spec.id.clone()) {
                return Err(ConfigError::Validation {
                    path: Some(file.clone()),
                    source: ValidationError {
                        issues: vec![ValidationIssue::DuplicateId(spec.id)],
                    },
                });
            }
            specs.push(spec);
        }
    }
    Ok(specs)
}
