//! Errors that abort a generator run.
//!
//! Per-artifact read failures are not errors: the embedder logs them and
//! leaves the symbol out.

use std::path::{Path, PathBuf};

use catalog::CatalogError;

#[derive(Debug)]
pub enum GeneratorError {
    /// Invalid flag combination or config file contents.
    Config(String),
    /// The shader template directory does not exist.
    InputDirMissing(PathBuf),
    /// The compiled artifact directory does not exist.
    OutputDirMissing(PathBuf),
    Catalog(CatalogError),
    /// A lookup table references a name the catalog never produced.
    UnknownTableEntry { table: String, entry: String },
    Io { path: PathBuf, source: std::io::Error },
    Manifest(serde_json::Error),
}

impl GeneratorError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        GeneratorError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl std::fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorError::Config(msg) => write!(f, "{}", msg),
            GeneratorError::InputDirMissing(dir) => {
                write!(f, "Input directory does not exist: {}", dir.display())
            }
            GeneratorError::OutputDirMissing(dir) => {
                write!(f, "Output directory does not exist: {}", dir.display())
            }
            GeneratorError::Catalog(e) => write!(f, "{}", e),
            GeneratorError::UnknownTableEntry { table, entry } => {
                write!(f, "lookup table '{}' references unknown shader '{}'", table, entry)
            }
            GeneratorError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            GeneratorError::Manifest(e) => write!(f, "failed to serialize catalog manifest: {}", e),
        }
    }
}

impl std::error::Error for GeneratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeneratorError::Catalog(e) => Some(e),
            GeneratorError::Io { source, .. } => Some(source),
            GeneratorError::Manifest(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CatalogError> for GeneratorError {
    fn from(e: CatalogError) -> Self {
        GeneratorError::Catalog(e)
    }
}

impl From<serde_json::Error> for GeneratorError {
    fn from(e: serde_json::Error) -> Self {
        GeneratorError::Manifest(e)
    }
}
