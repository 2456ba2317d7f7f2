use std::{
    fmt, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use tempfile::NamedTempFile;

use crate::model::catalog::Catalog;

pub mod csv_storage;
pub mod json_storage;

use csv_storage::CsvStorage;
use json_storage::JsonStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} is not a movie file: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("Could not replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_missing_file(&self) -> bool {
        matches!(self, StorageError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Durable home of the catalog. Every save rewrites the whole file.
pub trait MovieStorage {
    fn load(&self) -> Result<Catalog, StorageError>;

    fn replace_all(&self, catalog: &Catalog) -> Result<(), StorageError>;

    fn describe(&self) -> String;
}

/// Loads the catalog, degrading to an empty one when the file is missing or
/// unreadable.
pub fn load_or_empty(storage: &dyn MovieStorage) -> Catalog {
    match storage.load() {
        Ok(catalog) => {
            log::info!(
                "Loaded {} movies from {}",
                catalog.len(),
                storage.describe()
            );
            catalog
        }
        Err(e) if e.is_missing_file() => {
            log::warn!(
                "Movies file {} not found, starting with an empty collection",
                storage.describe()
            );
            Catalog::new()
        }
        Err(e) => {
            log::warn!("Error loading movies: {}. Starting with an empty collection", e);
            Catalog::new()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Json,
    Csv,
}

impl StorageKind {
    pub fn default_file_name(&self) -> &'static str {
        match self {
            StorageKind::Json => "data.json",
            StorageKind::Csv => "movies.csv",
        }
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(StorageKind::Json),
            "csv" => Ok(StorageKind::Csv),
            other => Err(format!("Unsupported storage type: {}", other)),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Json => write!(f, "json"),
            StorageKind::Csv => write!(f, "csv"),
        }
    }
}

pub fn open_storage(kind: StorageKind, path: impl Into<PathBuf>) -> Box<dyn MovieStorage> {
    match kind {
        StorageKind::Json => Box::new(JsonStorage::new(path)),
        StorageKind::Csv => Box::new(CsvStorage::new(path)),
    }
}

/// Writes through a temporary file next to `path` and renames it into place,
/// so readers see either the old content or the new one.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<(), StorageError>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), StorageError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(path, e))?;
    write(&mut tmp)?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StorageError::io(path, e))?;
    tmp.persist(path).map_err(|e| StorageError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
