use std::{fs::File, io::BufReader, path::PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    model::{catalog::Catalog, movie::MovieRecord},
    persisters::{write_atomically, MovieStorage, StorageError},
};

/// Stores the catalog as one JSON object keyed by normalized title.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonStorage { path: path.into() }
    }
}

impl MovieStorage for JsonStorage {
    fn load(&self) -> Result<Catalog, StorageError> {
        let file = File::open(&self.path).map_err(|e| StorageError::io(&self.path, e))?;
        let entries: IndexMap<String, Value> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| StorageError::Json {
                path: self.path.clone(),
                source,
            })?;

        let mut movies = vec![];
        for (key, entry) in entries {
            let movie = match MovieRecord::deserialize(entry) {
                Ok(movie) => movie,
                Err(e) => {
                    log::warn!(
                        "Skipping entry '{}' in {}: {}",
                        key,
                        self.path.display(),
                        e
                    );
                    continue;
                }
            };
            if key != movie.key() {
                log::warn!(
                    "Entry '{}' in {} does not match its title '{}', re-keying it",
                    key,
                    self.path.display(),
                    movie.title
                );
            }
            movies.push(movie);
        }

        Ok(Catalog::from_records(movies))
    }

    fn replace_all(&self, catalog: &Catalog) -> Result<(), StorageError> {
        write_atomically(&self.path, |tmp| {
            serde_json::to_writer_pretty(&mut *tmp, catalog.as_map()).map_err(|source| {
                StorageError::Json {
                    path: self.path.clone(),
                    source,
                }
            })
        })?;
        log::debug!("Saved {} movies to {}", catalog.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
