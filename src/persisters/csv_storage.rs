use std::{fs::File, path::PathBuf};

use csv::{Reader, StringRecord, Writer};

use crate::{
    model::{catalog::Catalog, movie::MovieRecord},
    persisters::{write_atomically, MovieStorage, StorageError},
};

/// Stores the catalog as a CSV table, one movie per row.
#[derive(Debug, Clone)]
pub struct CsvStorage {
    path: PathBuf,
}

impl CsvStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvStorage { path: path.into() }
    }

    fn csv_error(&self, source: csv::Error) -> StorageError {
        StorageError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    /// Maps each known column to its position in the file header, so files
    /// written with a different column order still load.
    fn column_positions(&self, headers: &StringRecord) -> Result<Vec<Option<usize>>, StorageError> {
        let positions: Vec<Option<usize>> = MovieRecord::csv_titles()
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|header| header.trim().eq_ignore_ascii_case(name))
            })
            .collect();

        if positions[0].is_none() {
            return Err(StorageError::Malformed {
                path: self.path.clone(),
                reason: "missing 'title' column".to_string(),
            });
        }
        Ok(positions)
    }
}

impl MovieStorage for CsvStorage {
    fn load(&self) -> Result<Catalog, StorageError> {
        let file = File::open(&self.path).map_err(|e| StorageError::io(&self.path, e))?;
        let mut reader = Reader::from_reader(file);
        let headers = reader.headers().map_err(|e| self.csv_error(e))?.clone();
        let positions = self.column_positions(&headers)?;

        let mut movies = vec![];
        for row in reader.records() {
            let row = row.map_err(|e| self.csv_error(e))?;
            let ordered: StringRecord = positions
                .iter()
                .map(|pos| pos.and_then(|idx| row.get(idx)).unwrap_or_default())
                .collect();
            match MovieRecord::from_csv_record(&ordered) {
                Ok(movie) => movies.push(movie),
                Err(e) => log::warn!("Skipping row in {}: {}", self.path.display(), e),
            }
        }

        Ok(Catalog::from_records(movies))
    }

    fn replace_all(&self, catalog: &Catalog) -> Result<(), StorageError> {
        write_atomically(&self.path, |tmp| {
            let mut wrt = Writer::from_writer(&mut *tmp);
            wrt.write_record(MovieRecord::csv_titles())
                .map_err(|e| self.csv_error(e))?;
            for movie in catalog.records() {
                wrt.write_record(movie.to_csvable_array())
                    .map_err(|e| self.csv_error(e))?;
            }
            wrt.flush().map_err(|e| StorageError::io(&self.path, e))
        })?;
        log::debug!("Saved {} movies to {}", catalog.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
