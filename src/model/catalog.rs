use indexmap::IndexMap;

use crate::model::movie::MovieRecord;

/// Movies keyed by their lower-cased title, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    movies: IndexMap<String, MovieRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Builds a catalog keyed by each record's own title. A later record with
    /// the same normalized title replaces an earlier one.
    pub fn from_records(records: impl IntoIterator<Item = MovieRecord>) -> Self {
        let mut catalog = Catalog::new();
        for record in records {
            if catalog.upsert(record.clone()).is_some() {
                log::warn!("Duplicate entry for '{}', keeping the last one", record.title);
            }
        }
        catalog
    }

    /// Inserts or replaces the record under its normalized key, returning the
    /// record it replaced.
    pub fn upsert(&mut self, record: MovieRecord) -> Option<MovieRecord> {
        self.movies.insert(record.key(), record)
    }

    pub fn remove(&mut self, key: &str) -> Option<MovieRecord> {
        self.movies.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&MovieRecord> {
        self.movies.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.movies.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.movies.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &MovieRecord> {
        self.movies.values()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn as_map(&self) -> &IndexMap<String, MovieRecord> {
        &self.movies
    }
}
