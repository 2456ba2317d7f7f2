use std::fmt;

use rand::{seq::SliceRandom, Rng};

use crate::{
    clients::MovieLookup,
    matching::fuzzy_resolver::{self, MatchThresholds},
    model::{catalog::Catalog, movie::MovieRecord},
    persisters::{MovieStorage, StorageError},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub title: String,
    pub score: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("Movie '{query}' not found.{}", suggestion_hint(.suggestion))]
    NotFound {
        query: String,
        suggestion: Option<Suggestion>,
    },
    #[error("Could not fetch data for '{title}': {reason}")]
    LookupFailed { title: String, reason: String },
    #[error("Could not save movies: {0}")]
    Storage(#[from] StorageError),
    #[error("Please enter a movie title.")]
    EmptyQuery,
    #[error("No movies in the collection.")]
    EmptyCatalog,
    #[error("No ratings available for statistics.")]
    NoRatings,
    #[error("No movie with both a title and a rating is available.")]
    NoRandomCandidate,
}

fn suggestion_hint(suggestion: &Option<Suggestion>) -> String {
    match suggestion {
        Some(s) => format!(" Closest match: '{}' (Score: {})", s.title, s.score),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Added {
    pub movie: MovieRecord,
    pub replaced: bool,
}

impl fmt::Display for Added {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.replaced {
            write!(f, "Data for '{}' has been refreshed.", self.movie.title)
        } else {
            write!(f, "Data for '{}' has been added.", self.movie.title)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deleted {
    pub movie: MovieRecord,
    pub score: u8,
}

impl fmt::Display for Deleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deleted movie: {} (Score: {})", self.movie.title, self.score)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Updated {
    pub previous: MovieRecord,
    pub movie: MovieRecord,
    pub score: u8,
}

impl fmt::Display for Updated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updated movie data for '{}'.", self.movie.title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    pub movie: &'a MovieRecord,
    pub score: u8,
}

impl fmt::Display for SearchHit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Found (Score: {}):", self.score)?;
        write!(f, "{}", self.movie)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingStats<'a> {
    pub rated: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub best: &'a MovieRecord,
    pub worst: &'a MovieRecord,
}

impl fmt::Display for RatingStats<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rated movies: {}", self.rated)?;
        writeln!(f, "Average rating: {:.2}", self.mean)?;
        writeln!(f, "Median rating: {:.2}", self.median)?;
        writeln!(
            f,
            "Best rating: {} ({} ({}))",
            self.max, self.best.title, self.best.year
        )?;
        write!(
            f,
            "Worst rating: {} ({} ({}))",
            self.min, self.worst.title, self.worst.year
        )
    }
}

/// Owns the catalog and applies every change through storage.
///
/// Mutations build the next catalog on the side and only swap it in once it
/// has been persisted, so a failed save leaves both memory and disk as they
/// were.
pub struct CollectionService {
    catalog: Catalog,
    storage: Box<dyn MovieStorage>,
    lookup: Box<dyn MovieLookup>,
    thresholds: MatchThresholds,
}

impl CollectionService {
    pub fn new(
        catalog: Catalog,
        storage: Box<dyn MovieStorage>,
        lookup: Box<dyn MovieLookup>,
        thresholds: MatchThresholds,
    ) -> Self {
        CollectionService {
            catalog,
            storage,
            lookup,
            thresholds,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    pub async fn add(&mut self, title: &str) -> Result<Added, CollectionError> {
        let title = non_empty(title)?;
        let movie = self.fetch(title).await?;

        let mut next = self.catalog.clone();
        let replaced = next.upsert(movie.clone()).is_some();
        self.commit(next)?;

        log::info!("Stored '{}' (replaced: {})", movie.title, replaced);
        Ok(Added { movie, replaced })
    }

    pub fn delete(&mut self, title: &str) -> Result<Deleted, CollectionError> {
        let (key, score) = self.resolve_key(title, self.thresholds.destructive)?;

        let mut next = self.catalog.clone();
        let movie = next.remove(&key).ok_or_else(|| not_found(title, None))?;
        self.commit(next)?;

        log::info!("Deleted '{}' (score {})", movie.title, score);
        Ok(Deleted { movie, score })
    }

    pub async fn update(&mut self, title: &str) -> Result<Updated, CollectionError> {
        let (key, score) = self.resolve_key(title, self.thresholds.destructive)?;
        let previous = self
            .catalog
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(title, None))?;
        let movie = self.fetch(&previous.title).await?;

        let mut next = self.catalog.clone();
        if movie.key() != key {
            log::info!(
                "Title of '{}' changed to '{}', moving the entry",
                previous.title,
                movie.title
            );
            next.remove(&key);
        }
        next.upsert(movie.clone());
        self.commit(next)?;

        log::info!("Updated '{}' (score {})", movie.title, score);
        Ok(Updated {
            previous,
            movie,
            score,
        })
    }

    pub fn search(&self, title: &str) -> Result<SearchHit<'_>, CollectionError> {
        let (key, score) = self.resolve_key(title, self.thresholds.search)?;
        let movie = self
            .catalog
            .get(&key)
            .ok_or_else(|| not_found(title, None))?;
        Ok(SearchHit { movie, score })
    }

    /// Every movie in storage order.
    pub fn list(&self) -> Vec<&MovieRecord> {
        self.catalog.records().collect()
    }

    /// Movies by rating, highest first. Unrated movies count as zero and
    /// come after rated movies with the same value.
    pub fn sorted_by_rating(&self) -> Vec<&MovieRecord> {
        let mut movies = self.list();
        movies.sort_by(|a, b| {
            b.rating_or_floor()
                .total_cmp(&a.rating_or_floor())
                .then_with(|| a.rating.is_none().cmp(&b.rating.is_none()))
        });
        movies
    }

    pub fn stats(&self) -> Result<RatingStats<'_>, CollectionError> {
        if self.catalog.is_empty() {
            return Err(CollectionError::EmptyCatalog);
        }

        let rated: Vec<(&MovieRecord, f64)> = self
            .catalog
            .records()
            .filter_map(|movie| movie.rating.map(|rating| (movie, rating)))
            .collect();
        if rated.is_empty() {
            return Err(CollectionError::NoRatings);
        }

        let (best, max) = rated
            .iter()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(CollectionError::NoRatings)?;
        let (worst, min) = rated
            .iter()
            .copied()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(CollectionError::NoRatings)?;

        let mut values: Vec<f64> = rated.iter().map(|(_, rating)| *rating).collect();
        values.sort_by(f64::total_cmp);
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        Ok(RatingStats {
            rated: values.len(),
            mean,
            median: median(&values),
            min,
            max,
            best,
            worst,
        })
    }

    /// Uniform pick among movies that have both a title and a rating.
    pub fn random_record<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<&MovieRecord, CollectionError> {
        if self.catalog.is_empty() {
            return Err(CollectionError::EmptyCatalog);
        }
        let candidates: Vec<&MovieRecord> = self
            .catalog
            .records()
            .filter(|movie| !movie.title.trim().is_empty() && movie.rating.is_some())
            .collect();
        candidates
            .choose(rng)
            .copied()
            .ok_or(CollectionError::NoRandomCandidate)
    }

    async fn fetch(&self, title: &str) -> Result<MovieRecord, CollectionError> {
        self.lookup.lookup(title).await.map_err(|e| {
            log::warn!("Lookup for '{}' failed: {}", title, e);
            CollectionError::LookupFailed {
                title: title.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Exact key first, then the best fuzzy candidate if it clears `threshold`.
    fn resolve_key(&self, title: &str, threshold: u8) -> Result<(String, u8), CollectionError> {
        let title = non_empty(title)?;
        let key = MovieRecord::normalize_title(title);
        if self.catalog.contains_key(&key) {
            return Ok((key, 100));
        }

        match fuzzy_resolver::resolve(title, self.catalog.keys()) {
            Some(found) if found.clears(threshold) => {
                log::debug!(
                    "Resolved '{}' to '{}' (score {} >= {})",
                    title,
                    found.key,
                    found.score,
                    threshold
                );
                Ok((found.key.to_string(), found.score))
            }
            Some(found) => {
                let suggestion = self.catalog.get(found.key).map(|movie| Suggestion {
                    title: movie.title.clone(),
                    score: found.score,
                });
                Err(not_found(title, suggestion))
            }
            None => Err(not_found(title, None)),
        }
    }

    fn commit(&mut self, next: Catalog) -> Result<(), CollectionError> {
        self.storage.replace_all(&next).map_err(|e| {
            log::error!("Error when saving movies to {}: {}", self.storage.describe(), e);
            CollectionError::Storage(e)
        })?;
        self.catalog = next;
        Ok(())
    }
}

fn non_empty(title: &str) -> Result<&str, CollectionError> {
    let title = title.trim();
    if title.is_empty() {
        Err(CollectionError::EmptyQuery)
    } else {
        Ok(title)
    }
}

fn not_found(query: &str, suggestion: Option<Suggestion>) -> CollectionError {
    CollectionError::NotFound {
        query: query.to_string(),
        suggestion,
    }
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
