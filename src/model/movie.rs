use std::fmt;

use serde::{de::IgnoredAny, Deserialize, Deserializer, Serialize};

/// Placeholder the metadata service uses for fields it has no value for.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(alias = "Title", deserialize_with = "trimmed_text")]
    pub title: String,
    #[serde(alias = "Year", default, deserialize_with = "lenient_text")]
    pub year: String,
    #[serde(alias = "Rating", default, deserialize_with = "lenient_rating")]
    pub rating: Option<f64>,
    #[serde(alias = "Actors", default = "not_available")]
    pub actors: String,
    #[serde(alias = "Poster", default, deserialize_with = "lenient_poster")]
    pub poster: Option<String>,
}

impl MovieRecord {
    pub fn new(
        title: impl Into<String>,
        year: impl Into<String>,
        rating: Option<f64>,
        actors: impl Into<String>,
        poster: Option<String>,
    ) -> Self {
        MovieRecord {
            title: title.into().trim().to_string(),
            year: year.into(),
            rating,
            actors: actors.into(),
            poster: poster.and_then(|p| normalize_poster(&p)),
        }
    }

    /// Catalog key for a title: records are unique case-insensitively.
    pub fn normalize_title(title: &str) -> String {
        title.to_lowercase()
    }

    pub fn key(&self) -> String {
        MovieRecord::normalize_title(&self.title)
    }

    /// Rating used for ordering, where a missing rating counts as zero.
    pub fn rating_or_floor(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    /// One-line form: `Title (Year): 8.8 rating`.
    pub fn headline(&self) -> String {
        let rating = self
            .rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        format!("{} ({}): {} rating", self.title, self.year, rating)
    }

    pub fn to_csvable_array(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.year.clone(),
            self.rating.map(|r| r.to_string()).unwrap_or_default(),
            self.actors.clone(),
            self.poster.clone().unwrap_or_default(),
        ]
    }

    pub fn csv_titles() -> Vec<&'static str> {
        vec!["title", "year", "rating", "actors", "poster"]
    }

    pub fn from_csv_record(record: &csv::StringRecord) -> Result<MovieRecord, String> {
        let title = match record.get(0) {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => return Err(format!("Row without a title: {:?}", record)),
        };
        let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();

        Ok(MovieRecord {
            title,
            year: field(1),
            rating: parse_rating(&field(2)),
            actors: field(3),
            poster: normalize_poster(&field(4)),
        })
    }
}

impl fmt::Display for MovieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.headline())?;
        writeln!(f, "  Actors: {}", self.actors)?;
        write!(
            f,
            "  Poster: {}",
            self.poster.as_deref().unwrap_or(NOT_AVAILABLE)
        )
    }
}

/// Parses a rating cell, treating placeholders and garbage as absent.
pub fn parse_rating(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            log::debug!("Ignoring non-numeric rating {:?}", raw);
            None
        }
    }
}

fn normalize_poster(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

fn trimmed_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(Scalar::Int(n)) => n.to_string(),
        Some(Scalar::Float(n)) => n.to_string(),
        Some(Scalar::Text(s)) => s,
        Some(Scalar::Other(_)) => String::new(),
    })
}

fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => None,
        Some(Scalar::Int(n)) => Some(n as f64),
        Some(Scalar::Float(n)) => Some(n),
        Some(Scalar::Text(s)) => parse_rating(&s),
        Some(Scalar::Other(_)) => {
            log::debug!("Ignoring rating that is neither a number nor text");
            None
        }
    })
}

fn lenient_poster<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(|p| normalize_poster(&p)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_numeric_string_and_placeholder_ratings() {
        let json = r#"[
            {"title": "Inception", "year": "2010", "rating": 8.8, "actors": "Leonardo DiCaprio", "poster": null},
            {"title": "Interstellar", "year": 2014, "rating": "8.6", "actors": "Matthew McConaughey"},
            {"title": "Tenet", "year": "2020", "rating": "N/A", "poster": "N/A"}
        ]"#;

        let movies: Vec<MovieRecord> = serde_json::from_str(json).unwrap();

        assert_eq!(movies[0].rating, Some(8.8));
        assert_eq!(movies[1].rating, Some(8.6));
        assert_eq!(movies[1].year, "2014");
        assert_eq!(movies[1].poster, None);
        assert_eq!(movies[2].rating, None);
        assert_eq!(movies[2].poster, None);
        assert_eq!(movies[2].actors, NOT_AVAILABLE);
    }

    #[test]
    fn accepts_capitalised_field_names() {
        let json = r#"{"Title": "Inception", "Year": 2010, "Rating": 8.8, "Actors": "Leonardo DiCaprio", "Poster": "inception.jpg"}"#;

        let movie: MovieRecord = serde_json::from_str(json).unwrap();

        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.year, "2010");
        assert_eq!(movie.poster.as_deref(), Some("inception.jpg"));
    }

    #[test]
    fn unexpected_rating_values_become_absent() {
        for raw in ["true", "[8]", "{}"] {
            let json = format!(r#"{{"title": "Heat", "year": "1995", "rating": {}}}"#, raw);

            let movie: MovieRecord = serde_json::from_str(&json).unwrap();

            assert_eq!(movie.rating, None, "rating {}", raw);
        }
    }

    #[test]
    fn padded_titles_are_trimmed_so_key_matches_title() {
        let built = MovieRecord::new(" Heat ", "1995", None, "Al Pacino", None);
        let loaded: MovieRecord = serde_json::from_str(r#"{"title": "  Heat"}"#).unwrap();
        let record = csv::StringRecord::from(vec![" Heat", "1995", "", "", ""]);
        let from_csv = MovieRecord::from_csv_record(&record).unwrap();

        for movie in [built, loaded, from_csv] {
            assert_eq!(movie.title, "Heat");
            assert_eq!(movie.key(), movie.title.to_lowercase());
        }
    }

    #[test]
    fn key_is_lowercased_title() {
        let movie = MovieRecord::new("The Matrix", "1999", Some(8.7), "Keanu Reeves", None);
        assert_eq!(movie.key(), "the matrix");
    }

    #[test]
    fn csv_row_keeps_absent_fields_absent() {
        let movie = MovieRecord::new("Tenet", "2020", None, "John David Washington", None);
        let record = csv::StringRecord::from(movie.to_csvable_array());

        let parsed = MovieRecord::from_csv_record(&record).unwrap();

        assert_eq!(parsed, movie);
    }

    #[test]
    fn csv_row_without_title_is_rejected() {
        let record = csv::StringRecord::from(vec!["", "2020", "7.0", "", ""]);
        assert!(MovieRecord::from_csv_record(&record).is_err());
    }

    #[test]
    fn display_uses_placeholder_for_missing_values() {
        let movie = MovieRecord::new("Tenet", "2020", None, "John David Washington", None);
        assert_eq!(
            movie.to_string(),
            "Tenet (2020): N/A rating\n  Actors: John David Washington\n  Poster: N/A"
        );
    }
}
