//! Fuzzy lookup of catalog keys from user-typed titles.
//!
//! Scores follow a "partial ratio": the shorter string is aligned against
//! every same-length window of the longer one and the best window wins, so
//! abbreviations and substrings score high while typos still degrade
//! gracefully. Titles are also compared with their words sorted, so
//! reordered words ("matrix the") still find their movie.

use strsim::normalized_levenshtein;

pub const DEFAULT_DESTRUCTIVE_THRESHOLD: u8 = 50;
pub const DEFAULT_SEARCH_THRESHOLD: u8 = 80;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThresholdError {
    #[error("Thresholds must be between 0 and 100, got destructive={destructive} search={search}")]
    OutOfRange { destructive: u8, search: u8 },
    #[error(
        "Search threshold ({search}) must not be lower than the delete/update threshold ({destructive})"
    )]
    SearchLooserThanDestructive { destructive: u8, search: u8 },
}

/// Minimum scores a fuzzy match needs before an operation acts on it.
///
/// `destructive` guards delete and update, `search` guards read-only lookups.
/// Search is never looser than the destructive floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchThresholds {
    pub destructive: u8,
    pub search: u8,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        MatchThresholds {
            destructive: DEFAULT_DESTRUCTIVE_THRESHOLD,
            search: DEFAULT_SEARCH_THRESHOLD,
        }
    }
}

impl MatchThresholds {
    pub fn new(destructive: u8, search: u8) -> Result<Self, ThresholdError> {
        if destructive > 100 || search > 100 {
            return Err(ThresholdError::OutOfRange {
                destructive,
                search,
            });
        }
        if search < destructive {
            return Err(ThresholdError::SearchLooserThanDestructive {
                destructive,
                search,
            });
        }
        Ok(MatchThresholds {
            destructive,
            search,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyMatch<'a> {
    pub key: &'a str,
    pub score: u8,
}

impl FuzzyMatch<'_> {
    pub fn clears(&self, threshold: u8) -> bool {
        self.score >= threshold
    }
}

/// Similarity of the best-aligned substring, from 0 to 100.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let needle: String = shorter.iter().collect();

    let mut best = 0.0_f64;
    for window in longer.windows(shorter.len()) {
        let window: String = window.iter().collect();
        let similarity = normalized_levenshtein(&needle, &window);
        if similarity > best {
            best = similarity;
            if best >= 1.0 {
                break;
            }
        }
    }

    (best * 100.0).round() as u8
}

fn sorted_words(s: &str) -> String {
    let mut words: Vec<&str> = s.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

/// Best of the plain partial ratio and the partial ratio of both titles
/// with their words sorted.
pub fn title_similarity(a: &str, b: &str) -> u8 {
    partial_ratio(a, b).max(partial_ratio(&sorted_words(a), &sorted_words(b)))
}

/// Picks the candidate key closest to `query`.
///
/// The query is lower-cased before scoring; candidates are expected to be
/// normalized keys already. Ties keep the earliest candidate. Returns `None`
/// only when there are no candidates.
pub fn resolve<'a, I>(query: &str, candidates: I) -> Option<FuzzyMatch<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = query.trim().to_lowercase();
    let mut best: Option<FuzzyMatch<'a>> = None;

    for key in candidates {
        let score = title_similarity(&query, key);
        log::debug!("Fuzzy score for '{}' against '{}': {}", query, key, score);
        if best.map_or(true, |current| score > current.score) {
            best = Some(FuzzyMatch { key, score });
        }
    }

    best
}
