//! Client-side catalog filter
//!
//! Title matches case-insensitively by substring; year matches by substring.
//! Empty criteria match everything. Both criteria must hold.

use cinecrud_common::Movie;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieFilter {
    title: String,
    year: String,
}

impl MovieFilter {
    /// Build a filter; inputs are trimmed, the title is lowercased
    pub fn new(title: &str, year: &str) -> Self {
        Self {
            title: title.trim().to_lowercase(),
            year: year.trim().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.year.is_empty()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn matches(&self, movie: &Movie) -> bool {
        let matches_title = self.title.is_empty() || movie.title.to_lowercase().contains(&self.title);
        // A record without a year never matches a year criterion
        let matches_year = self.year.is_empty()
            || movie
                .year
                .as_deref()
                .map(|y| y.contains(&self.year))
                .unwrap_or(false);
        matches_title && matches_year
    }
}
