//! Record editor
//!
//! Validates and normalizes a single movie before it reaches the presenter.
//! Validation failures never leave the editor: the form is presented again
//! with per-field errors until it is valid or cancelled.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cinecrud_common::models::PosterUrls;
use cinecrud_common::time::current_year;
use cinecrud_common::{Error, Movie, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dialogs::{ConfirmRequest, FormSurface};

/// Earliest accepted release year
pub const MIN_YEAR: i32 = 1888;

pub const TITLE_MIN_LENGTH: usize = 2;
pub const OVERVIEW_MAX_LENGTH: usize = 2000;

/// Largest poster file accepted for inline upload
pub const MAX_POSTER_BYTES: usize = 2 * 1024 * 1024;

/// Remote image URL, optional query string
static IMAGE_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://.+\.(jpg|jpeg|png|webp|gif)(\?.*)?$").expect("valid regex")
});

/// Inline base64 image
static IMAGE_DATA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/(png|jpe?g|gif|webp);base64,[A-Za-z0-9+/]+=*$").expect("valid regex")
});

static YEAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit,
}

/// Raw form contents, as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovieForm {
    pub id: Option<i64>,
    pub title: String,
    pub year: String,
    pub poster: String,
    pub overview: String,
}

impl MovieForm {
    /// Pre-fill from an existing record (empty form without one)
    pub fn from_movie(item: Option<&Movie>) -> Self {
        let Some(item) = item else {
            return Self::default();
        };

        let poster = item
            .poster_urls
            .as_ref()
            .and_then(|urls| urls.w500.clone())
            .or_else(|| item.poster_path.clone())
            .unwrap_or_default();

        Self {
            id: item.id,
            title: item.title.trim().to_string(),
            year: item.year.clone().unwrap_or_default(),
            poster,
            overview: item.overview.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Title,
    Year,
    Poster,
    Overview,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Year => "year",
            Field::Poster => "poster",
            Field::Overview => "overview",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Required,
    MinLength { min: usize },
    MaxLength { max: usize },
    Pattern,
    YearOutOfRange { min: i32, max: i32 },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Required => write!(f, "is required"),
            FieldError::MinLength { min } => write!(f, "must be at least {} characters", min),
            FieldError::MaxLength { max } => write!(f, "must be at most {} characters", max),
            FieldError::Pattern => write!(f, "has an invalid format"),
            FieldError::YearOutOfRange { min, max } => {
                write!(f, "must be between {} and {}", min, max)
            }
        }
    }
}

/// Per-field validation errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, Vec<FieldError>>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn add(&mut self, field: Field, error: FieldError) {
        self.0.entry(field).or_default().push(error);
    }

    pub fn get(&self, field: Field) -> &[FieldError] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: Field) -> bool {
        !self.get(field).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.0
            .iter()
            .flat_map(|(field, errors)| errors.iter().map(move |e| (*field, e)))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.iter().map(|(field, e)| format!("{} {}", field, e)).collect();
        f.write_str(&messages.join("; "))
    }
}

/// True for a remote image URL or an inline base64 image
pub fn is_valid_poster(reference: &str) -> bool {
    IMAGE_URL_PATTERN.is_match(reference) || IMAGE_DATA_PATTERN.is_match(reference)
}

pub struct RecordEditor {
    mode: EditorMode,
    current_year: i32,
}

impl RecordEditor {
    pub fn new(mode: EditorMode) -> Self {
        Self::with_current_year(mode, current_year())
    }

    /// Editor with a fixed notion of "now" for the year range
    pub fn with_current_year(mode: EditorMode, current_year: i32) -> Self {
        Self { mode, current_year }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Latest accepted release year
    pub fn max_year(&self) -> i32 {
        self.current_year + 1
    }

    /// Validate and normalize a form into a record
    pub fn validate(&self, form: &MovieForm) -> std::result::Result<Movie, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = form.title.trim();
        if title.is_empty() {
            errors.add(Field::Title, FieldError::Required);
        } else if title.chars().count() < TITLE_MIN_LENGTH {
            errors.add(Field::Title, FieldError::MinLength { min: TITLE_MIN_LENGTH });
        }

        let year = form.year.trim();
        if year.is_empty() {
            errors.add(Field::Year, FieldError::Required);
        } else {
            match year.parse::<i32>() {
                Ok(value) if YEAR_PATTERN.is_match(year) => {
                    if value < MIN_YEAR || value > self.max_year() {
                        errors.add(
                            Field::Year,
                            FieldError::YearOutOfRange {
                                min: MIN_YEAR,
                                max: self.max_year(),
                            },
                        );
                    }
                }
                _ => errors.add(Field::Year, FieldError::Pattern),
            }
        }

        let poster = form.poster.trim();
        if poster.is_empty() {
            errors.add(Field::Poster, FieldError::Required);
        } else if !is_valid_poster(poster) {
            errors.add(Field::Poster, FieldError::Pattern);
        }

        if form.overview.chars().count() > OVERVIEW_MAX_LENGTH {
            errors.add(Field::Overview, FieldError::MaxLength { max: OVERVIEW_MAX_LENGTH });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let overview = form.overview.trim();
        Ok(Movie {
            id: match self.mode {
                EditorMode::Create => None,
                EditorMode::Edit => form.id,
            },
            title: title.to_string(),
            year: Some(year.to_string()),
            poster_path: None,
            poster_urls: Some(PosterUrls::single(poster)),
            overview: (!overview.is_empty()).then(|| overview.to_string()),
            original_language: None,
        })
    }

    /// Drive an editing session on `surface`
    ///
    /// Returns the normalized record, or `None` when cancelled. In edit mode a
    /// valid save must also be confirmed; declining returns to the form.
    pub async fn run<S>(&self, surface: &S, item: Option<&Movie>) -> Option<Movie>
    where
        S: FormSurface + ?Sized,
    {
        let mut form = MovieForm::from_movie(item);
        let mut errors = ValidationErrors::default();

        loop {
            let submitted = surface.fill(self.mode, form, &errors).await?;

            match self.validate(&submitted) {
                Ok(movie) => {
                    if self.mode == EditorMode::Edit
                        && !surface.confirm(ConfirmRequest::save_changes(&movie.title)).await
                    {
                        form = submitted;
                        errors = ValidationErrors::default();
                        continue;
                    }
                    return Some(movie);
                }
                Err(invalid) => {
                    tracing::debug!(errors = %invalid, "Form rejected");
                    form = submitted;
                    errors = invalid;
                }
            }
        }
    }
}

/// Read an image file and encode it as an inline `data:` poster reference
pub fn poster_from_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    if bytes.len() > MAX_POSTER_BYTES {
        return Err(Error::InvalidInput(format!(
            "Poster file {} is {} bytes (limit {})",
            path.display(),
            bytes.len(),
            MAX_POSTER_BYTES
        )));
    }

    let mime = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| matches!(*mime, "image/png" | "image/jpeg" | "image/gif" | "image/webp"))
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "{} is not a PNG, JPEG, GIF or WebP image",
                path.display()
            ))
        })?;

    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(&bytes)))
}
