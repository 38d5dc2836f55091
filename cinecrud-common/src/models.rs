//! Catalog record model
//!
//! A [`Movie`] is the record kept in both the init and work sets of a
//! collection. Optional fields that are absent are omitted from the stored JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shallow patch merged over a stored record
///
/// Keys overwrite the record's fields. A `null` value clears the field.
pub type Patch = Map<String, Value>;

/// A record that can live in a snapshot collection
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Identity, if one has been assigned
    fn id(&self) -> Option<i64>;

    /// Assign identity (used by the store on creation)
    fn set_id(&mut self, id: i64);
}

/// Poster references by image size tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w342: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w500: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w780: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

impl PosterUrls {
    /// Poster reference set by the editor (remote URL or inline data URL)
    pub fn single(reference: impl Into<String>) -> Self {
        Self {
            w500: Some(reference.into()),
            ..Default::default()
        }
    }

    /// Best available reference for display, preferring the medium tier
    pub fn preferred(&self) -> Option<&str> {
        self.w500
            .as_deref()
            .or(self.w342.as_deref())
            .or(self.w780.as_deref())
            .or(self.original.as_deref())
    }
}

/// A movie in the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    /// Numeric identity; assigned by the store when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub title: String,

    /// Four-digit release year as a string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    /// Path fragment as delivered by the metadata service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,

    #[serde(rename = "posterUrls", skip_serializing_if = "Option::is_none")]
    pub poster_urls: Option<PosterUrls>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_language: Option<String>,
}

impl Movie {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_poster(mut self, reference: impl Into<String>) -> Self {
        self.poster_urls = Some(PosterUrls::single(reference));
        self
    }

    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = Some(overview.into());
        self
    }

    /// Poster reference shown in the table, if any
    pub fn poster_reference(&self) -> Option<&str> {
        self.poster_urls
            .as_ref()
            .and_then(PosterUrls::preferred)
            .or(self.poster_path.as_deref())
    }

    /// Full-object patch: every field is present, absent ones as `null`
    ///
    /// Applying it replaces the stored record wholesale, which is what an edit
    /// (and undoing an edit) needs. The id is only included when set.
    pub fn to_patch(&self) -> Patch {
        fn opt<T: Serialize>(value: &Option<T>) -> Value {
            value
                .as_ref()
                .and_then(|v| serde_json::to_value(v).ok())
                .unwrap_or(Value::Null)
        }

        let mut patch = Patch::new();
        if let Some(id) = self.id {
            patch.insert("id".to_string(), Value::from(id));
        }
        patch.insert("title".to_string(), Value::from(self.title.clone()));
        patch.insert("year".to_string(), opt(&self.year));
        patch.insert("poster_path".to_string(), opt(&self.poster_path));
        patch.insert("posterUrls".to_string(), opt(&self.poster_urls));
        patch.insert("overview".to_string(), opt(&self.overview));
        patch.insert("original_language".to_string(), opt(&self.original_language));
        patch
    }
}

impl Record for Movie {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}
