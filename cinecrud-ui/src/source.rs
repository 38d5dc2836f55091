//! Remote catalog seam consumed by the presenter

use async_trait::async_trait;
use cinecrud_common::Movie;

use crate::tmdb_client::{TmdbError, TmdbVideo};

/// Source of seed records
///
/// Implementations return records already normalized into [`Movie`]s.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Search by free-text query, one result page at a time (1-indexed)
    async fn search(&self, query: &str, page: u32) -> Result<Vec<Movie>, TmdbError>;

    /// Single record by remote id
    async fn fetch_by_id(&self, id: i64) -> Result<Movie, TmdbError>;

    /// Trailers and clips for a record; sources without videos return none
    async fn videos(&self, _id: i64) -> Result<Vec<TmdbVideo>, TmdbError> {
        Ok(Vec::new())
    }
}
