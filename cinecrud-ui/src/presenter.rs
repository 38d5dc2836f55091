//! Catalog presenter
//!
//! Orchestrates the remote source, the snapshot store, dialogs and
//! notifications for one named collection. Every action takes `&mut self`,
//! so actions on one presenter never interleave.
//!
//! Mutations follow the same three steps: open a dialog and await its
//! resolution, apply the store operation and reload the table, then offer an
//! undo notification. The undo inverse runs only if the notification reports
//! its action was invoked before the deadline.

use std::sync::Arc;

use cinecrud_common::config::CatalogConfig;
use cinecrud_common::{Movie, SnapshotStore};
use tracing::{debug, error, info, warn};

use crate::dialogs::{ConfirmRequest, Dialogs, EditorRequest};
use crate::filter::MovieFilter;
use crate::notify::{
    Notification, NotificationOutcome, Notifier, ERROR_DURATION, LOAD_WARNING_DURATION,
    UNDO_RESULT_DURATION,
};
use crate::source::CatalogSource;
use crate::table::{CatalogTable, PageView, Sort};
use crate::tmdb_client::TmdbVideo;

const LOAD_WARNING: &str = "Could not load data from TMDb. Using local data if available.";
const UNDO_FAILED: &str = "Could not undo.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterState {
    Uninitialized,
    Loaded,
}

/// Where the displayed rows came from after a load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Fresh search results, seeded into the store
    Remote,
    /// Remote unavailable; whatever the local work set holds
    LocalFallback,
}

/// Result of a user action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Dialog cancelled or declined; nothing changed
    Cancelled,
    /// Change persisted and kept
    Applied,
    /// Change persisted, then reverted through the undo action
    Undone,
    /// Storage failed; the view keeps its last good state
    Failed,
    /// No loaded record with the requested id
    Missing,
}

/// Remote detail view of one record
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetails {
    pub movie: Movie,
    pub videos: Vec<TmdbVideo>,
}

pub struct CatalogPresenter {
    source: Arc<dyn CatalogSource>,
    dialogs: Arc<dyn Dialogs>,
    notifier: Arc<dyn Notifier>,
    store: SnapshotStore<Movie>,
    collection: String,
    default_query: String,
    table: CatalogTable,
    state: PresenterState,
}

impl CatalogPresenter {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        dialogs: Arc<dyn Dialogs>,
        notifier: Arc<dyn Notifier>,
        store: SnapshotStore<Movie>,
        catalog: &CatalogConfig,
    ) -> Self {
        Self {
            source,
            dialogs,
            notifier,
            store,
            collection: catalog.collection.clone(),
            default_query: catalog.default_query.clone(),
            table: CatalogTable::new(catalog.page_size),
            state: PresenterState::Uninitialized,
        }
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn table(&self) -> &CatalogTable {
        &self.table
    }

    pub fn page_view(&self) -> PageView {
        self.table.page_view()
    }

    /// Seed from the default query, falling back to local data
    pub async fn activate(&mut self) -> LoadSource {
        let query = self.default_query.clone();
        self.init_from_source(&query).await
    }

    /// Re-seed from the remote source, overwriting local edits
    pub async fn reset_from_source(&mut self) -> LoadSource {
        info!("Resetting '{}' from remote source", self.collection);
        self.activate().await
    }

    async fn init_from_source(&mut self, query: &str) -> LoadSource {
        let loaded = match self.source.search(query, 1).await {
            Ok(movies) => {
                info!("Loaded {} movies for query '{}'", movies.len(), query);
                match self.store.reset_from_source(&self.collection, movies) {
                    Ok(_) => LoadSource::Remote,
                    Err(e) => {
                        error!("Failed to seed '{}': {}", self.collection, e);
                        self.notify(Notification::info("Could not save the loaded data.", ERROR_DURATION))
                            .await;
                        LoadSource::LocalFallback
                    }
                }
            }
            Err(e) => {
                warn!("Remote load failed, using local data: {}", e);
                self.reload().await;
                self.state = PresenterState::Loaded;
                self.notify(Notification::info(LOAD_WARNING, LOAD_WARNING_DURATION)).await;
                return LoadSource::LocalFallback;
            }
        };

        self.reload().await;
        self.state = PresenterState::Loaded;
        loaded
    }

    /// Re-read the work set into the table
    pub fn load_work(&mut self) -> cinecrud_common::Result<()> {
        let work = self.store.get_work(&self.collection)?;
        debug!("Loaded {} rows from '{}'", work.len(), self.collection);
        self.table.set_data(work);
        Ok(())
    }

    /// `load_work`, reporting storage failures instead of returning them
    async fn reload(&mut self) {
        if let Err(e) = self.load_work() {
            error!("Failed to read '{}': {}", self.collection, e);
            self.notify(Notification::info("Could not read local data.", ERROR_DURATION))
                .await;
        }
    }

    /// Discard local edits by copying the seed snapshot back
    pub async fn restore_init(&mut self) -> ActionOutcome {
        match self.store.restore_init(&self.collection) {
            Ok(work) => {
                info!("Restored '{}' to its seed snapshot ({} rows)", self.collection, work.len());
                self.table.set_data(work);
                self.state = PresenterState::Loaded;
                ActionOutcome::Applied
            }
            Err(e) => {
                error!("Failed to restore '{}': {}", self.collection, e);
                self.notify(Notification::info("Could not restore the original data.", ERROR_DURATION))
                    .await;
                ActionOutcome::Failed
            }
        }
    }

    /// Filter the loaded rows and return to the first page
    pub fn apply_filters(&mut self, title: &str, year: &str) {
        self.table.set_filter(MovieFilter::new(title, year));
    }

    pub fn clear_filters(&mut self) {
        self.apply_filters("", "");
    }

    pub fn set_sort(&mut self, sort: Option<Sort>) {
        self.table.set_sort(sort);
    }

    pub fn next_page(&mut self) {
        self.table.next_page();
    }

    pub fn previous_page(&mut self) {
        self.table.previous_page();
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.table.go_to_page(page);
    }

    pub async fn open_create(&mut self) -> ActionOutcome {
        let Some(result) = self.dialogs.edit(EditorRequest::create()).await else {
            return ActionOutcome::Cancelled;
        };

        let work = match self.store.create(&self.collection, result) {
            Ok(work) => work,
            Err(e) => return self.action_failed("creating movie", "Failed to create the movie", e).await,
        };

        let Some(created) = work.first().cloned() else {
            return ActionOutcome::Failed;
        };
        self.table.set_data(work);
        info!("Created movie {:?} '{}'", created.id, created.title);

        let message = format!("\"{}\" created.", created.title);
        self.offer_undo(message, "Creation undone.", "undoing creation", |store, name| {
            match created.id {
                Some(id) => store.delete(name, id),
                None => store.get_work(name),
            }
        })
        .await
    }

    pub async fn open_edit(&mut self, id: i64) -> ActionOutcome {
        let Some(original) = self.table.find(id).cloned() else {
            debug!("Edit requested for unknown id {}", id);
            return ActionOutcome::Missing;
        };

        let Some(result) = self.dialogs.edit(EditorRequest::edit(original.clone())).await else {
            return ActionOutcome::Cancelled;
        };

        let target = result.id.unwrap_or(id);
        let work = match self.store.update(&self.collection, target, &result.to_patch()) {
            Ok(work) => work,
            Err(e) => return self.action_failed("updating movie", "Failed to update the movie", e).await,
        };
        self.table.set_data(work);
        info!("Updated movie {} '{}'", target, result.title);

        // Undo re-applies the full pre-edit record
        let message = format!("\"{}\" updated.", result.title);
        let restore = original.to_patch();
        self.offer_undo(message, "Changes undone.", "undoing edit", move |store, name| {
            store.update(name, id, &restore)
        })
        .await
    }

    pub async fn delete(&mut self, id: i64) -> ActionOutcome {
        let Some(item) = self.table.find(id).cloned() else {
            debug!("Delete requested for unknown id {}", id);
            return ActionOutcome::Missing;
        };

        if !self.dialogs.confirm(ConfirmRequest::delete_movie(&item.title)).await {
            return ActionOutcome::Cancelled;
        }

        let work = match self.store.delete(&self.collection, id) {
            Ok(work) => work,
            Err(e) => return self.action_failed("deleting movie", "Failed to delete the movie", e).await,
        };
        self.table.set_data(work);
        info!("Deleted movie {} '{}'", id, item.title);

        // Re-created with its original id, at the front
        let message = format!("\"{}\" deleted.", item.title);
        self.offer_undo(message, "Deletion undone.", "undoing deletion", move |store, name| {
            store.create(name, item)
        })
        .await
    }

    /// Remote details and videos for one record
    pub async fn details(&mut self, id: i64) -> Option<MovieDetails> {
        let result = tokio::try_join!(self.source.fetch_by_id(id), self.source.videos(id));
        match result {
            Ok((movie, videos)) => Some(MovieDetails { movie, videos }),
            Err(e) => {
                warn!("Details for {} unavailable: {}", id, e);
                self.notify(Notification::info(
                    format!("Could not load details from TMDb ({}).", e),
                    LOAD_WARNING_DURATION,
                ))
                .await;
                None
            }
        }
    }

    /// Offer the undo action; run `undo` only when it is invoked in time
    async fn offer_undo<F>(
        &mut self,
        message: String,
        done: &str,
        context: &str,
        undo: F,
    ) -> ActionOutcome
    where
        F: FnOnce(&SnapshotStore<Movie>, &str) -> cinecrud_common::Result<Vec<Movie>>,
    {
        let outcome = self.notifier.show(Notification::undo(message)).await;
        if outcome != NotificationOutcome::ActionInvoked {
            return ActionOutcome::Applied;
        }

        match undo(&self.store, &self.collection) {
            Ok(work) => {
                self.table.set_data(work);
                info!("Undo applied ({})", context);
                self.notify(Notification::info(done, UNDO_RESULT_DURATION)).await;
                ActionOutcome::Undone
            }
            Err(e) => {
                error!("Error {}: {}", context, e);
                self.notify(Notification::info(UNDO_FAILED, UNDO_RESULT_DURATION)).await;
                ActionOutcome::Failed
            }
        }
    }

    async fn action_failed(
        &self,
        context: &str,
        message: &str,
        e: cinecrud_common::Error,
    ) -> ActionOutcome {
        error!("Error {}: {}", context, e);
        self.notify(Notification::info(message, ERROR_DURATION)).await;
        ActionOutcome::Failed
    }

    async fn notify(&self, notification: Notification) {
        self.notifier.show(notification).await;
    }
}
