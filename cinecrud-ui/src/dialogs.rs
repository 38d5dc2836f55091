//! Modal dialog seams
//!
//! Each dialog is an explicit request/response pair: the presenter awaits one
//! resolution per user action, either a result or a cancellation.

use std::sync::Arc;

use async_trait::async_trait;
use cinecrud_common::Movie;

use crate::editor::{EditorMode, MovieForm, RecordEditor, ValidationErrors};

/// Open the record editor in `mode`, optionally pre-filled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorRequest {
    pub mode: EditorMode,
    pub item: Option<Movie>,
}

impl EditorRequest {
    pub fn create() -> Self {
        Self {
            mode: EditorMode::Create,
            item: None,
        }
    }

    pub fn edit(item: Movie) -> Self {
        Self {
            mode: EditorMode::Edit,
            item: Some(item),
        }
    }
}

/// Yes/no confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub title: Option<String>,
    pub message: String,
    pub confirm_text: String,
    pub cancel_text: String,
    /// Destructive action; surfaces should make it stand out
    pub danger: bool,
}

impl ConfirmRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            title: None,
            message: message.into(),
            confirm_text: "Confirm".to_string(),
            cancel_text: "Cancel".to_string(),
            danger: false,
        }
    }

    /// Confirmation guarding a record deletion
    pub fn delete_movie(title: &str) -> Self {
        Self {
            title: Some("Delete movie".to_string()),
            message: format!("Are you sure you want to delete \"{}\"?", title),
            confirm_text: "Delete".to_string(),
            cancel_text: "Cancel".to_string(),
            danger: true,
        }
    }

    /// Secondary confirmation before an edit is saved
    pub fn save_changes(title: &str) -> Self {
        Self {
            title: Some("Save changes".to_string()),
            message: format!("Overwrite the stored record \"{}\"?", title),
            confirm_text: "Save".to_string(),
            cancel_text: "Keep editing".to_string(),
            danger: true,
        }
    }
}

/// Dialogs the presenter opens
#[async_trait]
pub trait Dialogs: Send + Sync {
    /// Record editor; `None` when cancelled
    async fn edit(&self, request: EditorRequest) -> Option<Movie>;

    /// Confirmation; `false` when declined
    async fn confirm(&self, request: ConfirmRequest) -> bool;
}

/// Form rendering surface the record editor drives
#[async_trait]
pub trait FormSurface: Send + Sync {
    /// Present `form` with `errors`; return the edited form, or `None` to cancel
    async fn fill(
        &self,
        mode: EditorMode,
        form: MovieForm,
        errors: &ValidationErrors,
    ) -> Option<MovieForm>;

    async fn confirm(&self, request: ConfirmRequest) -> bool;
}

/// Presenter dialogs backed by a form surface and the record editor session
pub struct EditorDialogs<S: FormSurface> {
    surface: Arc<S>,
}

impl<S: FormSurface> EditorDialogs<S> {
    pub fn new(surface: Arc<S>) -> Self {
        Self { surface }
    }
}

#[async_trait]
impl<S: FormSurface> Dialogs for EditorDialogs<S> {
    async fn edit(&self, request: EditorRequest) -> Option<Movie> {
        let editor = RecordEditor::new(request.mode);
        editor.run(self.surface.as_ref(), request.item.as_ref()).await
    }

    async fn confirm(&self, request: ConfirmRequest) -> bool {
        self.surface.confirm(request).await
    }
}
