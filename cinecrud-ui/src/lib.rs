//! cinecrud-ui library interface
//!
//! Catalog presenter, TMDb client, record editor and terminal front end.
//! Exposed as a library for integration testing.

pub mod config;
pub mod dialogs;
pub mod editor;
pub mod error;
pub mod filter;
pub mod notify;
pub mod pagination;
pub mod presenter;
pub mod shell;
pub mod source;
pub mod table;
pub mod terminal;
pub mod tmdb_client;

pub use crate::dialogs::{ConfirmRequest, Dialogs, EditorDialogs, EditorRequest, FormSurface};
pub use crate::editor::{EditorMode, MovieForm, RecordEditor, ValidationErrors};
pub use crate::error::{UiError, UiResult};
pub use crate::notify::{Notification, NotificationOutcome, Notifier};
pub use crate::presenter::{ActionOutcome, CatalogPresenter, LoadSource, MovieDetails, PresenterState};
pub use crate::source::CatalogSource;
pub use crate::tmdb_client::{TmdbClient, TmdbError};
