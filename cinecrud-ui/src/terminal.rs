//! Line-oriented terminal front end
//!
//! Implements the form, confirmation and notification surfaces over any async
//! reader/writer pair, so the same code drives stdin/stdout and scripted tests.
//!
//! Form input conventions:
//! - empty line keeps the current value
//! - `-` clears the field
//! - `@<path>` loads the poster from an image file
//! - `:cancel` abandons the form

use std::io;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;
use tracing::warn;

use crate::dialogs::{ConfirmRequest, FormSurface};
use crate::editor::{poster_from_file, EditorMode, Field, MovieForm, ValidationErrors};
use crate::notify::{Notification, NotificationOutcome, Notifier};

pub const CANCEL_INPUT: &str = ":cancel";
pub const CLEAR_INPUT: &str = "-";
pub const UNDO_INPUT: &str = "u";

/// Longest field value echoed back in prompts
const PREVIEW_CHARS: usize = 48;

pub struct Terminal<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
    /// Line read during an undo window that was not an undo request
    pending: Mutex<Option<String>>,
}

/// Terminal over the process stdin/stdout
pub fn stdio() -> Terminal<BufReader<Stdin>, Stdout> {
    Terminal::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
            pending: Mutex::new(None),
        }
    }

    /// Next input line without its line ending; `None` at end of input
    pub async fn read_line(&self) -> io::Result<Option<String>> {
        if let Some(line) = self.pending.lock().await.take() {
            return Ok(Some(line));
        }
        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(&['\r', '\n'][..]).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    pub async fn write(&self, text: &str) -> io::Result<()> {
        let mut output = self.output.lock().await;
        output.write_all(text.as_bytes()).await?;
        output.flush().await
    }

    pub async fn writeln(&self, text: &str) -> io::Result<()> {
        self.write(&format!("{}\n", text)).await
    }

    /// Write `label` and read the answer
    pub async fn prompt(&self, label: &str) -> io::Result<Option<String>> {
        self.write(label).await?;
        self.read_line().await
    }

    /// Consume the writer (tests inspect what was written)
    pub fn into_output(self) -> W {
        self.output.into_inner()
    }

    async fn fill_form(
        &self,
        mode: EditorMode,
        mut form: MovieForm,
        errors: &ValidationErrors,
    ) -> io::Result<Option<MovieForm>> {
        let heading = match mode {
            EditorMode::Create => "New movie".to_string(),
            EditorMode::Edit => format!("Edit movie {}", form.id.map(|id| id.to_string()).unwrap_or_default()),
        };
        self.writeln(&format!("== {} ({} cancels, {} clears) ==", heading, CANCEL_INPUT, CLEAR_INPUT))
            .await?;
        for (field, error) in errors.iter() {
            self.writeln(&format!("  ! {} {}", field, error)).await?;
        }

        for field in [Field::Title, Field::Year, Field::Poster, Field::Overview] {
            let current = match field {
                Field::Title => &mut form.title,
                Field::Year => &mut form.year,
                Field::Poster => &mut form.poster,
                Field::Overview => &mut form.overview,
            };

            loop {
                let hint = if field == Field::Poster { " (URL or @file)" } else { "" };
                let label = format!("{}{} [{}]: ", field, hint, preview(current.as_str()));
                let Some(answer) = self.prompt(&label).await? else {
                    return Ok(None);
                };
                let answer = answer.trim();

                if answer == CANCEL_INPUT {
                    return Ok(None);
                }
                if answer.is_empty() {
                    break;
                }
                if answer == CLEAR_INPUT {
                    current.clear();
                    break;
                }
                if field == Field::Poster {
                    if let Some(path) = answer.strip_prefix('@') {
                        match poster_from_file(Path::new(path.trim())) {
                            Ok(data_url) => {
                                *current = data_url;
                                break;
                            }
                            Err(e) => {
                                self.writeln(&format!("  ! {}", e)).await?;
                                continue;
                            }
                        }
                    }
                }
                *current = answer.to_string();
                break;
            }
        }

        Ok(Some(form))
    }

    async fn ask_confirmation(&self, request: &ConfirmRequest) -> io::Result<bool> {
        let marker = if request.danger { "!! " } else { "" };
        if let Some(title) = &request.title {
            self.writeln(&format!("{}{}", marker, title)).await?;
        }
        self.writeln(&request.message).await?;

        let label = format!("{} / {} [y/N]: ", request.confirm_text, request.cancel_text);
        let answer = self.prompt(&label).await?.unwrap_or_default();
        Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    async fn announce(&self, notification: &Notification) -> io::Result<NotificationOutcome> {
        let Some(action) = &notification.action else {
            self.writeln(&format!("* {}", notification.message)).await?;
            return Ok(NotificationOutcome::Dismissed);
        };

        self.writeln(&format!(
            "* {} [{}: enter '{}' within {}]",
            notification.message,
            action,
            UNDO_INPUT,
            describe_window(notification.duration)
        ))
        .await?;

        // A line still being typed at the deadline is dropped
        match tokio::time::timeout(notification.duration, self.read_line()).await {
            Ok(Ok(Some(line))) if line.trim().eq_ignore_ascii_case(UNDO_INPUT) => {
                Ok(NotificationOutcome::ActionInvoked)
            }
            // Anything else typed in the window is the next command
            Ok(Ok(Some(line))) if !line.trim().is_empty() => {
                *self.pending.lock().await = Some(line);
                Ok(NotificationOutcome::Dismissed)
            }
            Ok(result) => result.map(|_| NotificationOutcome::Dismissed),
            Err(_) => Ok(NotificationOutcome::Dismissed),
        }
    }
}

/// Shortened value for prompt display
fn preview(value: &str) -> String {
    if value.chars().count() <= PREVIEW_CHARS {
        return value.to_string();
    }
    let head: String = value.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", head)
}

#[async_trait]
impl<R, W> FormSurface for Terminal<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn fill(
        &self,
        mode: EditorMode,
        form: MovieForm,
        errors: &ValidationErrors,
    ) -> Option<MovieForm> {
        match self.fill_form(mode, form, errors).await {
            Ok(form) => form,
            Err(e) => {
                warn!("Terminal error while editing: {}", e);
                None
            }
        }
    }

    async fn confirm(&self, request: ConfirmRequest) -> bool {
        match self.ask_confirmation(&request).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                warn!("Terminal error while confirming: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl<R, W> Notifier for Terminal<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn show(&self, notification: Notification) -> NotificationOutcome {
        match self.announce(&notification).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Terminal error while notifying: {}", e);
                NotificationOutcome::Dismissed
            }
        }
    }
}

/// Undo window as shown to the user
pub fn describe_window(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f32())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::UNDO_WINDOW;
    use std::io::Cursor;

    fn terminal(input: &str) -> Terminal<Cursor<Vec<u8>>, Vec<u8>> {
        Terminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(terminal: Terminal<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(terminal.into_output()).unwrap()
    }

    #[tokio::test]
    async fn test_fill_keeps_clears_and_replaces() {
        let term = terminal("Thor\n\n-\n\n");
        let form = MovieForm {
            id: Some(1),
            title: "Iron Man".to_string(),
            year: "2008".to_string(),
            poster: "https://x/a.jpg".to_string(),
            overview: "old".to_string(),
        };

        let filled = term
            .fill(EditorMode::Edit, form, &ValidationErrors::default())
            .await
            .unwrap();

        assert_eq!(filled.title, "Thor");
        assert_eq!(filled.year, "2008");
        assert_eq!(filled.poster, "");
        assert_eq!(filled.overview, "old");
        assert_eq!(filled.id, Some(1));
    }

    #[tokio::test]
    async fn test_fill_cancel_and_eof() {
        let term = terminal("Thor\n:cancel\n");
        assert!(term
            .fill(EditorMode::Create, MovieForm::default(), &ValidationErrors::default())
            .await
            .is_none());

        let term = terminal("Thor\n");
        assert!(term
            .fill(EditorMode::Create, MovieForm::default(), &ValidationErrors::default())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_fill_shows_errors() {
        let term = terminal("\n\n\n\n");
        let mut errors = ValidationErrors::default();
        errors.add(Field::Year, crate::editor::FieldError::Required);

        term.fill(EditorMode::Create, MovieForm::default(), &errors).await;

        assert!(output(term).contains("! year is required"));
    }

    #[tokio::test]
    async fn test_missing_poster_file_reprompts() {
        let term = terminal("T1\n2001\n@/definitely/not/here.png\nhttps://x/p.png\n\n");
        let filled = term
            .fill(EditorMode::Create, MovieForm::default(), &ValidationErrors::default())
            .await
            .unwrap();
        assert_eq!(filled.poster, "https://x/p.png");
    }

    #[tokio::test]
    async fn test_confirm_answers() {
        assert!(terminal("y\n").confirm(ConfirmRequest::delete_movie("Thor")).await);
        assert!(terminal("YES\n").confirm(ConfirmRequest::new("ok?")).await);
        assert!(!terminal("n\n").confirm(ConfirmRequest::new("ok?")).await);
        assert!(!terminal("").confirm(ConfirmRequest::new("ok?")).await);
    }

    #[tokio::test]
    async fn test_undo_invoked() {
        let term = terminal("u\n");
        let outcome = term.show(Notification::undo("\"Thor\" deleted.")).await;
        assert_eq!(outcome, NotificationOutcome::ActionInvoked);
        assert!(output(term).contains("\"Thor\" deleted."));
    }

    #[tokio::test]
    async fn test_other_input_dismisses() {
        let term = terminal("list\n");
        assert_eq!(term.show(Notification::undo("x")).await, NotificationOutcome::Dismissed);
    }

    #[tokio::test]
    async fn test_command_typed_in_undo_window_is_kept() {
        let term = terminal("next\nlist\n");
        assert_eq!(term.show(Notification::undo("x")).await, NotificationOutcome::Dismissed);
        assert_eq!(term.read_line().await.unwrap(), Some("next".to_string()));
        assert_eq!(term.read_line().await.unwrap(), Some("list".to_string()));
        assert_eq!(term.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_line_in_undo_window_is_consumed() {
        let term = terminal("\nlist\n");
        assert_eq!(term.show(Notification::undo("x")).await, NotificationOutcome::Dismissed);
        assert_eq!(term.read_line().await.unwrap(), Some("list".to_string()));
    }

    #[tokio::test]
    async fn test_info_does_not_wait_for_input() {
        let term = terminal("u\n");
        let outcome = term
            .show(Notification::info("Creation undone.", UNDO_WINDOW))
            .await;
        assert_eq!(outcome, NotificationOutcome::Dismissed);
        // Input left for the next reader
        assert_eq!(term.read_line().await.unwrap(), Some("u".to_string()));
    }

    #[tokio::test]
    async fn test_undo_window_expires() {
        // Reader that never yields a line
        let (reader, _writer) = tokio::io::duplex(64);
        let term = Terminal::new(BufReader::new(reader), Vec::new());

        let notification = Notification::with_action("\"Thor\" created.", "Undo", Duration::from_millis(20));
        let outcome = term.show(notification).await;

        assert_eq!(outcome, NotificationOutcome::Dismissed);
    }

    #[test]
    fn test_preview_truncates_long_values() {
        let long = "x".repeat(100);
        assert_eq!(preview(&long).len(), PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
        assert_eq!(describe_window(UNDO_WINDOW), "6.0s");
    }
}
