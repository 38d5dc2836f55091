//! Interactive command shell
//!
//! Reads one command per line, drives the presenter, and renders the current
//! page as a plain text table after every change.

use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::debug;

use crate::error::UiResult;
use crate::presenter::{ActionOutcome, CatalogPresenter, MovieDetails};
use crate::table::{PageView, Sort, SortDirection};
use crate::terminal::Terminal;

pub const PROMPT: &str = "cinecrud> ";

/// Widest title rendered in the table
const TITLE_WIDTH: usize = 40;

pub const HELP: &str = "\
Commands:
  list                      show the current page
  next | prev               move between pages
  page N                    jump to page N
  filter [TITLE] [year:Y]   filter by title and/or year
  clear                     remove filters
  sort title|year [asc|desc], sort off
  new                       create a movie
  edit ID                   edit a movie
  delete ID                 delete a movie
  info ID                   remote details and videos
  reset                     reload from TMDb, discarding local edits
  restore                   return to the last loaded data
  help                      this text
  quit                      leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Next,
    Prev,
    Page(usize),
    Filter { title: String, year: String },
    Clear,
    Sort(Option<Sort>),
    New,
    Edit(i64),
    Delete(i64),
    Info(i64),
    Reset,
    Restore,
    Help,
    Quit,
}

fn parse_id(arg: Option<&str>, command: &str) -> Result<i64, String> {
    let arg = arg.ok_or_else(|| format!("usage: {} ID", command))?;
    arg.parse().map_err(|_| format!("'{}' is not a movie id", arg))
}

/// Parse one shell line
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(Command::List);
    };
    let rest: Vec<&str> = words.collect();

    match head.to_ascii_lowercase().as_str() {
        "list" | "ls" => Ok(Command::List),
        "next" | "n" => Ok(Command::Next),
        "prev" | "p" => Ok(Command::Prev),
        "page" => {
            let arg = rest.first().ok_or("usage: page N")?;
            match arg.parse::<usize>() {
                Ok(page) if page > 0 => Ok(Command::Page(page)),
                _ => Err(format!("'{}' is not a page number", arg)),
            }
        }
        "filter" | "f" => {
            let mut year = String::new();
            let mut title = Vec::new();
            for word in rest {
                match word.strip_prefix("year:") {
                    Some(value) => year = value.to_string(),
                    None => title.push(word),
                }
            }
            Ok(Command::Filter {
                title: title.join(" "),
                year,
            })
        }
        "clear" => Ok(Command::Clear),
        "sort" => match rest.as_slice() {
            ["off"] => Ok(Command::Sort(None)),
            [key] => Ok(Command::Sort(Some(Sort {
                key: key.parse()?,
                direction: SortDirection::Ascending,
            }))),
            [key, direction] => Ok(Command::Sort(Some(Sort {
                key: key.parse()?,
                direction: direction.parse()?,
            }))),
            _ => Err("usage: sort title|year [asc|desc] or sort off".to_string()),
        },
        "new" | "add" => Ok(Command::New),
        "edit" => parse_id(rest.first().copied(), "edit").map(Command::Edit),
        "delete" | "rm" => parse_id(rest.first().copied(), "delete").map(Command::Delete),
        "info" => parse_id(rest.first().copied(), "info").map(Command::Info),
        "reset" => Ok(Command::Reset),
        "restore" => Ok(Command::Restore),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command '{}' (try 'help')", other)),
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let head: String = value.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", head)
}

/// Render one page as a text table
pub fn render_page(view: &PageView) -> String {
    let mut out = format!("{:>15}  {:<width$}  {:<4}  Poster\n", "ID", "Title", "Year", width = TITLE_WIDTH);
    out.push_str(&format!("{}\n", "-".repeat(15 + 2 + TITLE_WIDTH + 2 + 4 + 2 + 6)));

    if view.rows.is_empty() {
        out.push_str("  (no movies)\n");
    }
    for movie in &view.rows {
        let id = movie.id.map(|id| id.to_string()).unwrap_or_default();
        let poster = if movie.poster_reference().is_some() { "yes" } else { "-" };
        out.push_str(&format!(
            "{:>15}  {:<width$}  {:<4}  {}\n",
            id,
            truncate(&movie.title, TITLE_WIDTH),
            movie.year.as_deref().unwrap_or(""),
            poster,
            width = TITLE_WIDTH
        ));
    }

    out.push_str(&format!(
        "Page {} of {} ({} matching, {} total)\n",
        view.page, view.total_pages, view.filtered_rows, view.total_rows
    ));
    out
}

/// Render a remote detail view
pub fn render_details(details: &MovieDetails) -> String {
    let movie = &details.movie;
    let mut out = format!(
        "{} ({})\n",
        movie.title,
        movie.year.as_deref().unwrap_or("unknown year")
    );
    if let Some(poster) = movie.poster_reference() {
        out.push_str(&format!("Poster: {}\n", poster));
    }
    if let Some(language) = &movie.original_language {
        out.push_str(&format!("Language: {}\n", language));
    }
    if let Some(overview) = &movie.overview {
        out.push_str(&format!("\n{}\n", overview));
    }
    if !details.videos.is_empty() {
        out.push_str("\nVideos:\n");
        for video in &details.videos {
            let link = video.watch_url().unwrap_or_else(|| format!("{} {}", video.site, video.key));
            out.push_str(&format!("  [{}] {}: {}\n", video.video_type, video.name, link));
        }
    }
    out
}

fn describe_outcome(outcome: ActionOutcome, id: Option<i64>) -> Option<String> {
    match outcome {
        ActionOutcome::Cancelled => Some("Cancelled.".to_string()),
        ActionOutcome::Missing => Some(format!(
            "No movie with id {}.",
            id.map(|id| id.to_string()).unwrap_or_default()
        )),
        ActionOutcome::Applied | ActionOutcome::Undone | ActionOutcome::Failed => None,
    }
}

/// Execute one command; `false` when the shell should exit
pub async fn execute<R, W>(
    presenter: &mut CatalogPresenter,
    terminal: &Terminal<R, W>,
    command: Command,
) -> UiResult<bool>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    debug!(?command, "Shell command");

    let outcome = match command {
        Command::Quit => return Ok(false),
        Command::Help => {
            terminal.writeln(HELP).await?;
            return Ok(true);
        }
        Command::Info(id) => {
            if let Some(details) = presenter.details(id).await {
                terminal.write(&render_details(&details)).await?;
            }
            return Ok(true);
        }
        Command::List => None,
        Command::Next => {
            presenter.next_page();
            None
        }
        Command::Prev => {
            presenter.previous_page();
            None
        }
        Command::Page(page) => {
            presenter.go_to_page(page);
            None
        }
        Command::Filter { title, year } => {
            presenter.apply_filters(&title, &year);
            None
        }
        Command::Clear => {
            presenter.clear_filters();
            None
        }
        Command::Sort(sort) => {
            presenter.set_sort(sort);
            None
        }
        Command::Reset => {
            presenter.reset_from_source().await;
            None
        }
        Command::Restore => describe_outcome(presenter.restore_init().await, None),
        Command::New => describe_outcome(presenter.open_create().await, None),
        Command::Edit(id) => describe_outcome(presenter.open_edit(id).await, Some(id)),
        Command::Delete(id) => describe_outcome(presenter.delete(id).await, Some(id)),
    };

    if let Some(message) = outcome {
        terminal.writeln(&message).await?;
    }
    terminal.write(&render_page(&presenter.page_view())).await?;
    Ok(true)
}

/// Read and execute commands until `quit` or end of input
pub async fn run_shell<R, W>(presenter: &mut CatalogPresenter, terminal: &Terminal<R, W>) -> UiResult<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    terminal.write(&render_page(&presenter.page_view())).await?;

    while let Some(line) = terminal.prompt(PROMPT).await? {
        match parse_command(&line) {
            Ok(command) => {
                if !execute(presenter, terminal, command).await? {
                    break;
                }
            }
            Err(message) => terminal.writeln(&message).await?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SortKey;
    use cinecrud_common::Movie;

    #[test]
    fn test_parse_navigation() {
        assert_eq!(parse_command(""), Ok(Command::List));
        assert_eq!(parse_command("next"), Ok(Command::Next));
        assert_eq!(parse_command("  PREV "), Ok(Command::Prev));
        assert_eq!(parse_command("page 3"), Ok(Command::Page(3)));
        assert!(parse_command("page 0").is_err());
        assert!(parse_command("page").is_err());
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_command("filter iron man year:2008"),
            Ok(Command::Filter {
                title: "iron man".to_string(),
                year: "2008".to_string()
            })
        );
        assert_eq!(
            parse_command("filter year:201"),
            Ok(Command::Filter {
                title: String::new(),
                year: "201".to_string()
            })
        );
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(
            parse_command("sort year desc"),
            Ok(Command::Sort(Some(Sort {
                key: SortKey::Year,
                direction: SortDirection::Descending
            })))
        );
        assert_eq!(parse_command("sort off"), Ok(Command::Sort(None)));
        assert!(parse_command("sort rating").is_err());
    }

    #[test]
    fn test_parse_record_commands() {
        assert_eq!(parse_command("edit 42"), Ok(Command::Edit(42)));
        assert_eq!(parse_command("delete 7"), Ok(Command::Delete(7)));
        assert_eq!(parse_command("info 1726"), Ok(Command::Info(1726)));
        assert!(parse_command("edit").is_err());
        assert!(parse_command("delete seven").is_err());
        assert!(parse_command("launch").is_err());
    }

    #[test]
    fn test_render_page() {
        let view = PageView {
            rows: vec![
                Movie::new("Iron Man").with_id(1).with_year("2008").with_poster("https://x/a.jpg"),
                Movie::new("Thor").with_id(2),
            ],
            page: 1,
            total_pages: 1,
            filtered_rows: 2,
            total_rows: 5,
        };

        let text = render_page(&view);

        assert!(text.contains("Iron Man"));
        assert!(text.contains("2008"));
        assert!(text.contains("Page 1 of 1 (2 matching, 5 total)"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn test_render_empty_page() {
        let view = PageView {
            rows: Vec::new(),
            page: 1,
            total_pages: 1,
            filtered_rows: 0,
            total_rows: 0,
        };
        assert!(render_page(&view).contains("(no movies)"));
    }

    #[test]
    fn test_truncate_long_title() {
        let title = "a".repeat(60);
        assert_eq!(truncate(&title, TITLE_WIDTH).chars().count(), TITLE_WIDTH);
    }
}
