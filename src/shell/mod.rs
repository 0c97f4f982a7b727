//! Line-oriented terminal front end.
//!
//! ARCHITECTURE
//! ============
//! The shell is the view layer: it reads one command per line, gates it on
//! the route mode computed from the current session snapshot, dispatches to
//! the action facade or a service, and prints the result. Failures are
//! rendered as `[E_CODE] message` and never end the loop; only `quit`, end
//! of input, or a broken output stream do.
//!
//! The last article listing (feed or search) and the last bookmark listing
//! are kept so `open`, `bookmark` and `unbookmark` can refer to entries by
//! number.

mod command;
mod render;

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

pub use command::{Command, CommandError, available};

use crate::error::{ErrorCode, render_error};
use crate::identity::Identity;
use crate::news::{Article, NewsError, NewsSearch};
use crate::route::{Mode, Screen};
use crate::services::actions::{SessionActions, login_error_message};
use crate::services::bookmarks::{Bookmark, BookmarkError, Bookmarks};
use crate::services::feed;
use crate::services::profile::ProfileCard;
use crate::services::session::SessionError;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Sign-in, sign-up or Google failure, shown with the login screen's wording.
    #[error("{}", login_error_message(.0))]
    Login(SessionError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    News(#[from] NewsError),

    #[error(transparent)]
    Bookmark(#[from] BookmarkError),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for ShellError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Command(e) => e.error_code(),
            Self::Login(e) | Self::Session(e) => e.error_code(),
            Self::News(e) => e.error_code(),
            Self::Bookmark(e) => e.error_code(),
            Self::Io(_) => "E_IO",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Login(e) | Self::Session(e) => e.retryable(),
            Self::News(e) => e.retryable(),
            Self::Bookmark(e) => e.retryable(),
            Self::Command(_) | Self::Io(_) => false,
        }
    }
}

/// Whether the loop keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

// =============================================================================
// SHELL
// =============================================================================

pub struct Shell {
    actions: SessionActions,
    bookmarks: Bookmarks,
    news: Arc<dyn NewsSearch>,
    country: String,
    feed_limit: usize,
    listing: Vec<Article>,
    saved: Vec<Bookmark>,
}

impl Shell {
    #[must_use]
    pub fn new(
        actions: SessionActions,
        bookmarks: Bookmarks,
        news: Arc<dyn NewsSearch>,
        country: impl Into<String>,
        feed_limit: usize,
    ) -> Self {
        Self { actions, bookmarks, news, country: country.into(), feed_limit, listing: Vec::new(), saved: Vec::new() }
    }

    fn mode(&self) -> Mode {
        self.actions.store().mode()
    }

    /// Read commands from `input` until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns [`ShellError::Io`] when reading input or writing output fails.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<(), ShellError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let session = self.actions.store().ready().await;
        debug!(signed_in = session.identity.is_some(), "shell: session ready");
        self.greet(out)?;

        let mut lines = input.lines();
        loop {
            write!(out, "{}> ", prompt(self.mode()))?;
            out.flush()?;
            let Some(line) = lines.next_line().await? else {
                writeln!(out)?;
                break;
            };
            match self.execute(&line, out).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(ShellError::Io(e)) => return Err(ShellError::Io(e)),
                Err(e) => writeln!(out, "{}", render_error(&e))?,
            }
        }
        Ok(())
    }

    fn greet<W: Write>(&self, out: &mut W) -> Result<(), ShellError> {
        match self.actions.store().snapshot().identity {
            Some(identity) => {
                let card = ProfileCard::from_identity(&identity);
                writeln!(out, "Welcome back, {}. Type `help` for commands.", card.name)?;
            }
            None => writeln!(out, "{} Type `help` for commands.", render::header(Screen::Login))?,
        }
        Ok(())
    }

    /// Execute one input line.
    ///
    /// # Errors
    ///
    /// Returns the failing command's error; the caller decides whether to continue.
    pub async fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow, ShellError> {
        let Some(command) = Command::parse(line)? else {
            return Ok(Flow::Continue);
        };
        let mode = self.mode();
        command.check_available(mode)?;
        debug!(command = command.name(), "shell: dispatch");

        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {
                if mode == Mode::Authenticated {
                    writeln!(out, "{}", render::tab_bar())?;
                }
                for usage in available(mode) {
                    writeln!(out, "  {usage}")?;
                }
            }
            Command::Login { email, password } => {
                let identity = self.actions.sign_in(&email, &password).await.map_err(ShellError::Login)?;
                signed_in(out, &identity)?;
            }
            Command::Signup { email, password } => {
                let identity = self.actions.sign_up(&email, &password).await.map_err(ShellError::Login)?;
                signed_in(out, &identity)?;
            }
            Command::Google { id_token } => {
                let identity = self.actions.sign_in_with_google(&id_token).await.map_err(ShellError::Login)?;
                signed_in(out, &identity)?;
            }
            Command::Home => {
                self.listing = feed::home_feed(self.news.as_ref(), &self.country, self.feed_limit).await?;
                writeln!(out, "{}", render::header(Screen::Home))?;
                writeln!(out, "{}", render::article_list(&self.listing, "No headlines right now."))?;
            }
            Command::Search { query } => {
                self.listing = feed::search(self.news.as_ref(), &query).await?;
                writeln!(out, "{}", render::header(Screen::Discover))?;
                writeln!(out, "{}", render::article_list(&self.listing, "No articles found."))?;
            }
            Command::Open { index } => {
                let article = pick(&self.listing, index)?;
                writeln!(out, "{}", render::header(Screen::ArticleDetail))?;
                writeln!(out, "{}", render::article_detail(article))?;
            }
            Command::Bookmark { index } => {
                let article = pick(&self.listing, index)?.clone();
                self.bookmarks.add(&article).await?;
                writeln!(out, "Saved \"{}\".", article.title)?;
            }
            Command::Bookmarks => {
                self.saved = self.bookmarks.list().await?;
                self.listing = self.saved.iter().map(Bookmark::article).collect();
                writeln!(out, "{}", render::header(Screen::Bookmarks))?;
                writeln!(out, "{}", render::bookmark_list(&self.saved))?;
            }
            Command::Unbookmark { index } => {
                let bookmark = pick(&self.saved, index)?.clone();
                self.bookmarks.remove(&bookmark.id).await?;
                self.saved.retain(|b| b.id != bookmark.id);
                writeln!(out, "Removed \"{}\".", bookmark.title)?;
            }
            Command::Profile => {
                let identity = self.actions.store().snapshot().identity.ok_or(SessionError::NoActiveSession)?;
                writeln!(out, "{}", render::header(Screen::Profile))?;
                writeln!(out, "{}", render::profile(&ProfileCard::from_identity(&identity)))?;
            }
            Command::Rename { name } => {
                self.actions.update_display_name(&name).await?;
                writeln!(out, "Display name updated.")?;
            }
            Command::DeleteAccount { password } => {
                self.actions.delete_account(&password).await?;
                self.clear_listings();
                writeln!(out, "Account deleted.")?;
            }
            Command::Logout => {
                self.actions.sign_out().await?;
                self.clear_listings();
                writeln!(out, "Signed out.")?;
            }
        }
        Ok(Flow::Continue)
    }

    fn clear_listings(&mut self) {
        self.listing.clear();
        self.saved.clear();
    }
}

fn signed_in<W: Write>(out: &mut W, identity: &Identity) -> Result<(), ShellError> {
    let card = ProfileCard::from_identity(identity);
    writeln!(out, "Signed in as {}.", card.name)?;
    Ok(())
}

fn prompt(mode: Mode) -> &'static str {
    match mode {
        Mode::Loading => "loading",
        Mode::Authenticated => "cybernews",
        Mode::Unauthenticated => "login",
    }
}

fn pick<T>(items: &[T], index: usize) -> Result<&T, CommandError> {
    index
        .checked_sub(1)
        .and_then(|i| items.get(i))
        .ok_or(CommandError::NoSuchItem(index))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
