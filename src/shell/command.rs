//! Line parser for shell commands.
//!
//! Article and bookmark indices are 1-based, matching the numbered
//! listings the shell prints. Passwords are taken verbatim: everything after
//! the single separator that follows the email (or the verb, for
//! `delete-account`), including leading and trailing spaces.

use crate::route::{Mode, Screen, screens_for};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Login { email: String, password: String },
    Signup { email: String, password: String },
    Google { id_token: String },
    Home,
    Search { query: String },
    Open { index: usize },
    Bookmark { index: usize },
    Bookmarks,
    Unbookmark { index: usize },
    Profile,
    Rename { name: String },
    DeleteAccount { password: String },
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`; type `help`")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("`{0}` is not a list number")]
    BadIndex(String),

    #[error("`{command}` is not available while {state}")]
    Unavailable { command: &'static str, state: &'static str },

    #[error("no article #{0} in the last listing")]
    NoSuchItem(usize),
}

impl crate::error::ErrorCode for CommandError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unknown(_) => "E_UNKNOWN_COMMAND",
            Self::Usage(_) => "E_USAGE",
            Self::BadIndex(_) => "E_BAD_INDEX",
            Self::Unavailable { .. } => "E_UNAVAILABLE",
            Self::NoSuchItem(_) => "E_NO_SUCH_ITEM",
        }
    }
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] for unknown verbs and malformed arguments.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim_start().trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(None);
        }
        let (verb, raw) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = raw.trim();

        let command = match verb.to_ascii_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "login" => {
                let (email, password) = credential_args(raw, "login <email> <password>")?;
                Self::Login { email, password }
            }
            "signup" => {
                let (email, password) = credential_args(raw, "signup <email> <password>")?;
                Self::Signup { email, password }
            }
            "google" => Self::Google { id_token: required(rest, "google <id-token>")? },
            "home" => Self::Home,
            "search" => Self::Search { query: required(rest, "search <keyword>")? },
            "open" => Self::Open { index: index(rest, "open <n>")? },
            "bookmark" => Self::Bookmark { index: index(rest, "bookmark <n>")? },
            "bookmarks" => Self::Bookmarks,
            "unbookmark" => Self::Unbookmark { index: index(rest, "unbookmark <n>")? },
            "profile" => Self::Profile,
            "rename" => Self::Rename { name: required(rest, "rename <display name>")? },
            "delete-account" => Self::DeleteAccount { password: raw.to_string() },
            "logout" => Self::Logout,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Login { .. } => "login",
            Self::Signup { .. } => "signup",
            Self::Google { .. } => "google",
            Self::Home => "home",
            Self::Search { .. } => "search",
            Self::Open { .. } => "open",
            Self::Bookmark { .. } => "bookmark",
            Self::Bookmarks => "bookmarks",
            Self::Unbookmark { .. } => "unbookmark",
            Self::Profile => "profile",
            Self::Rename { .. } => "rename",
            Self::DeleteAccount { .. } => "delete-account",
            Self::Logout => "logout",
        }
    }

    /// Screen the command acts on. `None` for commands valid in any mode.
    #[must_use]
    pub fn screen(&self) -> Option<Screen> {
        match self {
            Self::Help | Self::Quit => None,
            Self::Login { .. } | Self::Signup { .. } | Self::Google { .. } => Some(Screen::Login),
            Self::Home => Some(Screen::Home),
            Self::Search { .. } => Some(Screen::Discover),
            Self::Open { .. } | Self::Bookmark { .. } => Some(Screen::ArticleDetail),
            Self::Bookmarks | Self::Unbookmark { .. } => Some(Screen::Bookmarks),
            Self::Profile | Self::Rename { .. } | Self::DeleteAccount { .. } | Self::Logout => Some(Screen::Profile),
        }
    }

    /// Gate the command on the current route mode.
    ///
    /// # Errors
    ///
    /// [`CommandError::Unavailable`] when the mode does not expose the command's screen.
    pub fn check_available(&self, mode: Mode) -> Result<(), CommandError> {
        match self.screen() {
            Some(screen) if !screens_for(mode).contains(&screen) => Err(CommandError::Unavailable {
                command: self.name(),
                state: match mode {
                    Mode::Loading => "loading",
                    Mode::Authenticated => "signed in",
                    Mode::Unauthenticated => "signed out",
                },
            }),
            _ => Ok(()),
        }
    }
}

/// Commands listed by `help` for `mode`.
#[must_use]
pub fn available(mode: Mode) -> &'static [&'static str] {
    match mode {
        Mode::Loading => &["quit"],
        Mode::Unauthenticated => &[
            "login <email> <password>",
            "signup <email> <password>",
            "google <id-token>",
            "quit",
        ],
        Mode::Authenticated => &[
            "home",
            "search <keyword>",
            "open <n>",
            "bookmark <n>",
            "bookmarks",
            "unbookmark <n>",
            "profile",
            "rename <display name>",
            "delete-account <password>",
            "logout",
            "quit",
        ],
    }
}

fn required(rest: &str, usage: &'static str) -> Result<String, CommandError> {
    if rest.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok(rest.to_string())
}

/// `<email> <password>` with the password kept verbatim.
fn credential_args(raw: &str, usage: &'static str) -> Result<(String, String), CommandError> {
    let (email, password) = raw
        .trim_start()
        .split_once(char::is_whitespace)
        .ok_or(CommandError::Usage(usage))?;
    if email.is_empty() || password.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    Ok((email.to_string(), password.to_string()))
}

fn index(rest: &str, usage: &'static str) -> Result<usize, CommandError> {
    let raw = required(rest, usage)?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CommandError::BadIndex(raw)),
    }
}

#[cfg(test)]
#[path = "command_test.rs"]
mod tests;
