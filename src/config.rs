//! Application configuration parsed from environment variables.

pub const DEFAULT_NEWS_COUNTRY: &str = "us";
pub const DEFAULT_HOME_FEED_LIMIT: usize = 5;
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_SECURE_TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com/v1";
pub const DEFAULT_FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_NEWS_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    MissingVar { var: String },
    #[error("config parse failed: {0}")]
    Parse(String),
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingVar { .. } => "E_CONFIG_MISSING",
            Self::Parse(_) => "E_CONFIG_PARSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_HTTP_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_HTTP_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub identity_base_url: String,
    pub secure_token_base_url: String,
    pub firestore_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsConfig {
    pub api_key: String,
    pub base_url: String,
    pub country: String,
    pub home_feed_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub firebase: FirebaseConfig,
    pub news: NewsConfig,
    pub timeouts: HttpTimeouts,
}

impl AppConfig {
    /// Build typed config from process environment variables.
    ///
    /// Required:
    /// - `FIREBASE_API_KEY`, `FIREBASE_PROJECT_ID`, `NEWS_API_KEY`
    ///
    /// Optional:
    /// - `NEWS_COUNTRY`: default `us`
    /// - `HOME_FEED_LIMIT`: default 5, must be non-zero
    /// - `IDENTITY_BASE_URL`, `SECURE_TOKEN_BASE_URL`, `FIRESTORE_BASE_URL`, `NEWS_BASE_URL`: public endpoints by default
    /// - `HTTP_REQUEST_TIMEOUT_SECS`: default 30
    /// - `HTTP_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build typed config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVar { var: key.into() })
        };
        let base_url = |key: &str, default: &str| {
            lookup(key)
                .unwrap_or_else(|| default.to_string())
                .trim_end_matches('/')
                .to_string()
        };

        let firebase = FirebaseConfig {
            api_key: required("FIREBASE_API_KEY")?,
            project_id: required("FIREBASE_PROJECT_ID")?,
            identity_base_url: base_url("IDENTITY_BASE_URL", DEFAULT_IDENTITY_BASE_URL),
            secure_token_base_url: base_url("SECURE_TOKEN_BASE_URL", DEFAULT_SECURE_TOKEN_BASE_URL),
            firestore_base_url: base_url("FIRESTORE_BASE_URL", DEFAULT_FIRESTORE_BASE_URL),
        };

        let home_feed_limit = parse_or(lookup("HOME_FEED_LIMIT"), DEFAULT_HOME_FEED_LIMIT);
        if home_feed_limit == 0 {
            return Err(ConfigError::Parse("HOME_FEED_LIMIT must be at least 1".into()));
        }
        let news = NewsConfig {
            api_key: required("NEWS_API_KEY")?,
            base_url: base_url("NEWS_BASE_URL", DEFAULT_NEWS_BASE_URL),
            country: lookup("NEWS_COUNTRY")
                .map(|c| c.trim().to_ascii_lowercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_NEWS_COUNTRY.to_string()),
            home_feed_limit,
        };

        let timeouts = HttpTimeouts {
            request_secs: parse_or(lookup("HTTP_REQUEST_TIMEOUT_SECS"), DEFAULT_HTTP_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(lookup("HTTP_CONNECT_TIMEOUT_SECS"), DEFAULT_HTTP_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { firebase, news, timeouts })
    }
}

fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr,
{
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
