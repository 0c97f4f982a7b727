use std::sync::Arc;

use clap::Parser;
use cybernews::config::{AppConfig, ConfigError};
use cybernews::error::{ErrorCode, render_error};
use cybernews::identity::firebase::FirebaseAuth;
use cybernews::identity::{IdentityProvider, ProviderError};
use cybernews::news::newsapi::NewsApiClient;
use cybernews::news::{NewsError, NewsSearch};
use cybernews::services::actions::SessionActions;
use cybernews::services::bookmarks::Bookmarks;
use cybernews::services::session::{SessionError, SessionStore};
use cybernews::shell::{Shell, ShellError};
use cybernews::store::firestore::FirestoreClient;
use cybernews::store::{DocumentStore, StoreError, TokenSource};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    News(#[from] NewsError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Shell(#[from] ShellError),
}

impl ErrorCode for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Provider(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::News(e) => e.error_code(),
            Self::Session(e) => e.error_code(),
            Self::Shell(e) => e.error_code(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "cybernews", about = "Cybersecurity news reader with Firebase sign-in")]
struct Cli {
    /// Two-letter country code for top headlines (overrides NEWS_COUNTRY).
    #[arg(long)]
    country: Option<String>,

    /// Number of articles on the home feed (overrides HOME_FEED_LIMIT).
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "cybernews exited");
            eprintln!("{}", render_error(&e));
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = AppConfig::from_env()?;
    if let Some(country) = cli.country {
        config.news.country = country.trim().to_ascii_lowercase();
    }
    if let Some(limit) = cli.limit.filter(|n| *n > 0) {
        config.news.home_feed_limit = limit;
    }

    let auth = Arc::new(FirebaseAuth::new(&config.firebase, config.timeouts)?);
    let documents: Arc<dyn DocumentStore> = Arc::new(FirestoreClient::new(
        &config.firebase,
        config.timeouts,
        Arc::clone(&auth) as Arc<dyn TokenSource>,
    )?);
    let news: Arc<dyn NewsSearch> = Arc::new(NewsApiClient::new(&config.news, config.timeouts)?);

    let store = Arc::new(SessionStore::new(auth as Arc<dyn IdentityProvider>));
    store.initialize()?;
    tracing::info!(project = %config.firebase.project_id, country = %config.news.country, "cybernews starting");

    let bookmarks = Bookmarks::new(Arc::clone(&store), documents);
    let mut shell = Shell::new(
        SessionActions::new(Arc::clone(&store)),
        bookmarks,
        news,
        config.news.country.clone(),
        config.news.home_feed_limit,
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let result = shell.run(stdin, &mut std::io::stdout()).await;
    store.shutdown();
    result.map_err(AppError::from)
}
