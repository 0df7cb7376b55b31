//! CLI runner - executes commands

use crate::backend::{HttpSearchBackend, SearchFilters};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::pager::{PagerState, ResultPager};
use crate::session::{
    FileTokenStore, HttpAuthApi, MemoryTokenStore, Session, SessionManager, TokenStore,
};
use crate::types::FeedbackResult;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

type CliSession = SessionManager<Arc<dyn TokenStore>, HttpAuthApi>;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Search {
                filters,
                pages,
                all,
            } => self.search(filters, *pages, *all).await,
            Commands::Login { token } => self.login(token).await,
            Commands::Whoami { no_validate } => self.whoami(*no_validate).await,
            Commands::Logout => self.logout().await,
        }
    }

    /// Resolve configuration: file, then environment, then flags
    pub fn load_config(&self) -> Result<ClientConfig> {
        self.load_config_with(|key| std::env::var(key).ok())
    }

    fn load_config_with<F>(&self, lookup: F) -> Result<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        config.apply_overrides(lookup)?;

        if let Some(base_url) = &self.cli.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(page_size) = self.cli.page_size {
            config.page_size = page_size;
        }
        if let Some(path) = &self.cli.session_file {
            config.session_file = Some(path.clone());
        }

        config.validate()?;
        debug!("Resolved config: {:?}", config);
        Ok(config)
    }

    /// Build the session manager; without a session file nothing persists
    fn session_manager(config: &ClientConfig, client: HttpClient) -> CliSession {
        let store: Arc<dyn TokenStore> = match &config.session_file {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::new()),
        };
        SessionManager::new(store, HttpAuthApi::from_config(client, config))
    }

    /// Run a search and load the requested number of pages
    async fn search(&self, filters: &[String], pages: u32, all: bool) -> Result<()> {
        let config = self.load_config()?;
        let filters = parse_filters(filters)?;

        let client = HttpClient::with_config(config.http_config())?;
        let session = Arc::new(Self::session_manager(&config, client.clone()));
        session.init(config.validate_session).await?;

        let backend: HttpSearchBackend<FeedbackResult> =
            HttpSearchBackend::from_config(client.with_token_source(session), &config);
        let pager = ResultPager::with_page_size(backend, config.page_size);

        info!("Searching with {} filter(s)", filters.len());
        pager.search(filters).await?;

        let mut loaded = 1;
        while all || loaded < pages {
            if pager.snapshot().error.is_some() {
                break;
            }
            let Some(handle) = pager.load_more() else {
                break;
            };
            handle.await?;
            loaded += 1;
        }

        let state = pager.snapshot();
        self.output_message(&search_report(&state));

        match state.error {
            Some(message) => Err(Error::Other(message)),
            None => Ok(()),
        }
    }

    /// Establish and persist a session
    async fn login(&self, token: &str) -> Result<()> {
        let config = self.load_config()?;
        if config.session_file.is_none() {
            return Err(Error::config(
                "No session file configured (use --session-file or LMS_SESSION_FILE)",
            ));
        }

        let client = HttpClient::with_config(config.http_config())?;
        let session = Self::session_manager(&config, client)
            .establish(token)
            .await?;
        self.output_message(&session_report(Some(&session)));
        Ok(())
    }

    /// Show the persisted identity
    async fn whoami(&self, no_validate: bool) -> Result<()> {
        let config = self.load_config()?;
        let client = HttpClient::with_config(config.http_config())?;
        let manager = Self::session_manager(&config, client);

        let session = manager
            .init(config.validate_session && !no_validate)
            .await?;
        self.output_message(&session_report(session.as_ref()));
        Ok(())
    }

    /// Tear the session down locally and remotely
    async fn logout(&self) -> Result<()> {
        let config = self.load_config()?;
        let client = HttpClient::with_config(config.http_config())?;
        Self::session_manager(&config, client).teardown().await?;
        self.output_message(&session_report(None));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn parse_filters(pairs: &[String]) -> Result<SearchFilters> {
    let mut filters = SearchFilters::new();
    for pair in pairs {
        let (key, value) = SearchFilters::parse_pair(pair)?;
        filters.insert(key, value);
    }
    Ok(filters)
}

fn search_report<T: Serialize>(state: &PagerState<T>) -> Value {
    json!({
        "results": state.results,
        "count": state.len(),
        "total": state.total,
        "page": state.current_page,
        "hasMore": state.has_more,
        "error": state.error,
    })
}

fn session_report(session: Option<&Session>) -> Value {
    match session {
        Some(session) => json!({
            "authenticated": true,
            "user": session.user,
            "expiresAt": session.expires_at,
        }),
        None => json!({ "authenticated": false }),
    }
}
