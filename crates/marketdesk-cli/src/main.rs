//! marketdesk - command-line admin console for the marketplace API.
//!
//! Signs in against the admin API, keeps the session sealed on disk between
//! runs, and prints dashboard figures and resource lists as plain tables.

mod args;
mod commands;
mod output;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use marketdesk_core::api::{http_client, requires_login, AdminClient, AuthApi};
use marketdesk_core::auth::{SessionContext, SessionManager, SessionStore};
use marketdesk_core::cache::CacheManager;
use marketdesk_core::config::{Config, Settings};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Command, USAGE};
use commands::App;

/// Log file name prefix inside the cache directory; rotated daily.
const LOG_FILE_PREFIX: &str = "marketdesk.log";

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: ignoring unreadable config: {:#}", e);
        Config::default()
    });
    let cache_dir = config
        .cache_dir()
        .ok()
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());
    let _log_guard = init_tracing(cache_dir.as_deref());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let Some(cache_dir) = cache_dir else {
        eprintln!("Error: could not create a cache directory for the session");
        return ExitCode::FAILURE;
    };

    let mut app = match build_app(config, &cache_dir) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(command = ?command, "marketdesk starting");
    match app.run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if requires_login(&e) => {
            // Back to the login entry point
            app.sign_out();
            eprintln!("{}", e.root_cause());
            eprintln!("Please log in again: marketdesk login <email>");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Wire settings, the session and the API client together.
fn build_app(config: Config, cache_dir: &Path) -> Result<App> {
    let mut settings = Settings::from_env().context("Missing configuration")?;
    if let Some(ref url) = config.api_url {
        settings = settings.with_api_url(url);
    }

    let http = http_client()?;
    let auth = AuthApi::new(http.clone(), settings.api_url.clone());
    let store = SessionStore::new(cache_dir.to_path_buf(), settings.session_secret.clone());
    let session = SessionContext::new(SessionManager::new(auth)).with_store(store);

    match session.restore() {
        Ok(true) => info!("Restored saved session"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Could not restore saved session"),
    }

    let client = AdminClient::new(http, settings.api_url, session);
    let cache = CacheManager::new(cache_dir.join("responses"))?
        .with_stale_minutes(config.stale_minutes());

    Ok(App::new(client, cache, config))
}
