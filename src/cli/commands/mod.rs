//! CLI command dispatch and handlers.
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod render;
pub mod serve;
pub mod session;
pub mod validate;
pub mod version;

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::config::{ConfigLoader, SiteConfig};
use crate::error::FolioError;
use crate::observability::EventEmitter;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), FolioError> {
    match cli.command {
        Commands::Serve(args) => serve::run(&args, cancel).await,
        Commands::Session(args) => session::run(&args, cancel).await,
        Commands::Render(args) => render::run(&args),
        Commands::Validate(args) => validate::run(&args).await,
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads the site file at `path`, or the built-in site when `None`, and
/// logs loader warnings.
///
/// # Errors
///
/// Returns a config error if the file is missing, malformed, or invalid.
pub fn load_site(path: Option<&Path>) -> Result<Arc<SiteConfig>, FolioError> {
    let loader = ConfigLoader::with_defaults();
    let result = if let Some(path) = path {
        tracing::info!(config = %path.display(), "loading site file");
        loader.load(path)?
    } else {
        tracing::info!("using built-in site");
        loader.load_default()?
    };

    for warning in &result.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
    Ok(result.config)
}

/// Opens the event emitter: `path` when given, `fallback` otherwise.
///
/// # Errors
///
/// Returns an I/O error if the events file cannot be created.
pub fn open_emitter(
    path: Option<&Path>,
    fallback: fn() -> EventEmitter,
) -> Result<Arc<EventEmitter>, FolioError> {
    let emitter = match path {
        Some(path) => EventEmitter::from_file(path)?,
        None => fallback(),
    };
    Ok(Arc::new(emitter))
}
