//! `serve` command handler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::{load_site, open_emitter};
use crate::cli::args::ServeArgs;
use crate::error::FolioError;
use crate::observability::{Event, EventEmitter, init_metrics};
use crate::render::{RenderMode, RenderOptions, render_page};
use crate::session::{RegistryOptions, SessionRegistry};
use crate::transport::TransportType;
use crate::transport::http::{HttpConfig, HttpServer, parse_bind_addr};

/// Upper bound on how often idle sessions are swept.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Serve the page until cancelled.
///
/// # Errors
///
/// Returns a config error if the site file is invalid, or a transport
/// error if the listener cannot bind.
pub async fn run(args: &ServeArgs, cancel: CancellationToken) -> Result<(), FolioError> {
    if let Some(port) = args.metrics_port {
        init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let site = load_site(args.config.as_deref())?;
    let bind_addr = parse_bind_addr(args.bind.as_deref().unwrap_or(&site.server.bind))?;
    let media_dir = args
        .media_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&site.server.media_dir));
    if !media_dir.is_dir() {
        tracing::warn!(
            media_dir = %media_dir.display(),
            "media directory not found, project images fall back to placeholders"
        );
    }

    let event_emitter = open_emitter(args.events_file.as_deref(), EventEmitter::stderr)?;

    let page = render_page(
        &site,
        &RenderOptions {
            mode: RenderMode::Served,
            media_dir: Some(media_dir.clone()),
        },
    );

    let registry_options = RegistryOptions::from(site.as_ref());
    let sweep_interval = sweep_interval(registry_options.idle_timeout);
    let registry = Arc::new(SessionRegistry::new(
        registry_options,
        Arc::clone(&event_emitter),
        cancel.clone(),
    ));
    let sweeper = registry.spawn_sweeper(sweep_interval);

    let (server, bound_addr) = HttpServer::bind(
        HttpConfig::new(bind_addr, media_dir),
        page,
        Arc::clone(&registry),
        cancel.clone(),
    )
    .await?;

    event_emitter.emit(Event::ServerStarted {
        timestamp: Utc::now(),
        site: site.site.title.clone(),
        transport: TransportType::Http.to_string(),
    });
    eprintln!("folio: serving {} on http://{bound_addr}", site.site.owner);

    cancel.cancelled().await;
    tracing::info!("shutting down");

    server.wait().await;
    registry.close_all("shutdown");
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "session sweeper panicked");
    }

    event_emitter.emit(Event::ServerStopped {
        timestamp: Utc::now(),
        reason: "shutdown".to_string(),
    });
    Ok(())
}

/// A quarter of the idle timeout, between one second and a minute.
fn sweep_interval(idle_timeout: Duration) -> Duration {
    (idle_timeout / 4).clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL)
}
