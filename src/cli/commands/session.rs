//! `session` command handler.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::{load_site, open_emitter};
use crate::cli::args::SessionArgs;
use crate::error::FolioError;
use crate::observability::{Event, EventEmitter};
use crate::server::{Server, ServerOptions};
use crate::transport::{StdioTransport, Transport};
use crate::view::ViewOptions;

/// Drive one page view over stdin/stdout until EOF, `teardown`, or
/// cancellation.
///
/// Structured events go to stderr (or `--events-file`); stdout carries
/// only protocol messages.
///
/// # Errors
///
/// Returns a config error if the site file is invalid, or a transport
/// error if stdin/stdout fail.
pub async fn run(args: &SessionArgs, cancel: CancellationToken) -> Result<(), FolioError> {
    let site = load_site(args.config.as_deref())?;
    let event_emitter = open_emitter(args.events_file.as_deref(), EventEmitter::stderr)?;
    let transport: Arc<dyn Transport> = Arc::new(StdioTransport::new());

    event_emitter.emit(Event::ServerStarted {
        timestamp: Utc::now(),
        site: site.site.title.clone(),
        transport: transport.transport_type().to_string(),
    });

    let server = Server::new(ServerOptions {
        view: ViewOptions::from(site.as_ref()),
        transport,
        event_emitter: Arc::clone(&event_emitter),
        typewriter: !args.no_typewriter,
        cancel,
    });
    let result = server.run().await;

    event_emitter.emit(Event::ServerStopped {
        timestamp: Utc::now(),
        reason: match &result {
            Ok(()) => "session ended".to_string(),
            Err(e) => format!("error: {e}"),
        },
    });
    result
}
