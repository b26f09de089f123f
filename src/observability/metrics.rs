//! Prometheus metrics.
//!
//! Label values that originate from clients are checked against fixed lists
//! so a misbehaving page cannot grow the label set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::FolioError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Client message kinds accepted as label values.
const KNOWN_EVENT_KINDS: [&str; 6] = [
    "layout",
    "scroll",
    "pointer_move",
    "toggle_menu",
    "navigate",
    "teardown",
];

/// Maximum length for section labels.
const MAX_SECTION_LABEL_LEN: usize = 64;

/// Returns `kind` if it is a known client message kind, `"__unknown__"`
/// otherwise.
#[must_use]
pub fn sanitize_event_kind(kind: &str) -> &str {
    if KNOWN_EVENT_KINDS.contains(&kind) {
        kind
    } else {
        "__unknown__"
    }
}

/// Truncates a section id and replaces characters invalid in Prometheus
/// labels with underscores.
fn sanitize_section_label(section: &str) -> String {
    section
        .chars()
        .take(MAX_SECTION_LABEL_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Installs the global metrics recorder.
///
/// With `Some(port)` a Prometheus scrape endpoint is served on
/// `127.0.0.1:<port>`; with `None` metrics are recorded but not exported.
///
/// # Errors
///
/// Returns `FolioError::Io` if the recorder or listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), FolioError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| FolioError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!("folio_page_views_total", "Rendered page responses");
    describe_counter!("folio_sessions_opened_total", "Page view sessions opened");
    describe_gauge!("folio_sessions_active", "Page view sessions currently open");
    describe_counter!(
        "folio_view_events_total",
        "Client view events applied, by kind"
    );
    describe_counter!(
        "folio_view_events_ignored_total",
        "Client view events dropped, by kind"
    );
    describe_counter!(
        "folio_section_activations_total",
        "Scroll spy activations, by section"
    );
    describe_counter!(
        "folio_navigations_total",
        "Navigation requests, by outcome"
    );
    describe_histogram!(
        "folio_event_duration_ms",
        "Time to apply a view event in milliseconds"
    );
    describe_counter!("folio_errors_total", "Errors by category");
}

/// Records a rendered page.
pub fn record_page_view() {
    counter!("folio_page_views_total").increment(1);
}

/// Records a new session.
pub fn record_session_opened() {
    counter!("folio_sessions_opened_total").increment(1);
}

/// Sets the number of open sessions.
#[allow(clippy::cast_precision_loss)]
pub fn set_sessions_active(count: usize) {
    gauge!("folio_sessions_active").set(count as f64);
}

/// Records an applied or dropped view event.
pub fn record_view_event(kind: &str, ignored: bool, duration: Duration) {
    let label = sanitize_event_kind(kind).to_owned();
    if ignored {
        counter!("folio_view_events_ignored_total", "kind" => label).increment(1);
        return;
    }
    histogram!("folio_event_duration_ms", "kind" => label.clone())
        .record(duration.as_secs_f64() * 1000.0);
    counter!("folio_view_events_total", "kind" => label).increment(1);
}

/// Records a section becoming active.
pub fn record_section_activation(section: &str) {
    counter!(
        "folio_section_activations_total",
        "section" => sanitize_section_label(section)
    )
    .increment(1);
}

/// Records a navigation request.
pub fn record_navigation(scrolled: bool) {
    let outcome = if scrolled { "scrolled" } else { "unmounted" };
    counter!("folio_navigations_total", "outcome" => outcome).increment(1);
}

/// Records an error by category.
pub fn record_error(category: &'static str) {
    counter!("folio_errors_total", "category" => category).increment(1);
}
