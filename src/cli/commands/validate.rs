//! `validate` command handler.
//!
//! Loads each site file, reports every error and warning, and optionally
//! checks that external links respond.

use std::path::Path;
use std::time::Duration;

use futures_util::future::join_all;
use reqwest::{StatusCode, redirect};
use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadWarning, SiteConfig};
use crate::error::{ConfigError, FolioError, Severity, ValidationIssue};

/// Timeout for a single link check.
const LINK_TIMEOUT: Duration = Duration::from_secs(10);

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct IssueReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    message: String,
}

impl From<&ValidationIssue> for IssueReport {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            path: Some(issue.path.clone()),
            message: issue.message.clone(),
        }
    }
}

impl From<&LoadWarning> for IssueReport {
    fn from(warning: &LoadWarning) -> Self {
        Self {
            path: warning.location.clone(),
            message: warning.message.clone(),
        }
    }
}

/// Validation outcome for one file.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    errors: Vec<IssueReport>,
    warnings: Vec<IssueReport>,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            file: path.display().to_string(),
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Settles `valid`: errors always fail, warnings fail in strict mode.
    fn finish(&mut self, strict: bool) {
        self.valid = self.errors.is_empty() && !(strict && !self.warnings.is_empty());
    }

    fn failing_issues(&self, strict: bool) -> impl Iterator<Item = ValidationIssue> + '_ {
        let warnings = if strict { self.warnings.as_slice() } else { &[] };
        self.errors.iter().chain(warnings).map(|issue| ValidationIssue {
            path: issue.path.clone().unwrap_or_else(|| self.file.clone()),
            message: issue.message.clone(),
            severity: Severity::Error,
        })
    }
}

/// Validate site files without serving them.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] listing every failing file
/// when any file has errors (or warnings, with `--strict`).
pub async fn run(args: &ValidateArgs) -> Result<(), FolioError> {
    let loader = ConfigLoader::with_defaults();
    let client = if args.check_links {
        Some(link_client()?)
    } else {
        None
    };

    let mut reports = Vec::with_capacity(args.files.len());
    for path in &args.files {
        tracing::info!(file = %path.display(), "validating site file");
        let mut report = FileReport::new(path);

        match loader.load(path) {
            Ok(result) => {
                report
                    .warnings
                    .extend(result.warnings.iter().map(IssueReport::from));
                if let Some(client) = &client {
                    report
                        .warnings
                        .extend(check_links(client, &result.config).await);
                }
            }
            Err(ConfigError::ValidationError { errors, .. }) => {
                report.errors.extend(errors.iter().map(IssueReport::from));
            }
            Err(e) => report.errors.push(IssueReport {
                path: None,
                message: e.to_string(),
            }),
        }

        report.finish(args.strict);
        reports.push(report);
    }

    print_reports(&reports, args.format)?;

    let failed: Vec<&FileReport> = reports.iter().filter(|r| !r.valid).collect();
    if failed.is_empty() {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        path: failed
            .iter()
            .map(|r| r.file.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        errors: failed
            .iter()
            .flat_map(|r| r.failing_issues(args.strict))
            .collect(),
    }
    .into())
}

fn print_reports(reports: &[FileReport], format: OutputFormat) -> Result<(), FolioError> {
    match format {
        OutputFormat::Human => {
            for report in reports {
                let mark = if report.valid { "✓" } else { "✗" };
                println!("{mark} {}", report.file);
                for (label, issues) in [("error", &report.errors), ("warning", &report.warnings)] {
                    for issue in issues {
                        match &issue.path {
                            Some(path) => println!("  {label}: {} at {path}", issue.message),
                            None => println!("  {label}: {}", issue.message),
                        }
                    }
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reports)?);
        }
    }
    Ok(())
}

// ============================================================================
// Link checking
// ============================================================================

fn link_client() -> Result<reqwest::Client, FolioError> {
    reqwest::Client::builder()
        .timeout(LINK_TIMEOUT)
        .redirect(redirect::Policy::limited(5))
        .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FolioError::Io(std::io::Error::other(e.to_string())))
}

/// Checks every `http(s)` link of the site concurrently and returns one
/// warning per broken link.
async fn check_links(client: &reqwest::Client, site: &SiteConfig) -> Vec<IssueReport> {
    let checks = site
        .external_links()
        .filter(|(_, url)| url.starts_with("http://") || url.starts_with("https://"))
        .map(|(label, url)| async move {
            check_link(client, url).await.err().map(|reason| IssueReport {
                path: Some(format!("link '{label}'")),
                message: format!("link check failed for {url}: {reason}"),
            })
        });
    join_all(checks).await.into_iter().flatten().collect()
}

/// HEAD request, falling back to GET for servers that reject HEAD.
async fn check_link(client: &reqwest::Client, url: &str) -> Result<(), String> {
    let mut status = client
        .head(url)
        .send()
        .await
        .map_err(|e| e.to_string())?
        .status();
    if status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED {
        status = client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .status();
    }
    tracing::debug!(url, %status, "link checked");
    if status.is_success() || status.is_redirection() {
        Ok(())
    } else {
        Err(format!("HTTP {status}"))
    }
}
