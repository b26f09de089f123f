//! `render` command handler.

use std::path::PathBuf;

use super::load_site;
use crate::cli::args::RenderArgs;
use crate::error::FolioError;
use crate::render::{RenderMode, RenderOptions, render_page};

/// Render the page as a standalone HTML file.
///
/// The stylesheet is inlined and no script is included; project images
/// are referenced relative to the output file (`media/<file>`).
///
/// # Errors
///
/// Returns a config error if the site file is invalid, or an I/O error if
/// the output cannot be written.
pub fn run(args: &RenderArgs) -> Result<(), FolioError> {
    let site = load_site(args.config.as_deref())?;
    let media_dir = args
        .media_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&site.server.media_dir));

    let html = render_page(
        &site,
        &RenderOptions {
            mode: RenderMode::Static,
            media_dir: Some(media_dir),
        },
    );

    match &args.output {
        Some(path) => {
            std::fs::write(path, &html)?;
            tracing::info!(output = %path.display(), bytes = html.len(), "page written");
        }
        None => print!("{html}"),
    }
    Ok(())
}
