//! HTML rendering of the site file.

pub mod assets;
pub mod escape;
pub mod page;

pub use escape::escape_html;
pub use page::{PLACEHOLDER_GLYPH, RenderMode, RenderOptions, render_page, section_label};
