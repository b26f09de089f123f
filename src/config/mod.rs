//! Site file configuration.
//!
//! Loads and validates the YAML file describing the page content, section
//! layout, typewriter timing and server settings.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::*;
pub use validation::{ValidationResult, Validator};
