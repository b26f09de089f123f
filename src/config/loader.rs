//! Site file loader.
//!
//! Pipeline:
//! 1. Size limit check and UTF-8 BOM strip
//! 2. Environment variable expansion (on raw text, before parsing)
//! 3. YAML parsing and typed deserialization
//! 4. Validation
//! 5. Freeze with `Arc`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::schema::SiteConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

/// Site file compiled into the binary, used when no `--config` is given.
pub const DEFAULT_SITE: &str = include_str!("default_site.yaml");

/// Display name of the embedded site file in diagnostics.
pub const DEFAULT_SITE_NAME: &str = "<built-in site>";

// ============================================================================
// Public API
// ============================================================================

/// Options for the site loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Limits for site file size and content.
    pub config_limits: ConfigLimits,
}

/// Limits on site file size and content.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum site file size in bytes.
    pub max_config_size: usize,

    /// Maximum number of sections.
    pub max_sections: usize,

    /// Maximum number of projects.
    pub max_projects: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or("FOLIO_MAX_CONFIG_SIZE", 1024 * 1024),
            max_sections: env_or("FOLIO_MAX_SECTIONS", 32),
            max_projects: env_or("FOLIO_MAX_PROJECTS", 200),
        }
    }
}

/// Result of loading a site file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated site.
    pub config: Arc<SiteConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during site file loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {location}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Site file loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads and validates a site file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - A required environment variable is unset
    /// - YAML parsing or deserialization fails
    /// - Validation reports errors
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let limit = self.options.config_limits.max_config_size;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > limit {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {limit} bytes"),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        tracing::debug!(path = %path.display(), bytes = file_size, "loading site file");
        self.load_str(&raw, path)
    }

    /// Loads and validates a site file from a string.
    ///
    /// `path` is only used in diagnostics.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::load`], minus file access.
    pub fn load_str(&self, raw: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        let limit = self.options.config_limits.max_config_size;
        if raw.len() > limit {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{} bytes", raw.len()),
                expected: format!("at most {limit} bytes"),
            });
        }

        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let mut env_sub = EnvSubstitution::new(path);
        let substituted = env_sub.substitute(raw)?;
        let mut warnings = env_sub.warnings;

        let root: serde_yaml::Value =
            serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "Site file is empty".to_string(),
            });
        }

        let config: SiteConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: format!("Failed to deserialize site file: {e}"),
            })?;

        let result = Validator::new().validate(&config, &self.options.config_limits);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: result.errors,
            });
        }

        warnings.extend(result.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }

    /// Loads the site file compiled into the binary.
    ///
    /// # Errors
    ///
    /// Fails only if an environment override produces an invalid site.
    pub fn load_default(&self) -> Result<LoadResult, ConfigError> {
        self.load_str(DEFAULT_SITE, Path::new(DEFAULT_SITE_NAME))
    }
}

// ============================================================================
// Environment Variable Substitution
// ============================================================================

/// Pre-parse environment variable substitution on raw YAML text.
struct EnvSubstitution {
    source: PathBuf,
    warnings: Vec<LoadWarning>,
}

impl EnvSubstitution {
    fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            warnings: Vec::new(),
        }
    }

    /// Expands environment references.
    ///
    /// Supports:
    /// - `${VAR}` - value, or empty string with a warning if unset
    /// - `${VAR:-default}` - default if unset
    /// - `${VAR:?message}` - error if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, raw: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    out.push('$');
                }
                Some('{') => {
                    chars.next();
                    let reference = self.parse_reference(&mut chars)?;
                    self.expand(reference, &mut out)?;
                }
                _ => out.push(c),
            }
        }

        Ok(out)
    }

    fn expand(&mut self, reference: VarRef, out: &mut String) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var(&reference.name) {
            out.push_str(&value);
            return Ok(());
        }
        match reference.fallback {
            Fallback::Default(default) => out.push_str(&default),
            Fallback::Required(message) => {
                return Err(ConfigError::EnvVarNotSet {
                    var: reference.name,
                    location: message,
                });
            }
            Fallback::Empty => self.warnings.push(LoadWarning {
                message: format!(
                    "Environment variable '{}' is not set, using empty string",
                    reference.name
                ),
                location: Some(self.source.display().to_string()),
            }),
        }
        Ok(())
    }

    fn parse_reference(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars>,
    ) -> Result<VarRef, ConfigError> {
        let mut name = String::new();

        while let Some(c) = chars.next() {
            match c {
                '}' => {
                    return Ok(VarRef {
                        name,
                        fallback: Fallback::Empty,
                    });
                }
                ':' if chars.peek() == Some(&'-') => {
                    chars.next();
                    let default = self.read_until_close(chars, &name)?;
                    return Ok(VarRef {
                        name,
                        fallback: Fallback::Default(default),
                    });
                }
                ':' if chars.peek() == Some(&'?') => {
                    chars.next();
                    let message = self.read_until_close(chars, &name)?;
                    return Ok(VarRef {
                        name,
                        fallback: Fallback::Required(message),
                    });
                }
                _ => name.push(c),
            }
        }

        Err(self.unclosed(&name))
    }

    /// Reads until the matching `}`, allowing nested braces.
    fn read_until_close(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars>,
        name: &str,
    ) -> Result<String, ConfigError> {
        let mut value = String::new();
        let mut depth = 1usize;

        for c in chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(value);
                    }
                }
                _ => {}
            }
            value.push(c);
        }

        Err(self.unclosed(name))
    }

    fn unclosed(&self, name: &str) -> ConfigError {
        ConfigError::ParseError {
            path: self.source.clone(),
            line: None,
            message: format!("Unclosed environment variable reference: ${{{name}"),
        }
    }
}

struct VarRef {
    name: String,
    fallback: Fallback,
}

enum Fallback {
    Empty,
    Default(String),
    Required(String),
}

// ============================================================================
// Helper Functions
// ============================================================================

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================
