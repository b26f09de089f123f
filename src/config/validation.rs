//! Site file validation.
//!
//! Validation runs on the deserialized [`SiteConfig`] and collects every
//! issue instead of stopping at the first one.

use std::collections::HashSet;

use crate::config::loader::ConfigLimits;
use crate::config::schema::SiteConfig;
use crate::error::{Severity, ValidationIssue};

// ============================================================================
// Public API
// ============================================================================

/// Result of site file validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Site file validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a site file and returns every issue found.
    pub fn validate(&mut self, config: &SiteConfig, limits: &ConfigLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_metadata(config);
        self.validate_layout(config, limits);
        self.validate_typewriter(config);
        self.validate_hero_actions(config);
        self.validate_skills(config);
        self.validate_projects(config, limits);
        self.validate_contact(config);
        self.validate_server(config);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Sections
    // ========================================================================

    fn validate_metadata(&mut self, config: &SiteConfig) {
        if config.site.owner.trim().is_empty() {
            self.add_error("site.owner", "Owner name is required and cannot be empty");
        }
        if config.site.title.trim().is_empty() {
            self.add_error("site.title", "Page title is required and cannot be empty");
        }
    }

    fn validate_layout(&mut self, config: &SiteConfig, limits: &ConfigLimits) {
        let sections = &config.layout.sections;
        if sections.is_empty() {
            self.add_error("layout.sections", "At least one section is required");
        }
        if sections.len() > limits.max_sections {
            self.add_error(
                "layout.sections",
                &format!(
                    "Too many sections: {} (limit: {})",
                    sections.len(),
                    limits.max_sections
                ),
            );
        }

        let mut seen = HashSet::new();
        for (i, id) in sections.iter().enumerate() {
            let path = format!("layout.sections[{i}]");
            if id.trim().is_empty() {
                self.add_error(&path, "Section id cannot be empty");
            } else if !is_valid_section_id(id) {
                self.add_error(
                    &path,
                    &format!("Section id '{id}' may only contain letters, digits, '-' and '_'"),
                );
            }
            if !seen.insert(id.as_str()) {
                self.add_error(&path, &format!("Duplicate section id '{id}'"));
            }
        }

        let bias = config.layout.scroll_bias;
        if !bias.is_finite() || bias < 0.0 {
            self.add_error(
                "layout.scroll_bias",
                &format!("Scroll bias must be a finite non-negative number, got {bias}"),
            );
        }
    }

    fn validate_typewriter(&mut self, config: &SiteConfig) {
        if config.typewriter_text().trim().is_empty() {
            self.add_error("typewriter.text", "Typewriter text cannot be empty");
        }
        for (field, raw) in config.typewriter.intervals() {
            let path = format!("typewriter.{field}");
            match humantime::parse_duration(raw) {
                Ok(duration) if duration.is_zero() => {
                    self.add_error(&path, "Interval must be greater than zero");
                }
                Ok(_) => {}
                Err(e) => {
                    self.add_error(&path, &format!("Invalid duration '{raw}': {e}"));
                }
            }
        }
    }

    fn validate_hero_actions(&mut self, config: &SiteConfig) {
        for (i, action) in config.hero_actions.iter().enumerate() {
            let path = format!("hero_actions[{i}].target");
            if config.layout.sections.iter().any(|s| *s == action.target) {
                continue;
            }
            let message = match suggest_section(&action.target, &config.layout.sections) {
                Some(hint) => format!(
                    "Unknown section '{}' (did you mean '{hint}'?)",
                    action.target
                ),
                None => format!("Unknown section '{}'", action.target),
            };
            self.add_error(&path, &message);
        }
    }

    fn validate_skills(&mut self, config: &SiteConfig) {
        for (i, category) in config.skills.iter().enumerate() {
            if category.skills.is_empty() {
                self.add_warning(
                    &format!("skills[{i}]"),
                    &format!("Skill category '{}' has no skills", category.title),
                );
            }
        }
    }

    fn validate_projects(&mut self, config: &SiteConfig, limits: &ConfigLimits) {
        if config.projects.len() > limits.max_projects {
            self.add_error(
                "projects",
                &format!(
                    "Too many projects: {} (limit: {})",
                    config.projects.len(),
                    limits.max_projects
                ),
            );
        }

        let mut seen = HashSet::new();
        for (i, project) in config.projects.iter().enumerate() {
            let path = format!("projects[{i}]");
            if project.title.trim().is_empty() {
                self.add_error(&format!("{path}.title"), "Project title cannot be empty");
            }
            if !seen.insert(project.title.as_str()) {
                self.add_warning(
                    &format!("{path}.title"),
                    &format!("Duplicate project title '{}'", project.title),
                );
            }
            for (field, url) in [("code_url", &project.code_url), ("demo_url", &project.demo_url)]
            {
                if let Some(url) = url {
                    self.check_url(&format!("{path}.{field}"), url);
                }
            }
        }
    }

    fn validate_contact(&mut self, config: &SiteConfig) {
        let endpoint = config.contact.endpoint.trim();
        if endpoint.is_empty() {
            self.add_error("contact.endpoint", "Form endpoint is required");
        } else if !endpoint.starts_with("https://") {
            self.add_error(
                "contact.endpoint",
                &format!("Form endpoint must use https, got '{endpoint}'"),
            );
        }
        for (i, link) in config.contact.links.iter().enumerate() {
            self.check_url(&format!("contact.links[{i}].url"), &link.url);
        }
        if let Some(resume) = &config.contact.resume_url {
            self.check_url("contact.resume_url", resume);
        }
    }

    fn validate_server(&mut self, config: &SiteConfig) {
        if config.server.bind.parse::<std::net::SocketAddr>().is_err() {
            self.add_error(
                "server.bind",
                &format!("Invalid listen address '{}'", config.server.bind),
            );
        }
        if config.server.max_sessions == 0 {
            self.add_error("server.max_sessions", "Must allow at least one session");
        }
        if let Err(e) = humantime::parse_duration(&config.server.session_idle_timeout) {
            self.add_error(
                "server.session_idle_timeout",
                &format!(
                    "Invalid duration '{}': {e}",
                    config.server.session_idle_timeout
                ),
            );
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn check_url(&mut self, path: &str, url: &str) {
        if !(url.starts_with("https://") || url.starts_with("http://") || url.starts_with('/')) {
            self.add_warning(path, &format!("Link '{url}' is not an http(s) URL"));
        }
    }

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn is_valid_section_id(id: &str) -> bool {
    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Suggests the closest configured section for a misspelled target.
///
/// Returns a match only if its Damerau-Levenshtein distance is at most 3.
#[must_use]
pub fn suggest_section(input: &str, sections: &[String]) -> Option<String> {
    sections
        .iter()
        .map(|s| (s, strsim::damerau_levenshtein(input, s)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(name, _)| name.clone())
}

// ============================================================================
// Tests
// ============================================================================
