//! Site file schema.
//!
//! These types are deserialized from the YAML site file. Everything except
//! the `site` block has a default, so a minimal file only names the owner.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::view::{DEFAULT_SCROLL_BIAS, DEFAULT_SECTIONS, TypewriterTimings};

// ============================================================================
// Top-Level Configuration
// ============================================================================

/// Root of a site file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SiteConfig {
    /// Page metadata (required)
    pub site: SiteMetadata,

    /// Section order and scroll spy tuning
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Hero typewriter settings
    #[serde(default)]
    pub typewriter: TypewriterConfig,

    /// Call-to-action buttons in the hero section
    #[serde(default)]
    pub hero_actions: Vec<HeroAction>,

    /// About section
    #[serde(default)]
    pub about: AboutConfig,

    /// Education entries, shown in the about section
    #[serde(default)]
    pub education: Vec<Education>,

    /// Certification titles
    #[serde(default)]
    pub certifications: Vec<String>,

    /// Skill categories
    #[serde(default)]
    pub skills: Vec<SkillCategory>,

    /// Project gallery
    #[serde(default)]
    pub projects: Vec<Project>,

    /// Contact section and form relay
    #[serde(default)]
    pub contact: ContactConfig,

    /// `folio serve` settings
    #[serde(default)]
    pub server: ServerSettings,
}

impl SiteConfig {
    /// Text the hero typewriter animates: `typewriter.text`, or the owner's
    /// name when unset.
    #[must_use]
    pub fn typewriter_text(&self) -> &str {
        self.typewriter
            .text
            .as_deref()
            .unwrap_or(self.site.owner.as_str())
    }

    /// Iterates over every external link on the page with a label.
    pub fn external_links(&self) -> impl Iterator<Item = (String, &str)> {
        let contact = self
            .contact
            .links
            .iter()
            .map(|link| (link.label.clone(), link.url.as_str()));
        let resume = self
            .contact
            .resume_url
            .as_deref()
            .map(|url| ("resume".to_string(), url));
        let projects = self.projects.iter().flat_map(|project| {
            let code = project
                .code_url
                .as_deref()
                .map(|url| (format!("{} (code)", project.title), url));
            let demo = project
                .demo_url
                .as_deref()
                .map(|url| (format!("{} (demo)", project.title), url));
            code.into_iter().chain(demo)
        });
        contact.chain(resume).chain(projects)
    }
}

// ============================================================================
// Site Metadata
// ============================================================================

/// Identity of the page owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMetadata {
    /// Document title
    pub title: String,

    /// Owner's full name
    pub owner: String,

    /// One-line role shown under the name
    #[serde(default)]
    pub role: String,

    /// Short introduction in the hero section
    #[serde(default)]
    pub summary: String,

    /// Footer text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

// ============================================================================
// Layout
// ============================================================================

/// Section order and scroll spy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Section ids in document order
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,

    /// Pixels added to the scroll offset before matching a section
    #[serde(default = "default_scroll_bias")]
    pub scroll_bias: f64,

    /// Render a dot that follows the pointer
    #[serde(default)]
    pub cursor_follower: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            scroll_bias: DEFAULT_SCROLL_BIAS,
            cursor_follower: false,
        }
    }
}

fn default_sections() -> Vec<String> {
    DEFAULT_SECTIONS.iter().map(ToString::to_string).collect()
}

const fn default_scroll_bias() -> f64 {
    DEFAULT_SCROLL_BIAS
}

// ============================================================================
// Typewriter
// ============================================================================

/// Hero typewriter settings. Intervals are `humantime` strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypewriterConfig {
    /// Text to animate (defaults to the owner's name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Delay between typed characters
    #[serde(default = "default_type_interval")]
    pub type_interval: String,

    /// Delay between deleted characters
    #[serde(default = "default_delete_interval")]
    pub delete_interval: String,

    /// Pause with the full text shown
    #[serde(default = "default_pause_full")]
    pub pause_full: String,

    /// Pause with nothing shown
    #[serde(default = "default_pause_empty")]
    pub pause_empty: String,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            text: None,
            type_interval: default_type_interval(),
            delete_interval: default_delete_interval(),
            pause_full: default_pause_full(),
            pause_empty: default_pause_empty(),
        }
    }
}

impl TypewriterConfig {
    /// Parses the configured intervals. Unparseable values fall back to the
    /// defaults; the validator reports them.
    #[must_use]
    pub fn timings(&self) -> TypewriterTimings {
        let defaults = TypewriterTimings::default();
        TypewriterTimings {
            type_interval: parse_or(&self.type_interval, defaults.type_interval),
            delete_interval: parse_or(&self.delete_interval, defaults.delete_interval),
            pause_full: parse_or(&self.pause_full, defaults.pause_full),
            pause_empty: parse_or(&self.pause_empty, defaults.pause_empty),
        }
    }

    /// Field name and raw value of every interval.
    #[must_use]
    pub fn intervals(&self) -> [(&'static str, &str); 4] {
        [
            ("type_interval", self.type_interval.as_str()),
            ("delete_interval", self.delete_interval.as_str()),
            ("pause_full", self.pause_full.as_str()),
            ("pause_empty", self.pause_empty.as_str()),
        ]
    }
}

fn default_type_interval() -> String {
    "100ms".to_string()
}

fn default_delete_interval() -> String {
    "50ms".to_string()
}

fn default_pause_full() -> String {
    "2s".to_string()
}

fn default_pause_empty() -> String {
    "500ms".to_string()
}

fn parse_or(raw: &str, fallback: Duration) -> Duration {
    humantime::parse_duration(raw).unwrap_or(fallback)
}

// ============================================================================
// Content
// ============================================================================

/// Button in the hero section that scrolls to a section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroAction {
    /// Button label
    pub label: String,

    /// Section id to navigate to
    pub target: String,
}

/// About section content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AboutConfig {
    /// Paragraphs of introduction
    #[serde(default)]
    pub paragraphs: Vec<String>,

    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Contact phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// City and country
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// An education entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    /// School or university
    pub institution: String,

    /// Degree and field
    pub degree: String,

    /// Graduation year or period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

/// A named group of skills.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCategory {
    /// Category heading
    pub title: String,

    /// Skill names
    #[serde(default)]
    pub skills: Vec<String>,
}

/// A project in the gallery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project name
    pub title: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Technologies used
    #[serde(default)]
    pub tech: Vec<String>,

    /// Decorative image: a file in the media directory, or a glyph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Source repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_url: Option<String>,

    /// Live demo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_url: Option<String>,
}

// ============================================================================
// Contact
// ============================================================================

/// Contact section and form relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Form relay URL the contact form posts to
    #[serde(default)]
    pub endpoint: String,

    /// Hidden `_subject` field sent with the form
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Section heading
    #[serde(default = "default_heading")]
    pub heading: String,

    /// Text above the form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blurb: Option<String>,

    /// Profile links
    #[serde(default)]
    pub links: Vec<Link>,

    /// Downloadable resume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            subject: default_subject(),
            heading: default_heading(),
            blurb: None,
            links: Vec::new(),
            resume_url: None,
        }
    }
}

fn default_subject() -> String {
    "New message from portfolio".to_string()
}

fn default_heading() -> String {
    "Get In Touch".to_string()
}

/// A labelled hyperlink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Link text
    pub label: String,

    /// Target URL
    pub url: String,
}

// ============================================================================
// Server
// ============================================================================

/// Settings for `folio serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Directory with decorative images
    #[serde(default = "default_media_dir")]
    pub media_dir: String,

    /// Idle time after which a page view is torn down (`humantime`)
    #[serde(default = "default_idle_timeout")]
    pub session_idle_timeout: String,

    /// Maximum number of concurrent page views
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            media_dir: default_media_dir(),
            session_idle_timeout: default_idle_timeout(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl ServerSettings {
    /// Parsed idle timeout, falling back to 30 minutes.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        parse_or(&self.session_idle_timeout, Duration::from_secs(30 * 60))
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_media_dir() -> String {
    "media".to_string()
}

fn default_idle_timeout() -> String {
    "30m".to_string()
}

const fn default_max_sessions() -> usize {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "site:\n  title: Test\n  owner: Ada Lovelace\n";

    #[test]
    fn test_minimal_site_uses_defaults() {
        let config: SiteConfig = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(config.layout.sections, default_sections());
        assert!((config.layout.scroll_bias - 100.0).abs() < f64::EPSILON);
        assert!(!config.layout.cursor_follower);
        assert_eq!(config.typewriter_text(), "Ada Lovelace");
        assert_eq!(config.typewriter.timings(), TypewriterTimings::default());
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.idle_timeout(), Duration::from_secs(1800));
        assert_eq!(config.contact.subject, "New message from portfolio");
    }

    #[test]
    fn test_typewriter_text_override() {
        let yaml = format!("{MINIMAL}typewriter:\n  text: Hello\n  type_interval: 10ms\n");
        let config: SiteConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.typewriter_text(), "Hello");
        assert_eq!(
            config.typewriter.timings().type_interval,
            Duration::from_millis(10)
        );
    }

    #[test]
    fn test_invalid_interval_falls_back() {
        let config = TypewriterConfig {
            pause_full: "soon".to_string(),
            ..TypewriterConfig::default()
        };
        assert_eq!(config.timings().pause_full, Duration::from_secs(2));
    }

    #[test]
    fn test_missing_site_block_fails() {
        let result: Result<SiteConfig, _> = serde_yaml::from_str("layout:\n  cursor_follower: true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_external_links() {
        let yaml = format!(
            "{MINIMAL}contact:\n  links:\n    - label: GitHub\n      url: https://github.com/x\n  resume_url: https://example.com/cv.pdf\nprojects:\n  - title: Demo\n    code_url: https://github.com/x/demo\n"
        );
        let config: SiteConfig = serde_yaml::from_str(&yaml).unwrap();
        let links: Vec<_> = config.external_links().collect();
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].0, "GitHub");
        assert_eq!(links[1].0, "resume");
        assert_eq!(links[2].0, "Demo (code)");
    }
}
