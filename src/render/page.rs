//! Page rendering.
//!
//! The page is rendered once from the site file. Interactive elements carry
//! `data-*` hooks the page script binds to:
//!
//! | Attribute | Element |
//! |-----------|---------|
//! | `data-section` | each section, value is the section id |
//! | `data-nav-link` | navigation entries and hero actions, value is the target id |
//! | `data-menu-toggle` | the mobile menu button |
//! | `data-menu` | the mobile menu |
//! | `data-typewriter` / `data-caret` | typewriter text and caret |
//! | `data-cursor` | the cursor follower |
//! | `data-fallback` | glyph shown when a project image fails to load |

use std::fmt::Write;
use std::path::{Path, PathBuf};

use super::assets;
use super::escape::escape_html as esc;
use crate::config::{
    AboutConfig, ContactConfig, Education, HeroAction, Project, SiteConfig, SkillCategory,
};

/// Glyph shown in place of a missing or broken project image.
pub const PLACEHOLDER_GLYPH: &str = "🖼️";

/// How the page will be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Served by `folio serve`: links the stylesheet and page script.
    #[default]
    Served,
    /// Standalone file: inlines the stylesheet, no script, typewriter text
    /// shown in full.
    Static,
}

/// Rendering options.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Delivery mode.
    pub mode: RenderMode,
    /// Directory holding project images. Images not found there render the
    /// placeholder glyph.
    pub media_dir: Option<PathBuf>,
}

/// What to show in a project card's image slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectImage<'a> {
    Media(&'a str),
    Glyph(&'a str),
    Placeholder,
}

fn classify_image<'a>(image: Option<&'a str>, media_dir: Option<&Path>) -> ProjectImage<'a> {
    let Some(image) = image.map(str::trim).filter(|s| !s.is_empty()) else {
        return ProjectImage::Placeholder;
    };
    if !assets::is_media_file_name(image) {
        return ProjectImage::Glyph(image);
    }
    match media_dir {
        Some(dir) if dir.join(image).is_file() => ProjectImage::Media(image),
        _ => {
            tracing::debug!(image, "project image not found, using placeholder");
            ProjectImage::Placeholder
        }
    }
}

/// Navigation label for a section id.
#[must_use]
pub fn section_label(id: &str) -> String {
    if id == "hero" {
        return "Home".to_string();
    }
    let words = id.replace(['-', '_'], " ");
    let mut chars = words.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Renders the full HTML document.
#[must_use]
pub fn render_page(config: &SiteConfig, options: &RenderOptions) -> String {
    let mut out = String::with_capacity(16 * 1024);
    let sections = &config.layout.sections;

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    out.push_str("<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(out, "<title>{}</title>", esc(&config.site.title));
    let _ = writeln!(
        out,
        "<meta name=\"description\" content=\"{}\">",
        esc(&config.site.role)
    );
    match options.mode {
        RenderMode::Served => {
            let _ = writeln!(out, "<link rel=\"stylesheet\" href=\"{}\">", assets::CSS_PATH);
        }
        RenderMode::Static => {
            let _ = writeln!(out, "<style>\n{}</style>", assets::CSS);
        }
    }
    out.push_str("</head>\n");

    let _ = writeln!(
        out,
        "<body data-sections=\"{}\" data-cursor-follower=\"{}\">",
        esc(&sections.join(",")),
        config.layout.cursor_follower
    );
    if config.layout.cursor_follower {
        out.push_str("<div class=\"cursor\" data-cursor hidden></div>\n");
    }

    render_nav(&mut out, config);

    out.push_str("<main>\n");
    for id in sections {
        match id.as_str() {
            "hero" => render_hero(&mut out, config, options.mode),
            "about" => render_about(
                &mut out,
                &config.about,
                &config.education,
                &config.certifications,
            ),
            "skills" => render_skills(&mut out, &config.skills),
            "projects" => render_projects(&mut out, &config.projects, options),
            "contact" => render_contact(&mut out, &config.contact),
            other => {
                let _ = writeln!(
                    out,
                    "<section id=\"{id}\" class=\"section\" data-section=\"{id}\">\n<h2>{label}</h2>\n</section>",
                    id = esc(other),
                    label = esc(&section_label(other)),
                );
            }
        }
    }
    out.push_str("</main>\n");

    let footer = config
        .site
        .footer
        .clone()
        .unwrap_or_else(|| format!("© {}", config.site.owner));
    let _ = writeln!(out, "<footer class=\"footer\"><p>{}</p></footer>", esc(&footer));

    if options.mode == RenderMode::Served {
        let _ = writeln!(out, "<script src=\"{}\" defer></script>", assets::JS_PATH);
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn nav_link(out: &mut String, id: &str, class: &str) {
    let _ = writeln!(
        out,
        "<a class=\"{class}\" href=\"#{id}\" data-nav-link=\"{id}\">{label}</a>",
        id = esc(id),
        label = esc(&section_label(id)),
    );
}

fn render_nav(out: &mut String, config: &SiteConfig) {
    let sections = &config.layout.sections;
    let first = sections.first().map_or("hero", String::as_str);

    out.push_str("<nav class=\"navbar\" data-nav>\n");
    let _ = writeln!(
        out,
        "<a class=\"brand\" href=\"#{id}\" data-nav-link=\"{id}\">{owner}</a>",
        id = esc(first),
        owner = esc(&config.site.owner),
    );
    out.push_str("<div class=\"nav-links\">\n");
    for (i, id) in sections.iter().enumerate() {
        nav_link(out, id, if i == 0 { "nav-link active" } else { "nav-link" });
    }
    out.push_str("</div>\n");
    out.push_str(
        "<button class=\"menu-button\" type=\"button\" data-menu-toggle \
         aria-controls=\"mobile-menu\" aria-expanded=\"false\" aria-label=\"Menu\">☰</button>\n",
    );
    out.push_str("</nav>\n");

    out.push_str("<div class=\"mobile-menu\" id=\"mobile-menu\" data-menu hidden>\n");
    for id in sections {
        nav_link(out, id, "nav-link");
    }
    out.push_str("</div>\n");
}

fn render_hero(out: &mut String, config: &SiteConfig, mode: RenderMode) {
    let (text, caret_hidden) = match mode {
        RenderMode::Served => ("", " hidden"),
        RenderMode::Static => (config.typewriter_text(), ""),
    };
    out.push_str("<section id=\"hero\" class=\"section hero\" data-section=\"hero\">\n");
    out.push_str("<p class=\"greeting\">Hi, I'm</p>\n");
    let _ = writeln!(
        out,
        "<h1 class=\"typewriter\"><span data-typewriter>{}</span><span class=\"caret\" data-caret{caret_hidden}>|</span></h1>",
        esc(text)
    );
    let _ = writeln!(out, "<p class=\"role\">{}</p>", esc(&config.site.role));
    let _ = writeln!(out, "<p class=\"summary\">{}</p>", esc(&config.site.summary));
    render_hero_actions(out, &config.hero_actions);
    out.push_str("</section>\n");
}

fn render_hero_actions(out: &mut String, actions: &[HeroAction]) {
    if actions.is_empty() {
        return;
    }
    out.push_str("<div class=\"hero-actions\">\n");
    for (i, action) in actions.iter().enumerate() {
        let class = if i == 0 { "button primary" } else { "button" };
        let _ = writeln!(
            out,
            "<a class=\"{class}\" href=\"#{target}\" data-nav-link=\"{target}\">{label}</a>",
            target = esc(&action.target),
            label = esc(&action.label),
        );
    }
    out.push_str("</div>\n");
}

fn render_about(
    out: &mut String,
    about: &AboutConfig,
    education: &[Education],
    certifications: &[String],
) {
    out.push_str("<section id=\"about\" class=\"section about\" data-section=\"about\">\n");
    out.push_str("<h2>About Me</h2>\n");
    for paragraph in &about.paragraphs {
        let _ = writeln!(out, "<p>{}</p>", esc(paragraph));
    }

    let details: Vec<String> = [
        about
            .email
            .as_deref()
            .map(|e| format!("<li><a href=\"mailto:{0}\">{0}</a></li>", esc(e))),
        about
            .phone
            .as_deref()
            .map(|p| format!("<li><a href=\"tel:{0}\">{0}</a></li>", esc(p))),
        about.location.as_deref().map(|l| format!("<li>{}</li>", esc(l))),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !details.is_empty() {
        let _ = writeln!(out, "<ul class=\"details\">\n{}\n</ul>", details.join("\n"));
    }

    if !education.is_empty() {
        out.push_str("<h3>Education</h3>\n<ul class=\"education\">\n");
        for entry in education {
            let _ = write!(
                out,
                "<li><strong>{}</strong><br>{}",
                esc(&entry.degree),
                esc(&entry.institution)
            );
            if let Some(year) = &entry.year {
                let _ = write!(out, " <span class=\"year\">{}</span>", esc(year));
            }
            out.push_str("</li>\n");
        }
        out.push_str("</ul>\n");
    }

    if !certifications.is_empty() {
        out.push_str("<h3>Certifications</h3>\n<ul class=\"certifications\">\n");
        for cert in certifications {
            let _ = writeln!(out, "<li>{}</li>", esc(cert));
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</section>\n");
}

fn render_skills(out: &mut String, skills: &[SkillCategory]) {
    out.push_str("<section id=\"skills\" class=\"section skills\" data-section=\"skills\">\n");
    out.push_str("<h2>Skills</h2>\n<div class=\"skill-grid\">\n");
    for category in skills {
        let _ = writeln!(
            out,
            "<div class=\"skill-category\">\n<h3>{}</h3>\n<ul>",
            esc(&category.title)
        );
        for skill in &category.skills {
            let _ = writeln!(out, "<li class=\"skill\">{}</li>", esc(skill));
        }
        out.push_str("</ul>\n</div>\n");
    }
    out.push_str("</div>\n</section>\n");
}

fn render_projects(out: &mut String, projects: &[Project], options: &RenderOptions) {
    out.push_str(
        "<section id=\"projects\" class=\"section projects\" data-section=\"projects\">\n",
    );
    out.push_str("<h2>Projects</h2>\n<div class=\"project-grid\">\n");
    for project in projects {
        out.push_str("<article class=\"project-card\">\n<div class=\"project-image\">");
        match classify_image(project.image.as_deref(), options.media_dir.as_deref()) {
            ProjectImage::Media(file) => {
                let prefix = match options.mode {
                    RenderMode::Served => "/media/",
                    RenderMode::Static => "media/",
                };
                let _ = write!(
                    out,
                    "<img src=\"{prefix}{}\" alt=\"{}\" data-fallback=\"{PLACEHOLDER_GLYPH}\" loading=\"lazy\">",
                    esc(file),
                    esc(&project.title)
                );
            }
            ProjectImage::Glyph(glyph) => {
                let _ = write!(out, "<span class=\"glyph\">{}</span>", esc(glyph));
            }
            ProjectImage::Placeholder => {
                let _ = write!(out, "<span class=\"glyph\">{PLACEHOLDER_GLYPH}</span>");
            }
        }
        out.push_str("</div>\n");
        let _ = writeln!(out, "<h3>{}</h3>", esc(&project.title));
        let _ = writeln!(out, "<p>{}</p>", esc(&project.description));
        if !project.tech.is_empty() {
            out.push_str("<ul class=\"tech\">");
            for tech in &project.tech {
                let _ = write!(out, "<li>{}</li>", esc(tech));
            }
            out.push_str("</ul>\n");
        }
        let links: Vec<(&str, &str)> = [
            project.code_url.as_deref().map(|u| ("Code", u)),
            project.demo_url.as_deref().map(|u| ("Live Demo", u)),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !links.is_empty() {
            out.push_str("<div class=\"project-links\">");
            for (label, url) in links {
                external_link(out, label, url);
            }
            out.push_str("</div>\n");
        }
        out.push_str("</article>\n");
    }
    out.push_str("</div>\n</section>\n");
}

fn render_contact(out: &mut String, contact: &ContactConfig) {
    out.push_str("<section id=\"contact\" class=\"section contact\" data-section=\"contact\">\n");
    let _ = writeln!(out, "<h2>{}</h2>", esc(&contact.heading));
    if let Some(blurb) = &contact.blurb {
        let _ = writeln!(out, "<p>{}</p>", esc(blurb));
    }
    let _ = writeln!(
        out,
        "<form class=\"contact-form\" method=\"POST\" action=\"{}\">",
        esc(&contact.endpoint)
    );
    out.push_str(
        "<input type=\"text\" name=\"name\" placeholder=\"Your Name\" required>\n\
         <input type=\"email\" name=\"email\" placeholder=\"Your Email\" required>\n\
         <textarea name=\"message\" rows=\"5\" placeholder=\"Your Message\" required></textarea>\n",
    );
    let _ = writeln!(
        out,
        "<input type=\"hidden\" name=\"_subject\" value=\"{}\">",
        esc(&contact.subject)
    );
    out.push_str("<button class=\"button primary\" type=\"submit\">Send Message</button>\n</form>\n");

    if !contact.links.is_empty() || contact.resume_url.is_some() {
        out.push_str("<div class=\"contact-links\">");
        for link in &contact.links {
            external_link(out, &link.label, &link.url);
        }
        if let Some(resume) = &contact.resume_url {
            external_link(out, "Resume", resume);
        }
        out.push_str("</div>\n");
    }
    out.push_str("</section>\n");
}

fn external_link(out: &mut String, label: &str, url: &str) {
    let _ = write!(
        out,
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
        esc(url),
        esc(label)
    );
}
