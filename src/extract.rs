//! Extraction engine: pattern rules over raw HTML text
//!
//! Every rule here is best-effort. A rule that finds nothing yields an empty
//! collection or `None`, never an error; deciding whether "nothing at all" is
//! worth reporting is left to the tool that called it.
//!
//! Slug rules are regular expressions over the raw text, so they also see
//! paths inside inline scripts, comments and JSON blobs. SEO signals use a real
//! DOM query through `scraper`.

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Certain,
    Heuristic,
}

/// One parsed signal, e.g. a plugin slug or a title length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFact {
    pub key: String,
    pub value: String,
    pub confidence: Confidence,
}

impl ExtractedFact {
    pub fn new(key: impl Into<String>, value: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Plugin,
    Theme,
}

impl AssetKind {
    fn directory(&self) -> &'static str {
        match self {
            AssetKind::Plugin => "plugins",
            AssetKind::Theme => "themes",
        }
    }
}

fn plugin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)wp-content/plugins/([^/?"']+)"#).expect("plugin pattern is valid")
    })
}

fn theme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)wp-content/themes/([^/?"']+)"#).expect("theme pattern is valid")
    })
}

/// Distinct slugs under `wp-content/<plugins|themes>/`, in first-seen order.
///
/// Candidates containing a dot are asset files sitting directly in the
/// directory (`plugins/hello.php`) and are dropped.
pub fn extract_slugs(html: &str, kind: AssetKind) -> Vec<String> {
    let pattern = match kind {
        AssetKind::Plugin => plugin_pattern(),
        AssetKind::Theme => theme_pattern(),
    };

    let mut seen = HashSet::new();
    let mut slugs = Vec::new();

    for captures in pattern.captures_iter(html) {
        let slug = &captures[1];
        if slug.contains('.') {
            continue;
        }
        if seen.insert(slug.to_string()) {
            slugs.push(slug.to_string());
        }
    }

    tracing::debug!(
        "Extracted {} {} slug(s) from {} bytes of HTML",
        slugs.len(),
        kind.directory(),
        html.len()
    );
    slugs
}

/// `contact-form-7` -> `Contact Form 7`
pub fn display_name(slug: &str) -> String {
    slug.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Header fields of a theme's `style.css`, which some themes also inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThemeHeader {
    pub version: Option<String>,
    pub author: Option<String>,
    pub theme_uri: Option<String>,
    pub description: Option<String>,
}

impl ThemeHeader {
    pub fn is_empty(&self) -> bool {
        self.version.is_none()
            && self.author.is_none()
            && self.theme_uri.is_none()
            && self.description.is_none()
    }

    /// Fills fields still missing here from `other`.
    pub fn merge_missing(&mut self, other: ThemeHeader) {
        self.version = self.version.take().or(other.version);
        self.author = self.author.take().or(other.author);
        self.theme_uri = self.theme_uri.take().or(other.theme_uri);
        self.description = self.description.take().or(other.description);
    }
}

struct HeaderPatterns {
    version: Regex,
    author: Regex,
    theme_uri: Regex,
    description: Regex,
}

fn header_patterns() -> &'static HeaderPatterns {
    static PATTERNS: OnceLock<HeaderPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| HeaderPatterns {
        version: Regex::new(r"(?i)Version:\s*([^\s<]+)").expect("version pattern is valid"),
        author: Regex::new(r"(?i)Author:\s*([^<\n]+)").expect("author pattern is valid"),
        theme_uri: Regex::new(r"(?i)Theme URI:\s*([^\s<]+)").expect("theme uri pattern is valid"),
        description: Regex::new(r"(?i)Description:\s*([^<\n]+)")
            .expect("description pattern is valid"),
    })
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn extract_theme_header(text: &str) -> ThemeHeader {
    let patterns = header_patterns();
    ThemeHeader {
        version: first_capture(&patterns.version, text),
        author: first_capture(&patterns.author, text),
        theme_uri: first_capture(&patterns.theme_uri, text),
        description: first_capture(&patterns.description, text),
    }
}

/// On-page SEO signals read from the parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeoSignals {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_count: usize,
    pub image_count: usize,
    pub images_missing_alt: usize,
    pub has_viewport: bool,
    pub canonical: Option<String>,
    pub lang: Option<String>,
    pub generator: Option<String>,
}

impl SeoSignals {
    pub fn is_wordpress(&self) -> bool {
        self.generator
            .as_deref()
            .map(|g| g.to_ascii_lowercase().contains("wordpress"))
            .unwrap_or(false)
    }

    pub fn facts(&self) -> Vec<ExtractedFact> {
        let mut facts = Vec::new();
        if let Some(title) = &self.title {
            facts.push(ExtractedFact::new("title", title, Confidence::Certain));
            facts.push(ExtractedFact::new(
                "title_length",
                title.chars().count().to_string(),
                Confidence::Certain,
            ));
        }
        if let Some(description) = &self.meta_description {
            facts.push(ExtractedFact::new(
                "meta_description_length",
                description.chars().count().to_string(),
                Confidence::Certain,
            ));
        }
        facts.push(ExtractedFact::new(
            "h1_count",
            self.h1_count.to_string(),
            Confidence::Certain,
        ));
        facts.push(ExtractedFact::new(
            "images_missing_alt",
            self.images_missing_alt.to_string(),
            Confidence::Certain,
        ));
        if let Some(generator) = &self.generator {
            facts.push(ExtractedFact::new("generator", generator, Confidence::Heuristic));
        }
        facts
    }
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

fn attr_of(document: &Html, css: &'static str, attr: &str) -> Option<String> {
    document
        .select(&selector(css))
        .filter_map(|el| el.value().attr(attr))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

pub fn extract_seo_signals(html: &str) -> SeoSignals {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector("title"))
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let images: Vec<_> = document.select(&selector("img")).collect();
    let images_missing_alt = images
        .iter()
        .filter(|img| {
            img.value()
                .attr("alt")
                .map(|alt| alt.trim().is_empty())
                .unwrap_or(true)
        })
        .count();

    SeoSignals {
        title,
        meta_description: attr_of(&document, r#"meta[name="description"]"#, "content"),
        h1_count: document.select(&selector("h1")).count(),
        image_count: images.len(),
        images_missing_alt,
        has_viewport: document.select(&selector(r#"meta[name="viewport"]"#)).next().is_some(),
        canonical: attr_of(&document, r#"link[rel="canonical"]"#, "href"),
        lang: attr_of(&document, "html[lang]", "lang"),
        generator: attr_of(&document, r#"meta[name="generator"]"#, "content"),
    }
}

/// Rough count of the sub-resources a browser would request for this page.
pub fn count_resource_references(html: &str) -> usize {
    let document = Html::parse_document(html);
    ["script[src]", "link[href]", "img[src]"]
        .into_iter()
        .map(|css| document.select(&selector(css)).count())
        .sum()
}
