//! Plugin and theme detection
//!
//! Both detectors fetch the page once and read `wp-content` paths out of the
//! HTML. Neither has a fallback report: a failed fetch surfaces as
//! `NetworkError`, and a page with no matching paths as `NoSignalFound`.

use crate::extract::{
    display_name, extract_slugs, extract_theme_header, AssetKind, Confidence, ExtractedFact,
    ThemeHeader,
};
use crate::fetch::PageSource;
use crate::pipeline::{Invocation, ToolState};
use crate::validator::{normalize_url, CanonicalUrl};
use crate::ToolError;
use serde::Serialize;
use tracing::{debug, info};

pub const MANUAL_THEME_STEPS: &[&str] = &[
    "Open the site in your browser and view the page source (Ctrl+U / Cmd+Option+U)",
    "Search the source for \"wp-content/themes/\"",
    "The folder name right after \"themes/\" is the theme slug",
    "Open /wp-content/themes/<slug>/style.css to read the theme header",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub slug: String,
    pub directory_url: String,
}

impl PluginInfo {
    pub fn from_slug(slug: &str) -> Self {
        Self {
            name: display_name(slug),
            slug: slug.to_string(),
            directory_url: format!("https://wordpress.org/plugins/{slug}/"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginDetection {
    pub site: CanonicalUrl,
    pub plugins: Vec<PluginInfo>,
}

impl PluginDetection {
    pub fn facts(&self) -> Vec<ExtractedFact> {
        self.plugins
            .iter()
            .map(|p| ExtractedFact::new("plugin", &p.slug, Confidence::Certain))
            .collect()
    }
}

pub async fn detect_plugins(
    invocation: &mut Invocation<'_>,
    source: &dyn PageSource,
    raw_url: &str,
) -> Result<PluginDetection, ToolError> {
    invocation.advance(ToolState::Validating);
    let site = normalize_url(raw_url).map_err(|e| invocation.fail(e))?;

    invocation.advance(ToolState::Fetching);
    let page = source
        .fetch(site.url())
        .await
        .map_err(|e| invocation.fail(e))?;

    invocation.advance(ToolState::Extracting);
    let plugins: Vec<PluginInfo> = extract_slugs(&page.body, AssetKind::Plugin)
        .iter()
        .map(|slug| PluginInfo::from_slug(slug))
        .collect();

    if plugins.is_empty() {
        return Err(invocation.fail(ToolError::NoSignalFound(
            "Could not detect any WordPress plugins. The site might be hiding plugin information."
                .to_string(),
        )));
    }

    info!("Found {} plugin(s) on {}", plugins.len(), site);
    invocation.advance(ToolState::Reporting);
    Ok(PluginDetection { site, plugins })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeInfo {
    pub name: String,
    pub slug: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub theme_uri: Option<String>,
    pub description: Option<String>,
    /// Where the header fields were read from, when a stylesheet answered.
    pub stylesheet: Option<String>,
}

impl ThemeInfo {
    fn from_parts(slug: &str, header: ThemeHeader, stylesheet: Option<String>) -> Self {
        Self {
            name: display_name(slug),
            slug: Some(slug.to_string()),
            version: header.version,
            author: header.author,
            theme_uri: header.theme_uri,
            description: header.description,
            stylesheet,
        }
    }

    /// Placeholder shown when the page could not be fetched at all.
    pub fn manual_detection() -> Self {
        Self {
            name: "Manual Detection Required".to_string(),
            slug: None,
            version: None,
            author: None,
            theme_uri: None,
            description: Some(
                "Automatic detection failed because the site could not be fetched. \
                 Follow these steps to detect the theme manually:"
                    .to_string(),
            ),
            stylesheet: None,
        }
    }

    pub fn facts(&self) -> Vec<ExtractedFact> {
        let header_confidence = if self.stylesheet.is_some() {
            Confidence::Certain
        } else {
            Confidence::Heuristic
        };
        // The manual placeholder carries no detected facts.
        let Some(slug) = &self.slug else {
            return Vec::new();
        };
        let mut facts = vec![ExtractedFact::new("theme", slug, Confidence::Certain)];
        let fields = [
            ("version", &self.version),
            ("author", &self.author),
            ("theme_uri", &self.theme_uri),
            ("description", &self.description),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                facts.push(ExtractedFact::new(key, value, header_confidence));
            }
        }
        facts
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThemeOptions {
    /// Also read `wp-content/themes/<slug>/style.css` for the theme header.
    pub fetch_stylesheet: bool,
}

impl Default for ThemeOptions {
    fn default() -> Self {
        Self {
            fetch_stylesheet: true,
        }
    }
}

pub async fn detect_theme(
    invocation: &mut Invocation<'_>,
    source: &dyn PageSource,
    raw_url: &str,
    options: ThemeOptions,
) -> Result<ThemeInfo, ToolError> {
    invocation.advance(ToolState::Validating);
    let site = normalize_url(raw_url).map_err(|e| invocation.fail(e))?;

    invocation.advance(ToolState::Fetching);
    let page = source
        .fetch(site.url())
        .await
        .map_err(|e| invocation.fail(e))?;

    let Some(slug) = extract_slugs(&page.body, AssetKind::Theme).into_iter().next() else {
        return Err(invocation.fail(ToolError::NoSignalFound(
            "Could not detect a WordPress theme. Make sure the URL is a WordPress site."
                .to_string(),
        )));
    };

    let page_header = extract_theme_header(&page.body);
    let mut header = ThemeHeader::default();
    let mut stylesheet = None;

    if options.fetch_stylesheet {
        let css_url = site.join(&format!("/wp-content/themes/{slug}/style.css"))?;
        match source.fetch(&css_url).await {
            Ok(css) if css.status < 400 => {
                let css_header = extract_theme_header(&css.body);
                if !css_header.is_empty() {
                    header = css_header;
                    stylesheet = Some(css_url.to_string());
                }
            }
            Ok(css) => debug!("{} answered HTTP {}", css_url, css.status),
            Err(e) => debug!("Theme stylesheet unavailable at {}: {}", css_url, e),
        }
    }

    invocation.advance(ToolState::Extracting);
    header.merge_missing(page_header);

    info!("Found theme '{}' on {}", slug, site);
    invocation.advance(ToolState::Reporting);
    Ok(ThemeInfo::from_parts(&slug, header, stylesheet))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchedPage, MockPageSource};
    use crate::pipeline::ToolSlot;
    use mockall::predicate::always;
    use std::time::Duration;

    fn page(url: &str, status: u16, body: &str) -> FetchedPage {
        FetchedPage {
            url: url.to_string(),
            final_url: url.to_string(),
            status,
            body: body.to_string(),
            elapsed: Duration::from_millis(120),
        }
    }

    #[tokio::test]
    async fn test_detect_plugins() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch()
            .withf(|url| url.as_str() == "https://example.com/")
            .times(1)
            .returning(|url| {
                Ok(page(
                    url.as_str(),
                    200,
                    r#"<script src="/wp-content/plugins/akismet/akismet.php"></script>
                       <link href="/wp-content/plugins/woocommerce/">"#,
                ))
            });

        let slot = ToolSlot::new("plugins");
        let mut invocation = slot.try_begin().unwrap();
        let detection = detect_plugins(&mut invocation, &source, "example.com")
            .await
            .unwrap();

        assert_eq!(detection.site.as_str(), "https://example.com");
        let names: Vec<_> = detection.plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Akismet", "Woocommerce"]);
        assert_eq!(
            detection.plugins[0].directory_url,
            "https://wordpress.org/plugins/akismet/"
        );
        assert_eq!(detection.facts().len(), 2);
        assert_eq!(
            invocation.trail(),
            &[
                ToolState::Idle,
                ToolState::Validating,
                ToolState::Fetching,
                ToolState::Extracting,
                ToolState::Reporting
            ]
        );
    }

    #[tokio::test]
    async fn test_detect_plugins_no_signal() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch()
            .returning(|url| Ok(page(url.as_str(), 200, "<html><body>static</body></html>")));

        let slot = ToolSlot::new("plugins");
        let mut invocation = slot.try_begin().unwrap();
        let err = detect_plugins(&mut invocation, &source, "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NoSignalFound(_)));
        assert!(!err.is_failure());
    }

    #[tokio::test]
    async fn test_detect_plugins_surfaces_network_error() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch()
            .returning(|_| Err(ToolError::NetworkError("connection refused".to_string())));

        let slot = ToolSlot::new("plugins");
        let mut invocation = slot.try_begin().unwrap();
        let err = detect_plugins(&mut invocation, &source, "example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_never_fetches() {
        let mut source = MockPageSource::new();
        source.expect_fetch().with(always()).times(0);

        let slot = ToolSlot::new("plugins");
        let mut invocation = slot.try_begin().unwrap();
        let err = detect_plugins(&mut invocation, &source, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
        assert_eq!(invocation.state(), ToolState::Idle);
    }

    #[tokio::test]
    async fn test_detect_theme_prefers_stylesheet_header() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch()
            .withf(|url| url.path() == "/")
            .returning(|url| {
                Ok(page(
                    url.as_str(),
                    200,
                    r#"<link href="/wp-content/themes/astra/style.min.css">
                       <!-- Version: 0.0.1 -->"#,
                ))
            });
        source
            .expect_fetch()
            .withf(|url| url.path() == "/wp-content/themes/astra/style.css")
            .returning(|url| {
                Ok(page(
                    url.as_str(),
                    200,
                    "/*\nTheme Name: Astra\nAuthor: Brainstorm Force\nVersion: 4.6.4\n*/",
                ))
            });

        let slot = ToolSlot::new("theme");
        let mut invocation = slot.try_begin().unwrap();
        let theme = detect_theme(&mut invocation, &source, "example.com", ThemeOptions::default())
            .await
            .unwrap();

        assert_eq!(theme.slug.as_deref(), Some("astra"));
        assert_eq!(theme.name, "Astra");
        assert_eq!(theme.version.as_deref(), Some("4.6.4"));
        assert_eq!(theme.author.as_deref(), Some("Brainstorm Force"));
        assert_eq!(
            theme.stylesheet.as_deref(),
            Some("https://example.com/wp-content/themes/astra/style.css")
        );
        assert!(theme
            .facts()
            .iter()
            .all(|f| f.confidence == Confidence::Certain));
    }

    #[tokio::test]
    async fn test_detect_theme_falls_back_to_page_header() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch()
            .withf(|url| url.path() == "/")
            .returning(|url| {
                Ok(page(
                    url.as_str(),
                    200,
                    r#"<link href="/wp-content/themes/my-theme/style.css?ver=2">
                       <!-- Version: 2.1 -->"#,
                ))
            });
        source
            .expect_fetch()
            .withf(|url| url.path().ends_with("style.css"))
            .returning(|url| Ok(page(url.as_str(), 404, "not found")));

        let slot = ToolSlot::new("theme");
        let mut invocation = slot.try_begin().unwrap();
        let theme = detect_theme(&mut invocation, &source, "example.com", ThemeOptions::default())
            .await
            .unwrap();
        assert_eq!(theme.name, "My Theme");
        assert_eq!(theme.version.as_deref(), Some("2.1"));
        assert!(theme.stylesheet.is_none());
    }

    #[tokio::test]
    async fn test_detect_theme_no_signal() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|url| Ok(page(url.as_str(), 200, "<p>hand written html</p>")));

        let slot = ToolSlot::new("theme");
        let mut invocation = slot.try_begin().unwrap();
        let options = ThemeOptions {
            fetch_stylesheet: false,
        };
        let err = detect_theme(&mut invocation, &source, "example.com", options)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NoSignalFound(_)));
    }

    #[test]
    fn test_manual_detection_placeholder() {
        let placeholder = ThemeInfo::manual_detection();
        assert_eq!(placeholder.name, "Manual Detection Required");
        assert!(placeholder.slug.is_none());
        assert!(placeholder.facts().is_empty());
    }
}
