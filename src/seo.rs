//! SEO analyzer
//!
//! `Checklist` mode mirrors a quick audit: two live checks (HTTPS and
//! reachability) followed by fixed reminders. `Html` mode reads the page and
//! grades on-page signals. A failed fetch in `Html` mode degrades to the
//! checklist, flagged as heuristic.

use crate::extract::{extract_seo_signals, SeoSignals};
use crate::fetch::PageSource;
use crate::pipeline::{Invocation, ToolState};
use crate::report::{Report, ReportBuilder};
use crate::validator::{normalize_url, CanonicalUrl};
use crate::{metrics, ToolError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const TITLE_RANGE: (usize, usize) = (30, 60);
pub const DESCRIPTION_RANGE: (usize, usize) = (120, 160);

const REMINDERS: &[(&str, &str)] = &[
    ("Meta Title", "Verify title tag is present and optimized (50-60 chars)"),
    ("Meta Description", "Ensure meta description exists (150-160 chars)"),
    ("H1 Tag", "Check for single, keyword-rich H1 tag"),
    ("Image Alt Text", "Add descriptive alt text to all images"),
    ("Mobile Friendly", "Ensure responsive design for mobile devices"),
    ("XML Sitemap", "Verify sitemap.xml exists and is submitted to Google"),
    ("Robots.txt", "Check robots.txt configuration"),
    ("Page Speed", "Optimize for fast load times (under 3 seconds)"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeoMode {
    #[default]
    Checklist,
    Html,
}

impl FromStr for SeoMode {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "checklist" => Ok(SeoMode::Checklist),
            "html" => Ok(SeoMode::Html),
            other => Err(ToolError::InvalidInput(format!(
                "unknown SEO mode '{other}' (expected checklist or html)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeoAnalysis {
    pub site: CanonicalUrl,
    pub mode: SeoMode,
    pub report: Report,
    /// Present only when the page HTML was read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<SeoSignals>,
}

fn ssl_check(builder: &mut ReportBuilder, site: &CanonicalUrl) {
    if site.is_https() {
        builder.pass("SSL Certificate", "HTTPS is enabled");
    } else {
        builder.fail("SSL Certificate", "Site should use HTTPS for security");
    }
}

/// Two live checks followed by the eight fixed reminders.
pub fn checklist_report(site: &CanonicalUrl, reachable: bool) -> Report {
    let mut builder = ReportBuilder::new().heuristic(!reachable);
    ssl_check(&mut builder, site);
    if reachable {
        builder.pass("Site Accessibility", "Website is accessible");
    } else {
        builder.warn("Site Accessibility", "Unable to verify accessibility");
    }
    for (name, message) in REMINDERS {
        builder.warn(*name, *message);
    }
    builder.build()
}

fn length_check(
    builder: &mut ReportBuilder,
    name: &str,
    value: Option<&str>,
    (min, max): (usize, usize),
) {
    match value {
        None => {
            builder.fail(name, format!("{name} is missing"));
        }
        Some(text) => {
            let length = text.chars().count();
            if (min..=max).contains(&length) {
                builder.pass(name, format!("{name} length is good ({length} chars)"));
            } else {
                builder.warn(
                    name,
                    format!("{name} is {length} chars, aim for {min}-{max}"),
                );
            }
        }
    }
}

/// Grades the signals read from a fetched page.
pub fn html_report(site: &CanonicalUrl, status: u16, signals: &SeoSignals) -> Report {
    let mut builder = ReportBuilder::new();
    ssl_check(&mut builder, site);

    if status < 400 {
        builder.pass("Site Accessibility", format!("Website responded with HTTP {status}"));
    } else {
        builder.warn("Site Accessibility", format!("Website responded with HTTP {status}"));
    }

    length_check(&mut builder, "Title", signals.title.as_deref(), TITLE_RANGE);
    length_check(
        &mut builder,
        "Meta Description",
        signals.meta_description.as_deref(),
        DESCRIPTION_RANGE,
    );

    match signals.h1_count {
        0 => builder.fail("H1 Tag", "No H1 tag found"),
        1 => builder.pass("H1 Tag", "Exactly one H1 tag"),
        n => builder.warn("H1 Tag", format!("{n} H1 tags found, use a single H1")),
    };

    if signals.images_missing_alt == 0 {
        builder.pass("Image Alt Text", "All images have alt text");
    } else {
        builder.warn(
            "Image Alt Text",
            format!(
                "{} of {} images are missing alt text",
                signals.images_missing_alt, signals.image_count
            ),
        );
    }

    if signals.has_viewport {
        builder.pass("Mobile Viewport", "Viewport meta tag is present");
    } else {
        builder.fail("Mobile Viewport", "Add a viewport meta tag for mobile devices");
    }

    match &signals.canonical {
        Some(href) => builder.pass("Canonical URL", format!("Canonical URL set to {href}")),
        None => builder.warn("Canonical URL", "No canonical link found"),
    };

    match &signals.lang {
        Some(lang) => builder.pass("Language", format!("Document language is '{lang}'")),
        None => builder.warn("Language", "Set a lang attribute on the <html> element"),
    };

    builder.build()
}

pub async fn analyze_seo(
    invocation: &mut Invocation<'_>,
    source: &dyn PageSource,
    raw_url: &str,
    mode: SeoMode,
) -> Result<SeoAnalysis, ToolError> {
    invocation.advance(ToolState::Validating);
    let site = normalize_url(raw_url).map_err(|e| invocation.fail(e))?;

    invocation.advance(ToolState::Fetching);
    let fetched = source.fetch(site.url()).await;

    let analysis = match (mode, fetched) {
        (SeoMode::Checklist, Ok(_)) => {
            invocation.advance(ToolState::Extracting);
            SeoAnalysis {
                report: checklist_report(&site, true),
                site,
                mode,
                signals: None,
            }
        }
        (SeoMode::Html, Ok(page)) => {
            invocation.advance(ToolState::Extracting);
            let signals = extract_seo_signals(&page.body);
            if !signals.is_wordpress() {
                debug!("{} has no WordPress generator tag", site);
            }
            SeoAnalysis {
                report: html_report(&site, page.status, &signals),
                site,
                mode,
                signals: Some(signals),
            }
        }
        (_, Err(e)) if e.has_fallback() => {
            warn!("SEO fetch failed for {}, using checklist: {}", site, e);
            invocation.fail(e);
            metrics::record_fallback(invocation.tool());
            SeoAnalysis {
                report: checklist_report(&site, false),
                site,
                mode,
                signals: None,
            }
        }
        (_, Err(e)) => return Err(invocation.fail(e)),
    };

    info!(
        "SEO score for {}: {} ({} checks)",
        analysis.site,
        analysis.report.score,
        analysis.report.checks.len()
    );
    invocation.advance(ToolState::Reporting);
    Ok(analysis)
}
