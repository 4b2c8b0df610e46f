//! Speed reporter
//!
//! One timed `GET`. The score is a linear penalty on response time clamped to
//! `50..=100`; page size and request count come from the same response.

use crate::extract::{count_resource_references, Confidence, ExtractedFact};
use crate::fetch::PageSource;
use crate::pipeline::{Invocation, ToolState};
use crate::utils::round2;
use crate::validator::{normalize_url, CanonicalUrl};
use crate::{metrics, ToolError};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

pub const MIN_SCORE: u8 = 50;
pub const MAX_SCORE: u8 = 100;
pub const FALLBACK_SCORE: u8 = 75;
pub const MAX_RECOMMENDATIONS: usize = 6;

/// Response times above this many seconds add the server-side advice.
pub const SLOW_RESPONSE_SECS: f64 = 2.0;

const STANDARD_RECOMMENDATIONS: &[&str] = &[
    "Enable GZIP compression to reduce file sizes",
    "Optimize and compress images (WebP format recommended)",
    "Minify CSS and JavaScript files",
    "Leverage browser caching for static resources",
    "Remove unused CSS and JavaScript",
    "Enable lazy loading for images",
];

const FALLBACK_RECOMMENDATIONS: &[&str] = &[
    "Enable GZIP compression to reduce file sizes",
    "Optimize and compress images (use WebP format)",
    "Minify CSS and JavaScript files",
    "Leverage browser caching for static resources",
    "Use a Content Delivery Network (CDN)",
    "Enable lazy loading for images and videos",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Good,
    Average,
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => ScoreBand::Good,
            70..=89 => ScoreBand::Average,
            _ => ScoreBand::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Good => "good",
            ScoreBand::Average => "average",
            ScoreBand::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeedReport {
    pub site: CanonicalUrl,
    pub score: u8,
    pub band: ScoreBand,
    /// Seconds, two decimals. `None` in the fallback report.
    pub load_time_secs: Option<f64>,
    pub page_size_bytes: Option<usize>,
    pub requests: Option<usize>,
    pub recommendations: Vec<String>,
    pub fallback: bool,
}

impl SpeedReport {
    pub fn fallback(site: CanonicalUrl) -> Self {
        Self {
            site,
            score: FALLBACK_SCORE,
            band: ScoreBand::from_score(FALLBACK_SCORE),
            load_time_secs: None,
            page_size_bytes: None,
            requests: None,
            recommendations: FALLBACK_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
            fallback: true,
        }
    }

    /// Page size in MB with two decimals, as shown in the report.
    pub fn page_size_mb(&self) -> Option<f64> {
        self.page_size_bytes
            .map(|bytes| round2(bytes as f64 / (1024.0 * 1024.0)))
    }

    pub fn facts(&self) -> Vec<ExtractedFact> {
        let mut facts = Vec::new();
        if let Some(secs) = self.load_time_secs {
            facts.push(ExtractedFact::new(
                "load_time_secs",
                format!("{secs:.2}"),
                Confidence::Certain,
            ));
        }
        if let Some(mb) = self.page_size_mb() {
            facts.push(ExtractedFact::new(
                "page_size_mb",
                format!("{mb:.2}"),
                Confidence::Heuristic,
            ));
        }
        if let Some(requests) = self.requests {
            facts.push(ExtractedFact::new(
                "requests",
                requests.to_string(),
                Confidence::Heuristic,
            ));
        }
        facts
    }
}

/// `clamp(floor(100 - secs * 20), 50, 100)`
pub fn speed_score(secs: f64) -> u8 {
    let raw = (100.0 - secs * 20.0).floor();
    raw.clamp(MIN_SCORE as f64, MAX_SCORE as f64) as u8
}

pub fn recommendations(secs: f64) -> Vec<String> {
    let mut list = Vec::new();
    if secs > SLOW_RESPONSE_SECS {
        list.push(format!(
            "Reduce server response time - currently taking {secs:.2}s"
        ));
        list.push("Consider using a CDN for faster content delivery".to_string());
    }
    list.extend(STANDARD_RECOMMENDATIONS.iter().map(|r| r.to_string()));
    list.truncate(MAX_RECOMMENDATIONS);
    list
}

fn measured_report(site: CanonicalUrl, elapsed: Duration, body: &str) -> SpeedReport {
    let secs = round2(elapsed.as_secs_f64());
    let score = speed_score(secs);
    SpeedReport {
        site,
        score,
        band: ScoreBand::from_score(score),
        load_time_secs: Some(secs),
        page_size_bytes: Some(body.len()),
        requests: Some(count_resource_references(body) + 1),
        recommendations: recommendations(secs),
        fallback: false,
    }
}

pub async fn measure_speed(
    invocation: &mut Invocation<'_>,
    source: &dyn PageSource,
    raw_url: &str,
) -> Result<SpeedReport, ToolError> {
    invocation.advance(ToolState::Validating);
    let site = normalize_url(raw_url).map_err(|e| invocation.fail(e))?;

    invocation.advance(ToolState::Fetching);
    let report = match source.fetch(site.url()).await {
        Ok(page) => {
            invocation.advance(ToolState::Extracting);
            measured_report(site, page.elapsed, &page.body)
        }
        Err(e) if e.has_fallback() => {
            warn!("Speed test failed for {}, showing generic advice: {}", site, e);
            invocation.fail(e);
            metrics::record_fallback(invocation.tool());
            SpeedReport::fallback(site)
        }
        Err(e) => return Err(invocation.fail(e)),
    };

    info!(
        "Speed score for {}: {} ({})",
        report.site,
        report.score,
        report.band.label()
    );
    invocation.advance(ToolState::Reporting);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchedPage, MockPageSource};
    use crate::pipeline::ToolSlot;

    #[test]
    fn test_speed_score_curve() {
        assert_eq!(speed_score(0.0), 100);
        assert_eq!(speed_score(0.5), 90);
        assert_eq!(speed_score(1.23), 75);
        assert_eq!(speed_score(2.5), 50);
        assert_eq!(speed_score(9.0), 50);
    }

    #[test]
    fn test_speed_score_bounds_and_monotonic() {
        let mut previous = MAX_SCORE;
        for step in 0..200 {
            let score = speed_score(step as f64 * 0.05);
            assert!((MIN_SCORE..=MAX_SCORE).contains(&score));
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn test_fast_site_gets_standard_recommendations() {
        let list = recommendations(0.8);
        assert_eq!(list.len(), 6);
        assert_eq!(list[0], "Enable GZIP compression to reduce file sizes");
        assert_eq!(list[5], "Enable lazy loading for images");
    }

    #[test]
    fn test_slow_site_gets_server_advice_first() {
        let list = recommendations(3.456);
        assert_eq!(list.len(), 6);
        assert_eq!(list[0], "Reduce server response time - currently taking 3.46s");
        assert_eq!(list[1], "Consider using a CDN for faster content delivery");
        assert_eq!(list[5], "Leverage browser caching for static resources");
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::from_score(100), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(90), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(89), ScoreBand::Average);
        assert_eq!(ScoreBand::from_score(70), ScoreBand::Average);
        assert_eq!(ScoreBand::from_score(69), ScoreBand::Poor);
    }

    #[test]
    fn test_fallback_report() {
        let report = SpeedReport::fallback(normalize_url("example.com").unwrap());
        assert_eq!(report.score, 75);
        assert_eq!(report.band, ScoreBand::Average);
        assert!(report.load_time_secs.is_none());
        assert!(report.facts().is_empty());
        assert_eq!(report.recommendations[4], "Use a Content Delivery Network (CDN)");
    }

    #[tokio::test]
    async fn test_measure_speed_from_fetch() {
        let mut source = MockPageSource::new();
        source.expect_fetch().returning(|url| {
            Ok(FetchedPage {
                url: url.to_string(),
                final_url: url.to_string(),
                status: 200,
                body: r#"<script src="a.js"></script><img src="b.png">"#.to_string(),
                elapsed: Duration::from_millis(1234),
            })
        });

        let slot = ToolSlot::new("speed");
        let mut invocation = slot.try_begin().unwrap();
        let report = measure_speed(&mut invocation, &source, "example.com")
            .await
            .unwrap();
        assert_eq!(report.load_time_secs, Some(1.23));
        assert_eq!(report.score, 75);
        assert_eq!(report.requests, Some(3));
        assert!(!report.fallback);
        assert_eq!(invocation.state(), ToolState::Reporting);
    }

    #[tokio::test]
    async fn test_measure_speed_falls_back() {
        let mut source = MockPageSource::new();
        source
            .expect_fetch()
            .returning(|_| Err(ToolError::NetworkError("timed out".to_string())));

        let slot = ToolSlot::new("speed");
        let mut invocation = slot.try_begin().unwrap();
        let report = measure_speed(&mut invocation, &source, "example.com")
            .await
            .unwrap();
        assert!(report.fallback);
        assert_eq!(report.score, FALLBACK_SCORE);
    }
}
