//! Result presentation and the copy/download actions
//!
//! Every tool result implements [`Render`] for the human-readable form and
//! `Serialize` for `--json`. Actions run once; a failure is returned to the
//! caller to report, never retried.

use crate::batch::BatchOutcome;
use crate::codec::ConvertedImage;
use crate::detect::{PluginDetection, ThemeInfo, MANUAL_THEME_STEPS};
use crate::error::ErrorSeverity;
use crate::history::SavedPassword;
use crate::report::Report;
use crate::seo::SeoAnalysis;
use crate::speed::SpeedReport;
use crate::utils::{format_bytes, format_duration, sanitize_filename};
use crate::ToolError;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub trait Render {
    fn render_text(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presenter {
    pub json: bool,
}

impl Presenter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn format<T: Render + Serialize + ?Sized>(&self, value: &T) -> Result<String, ToolError> {
        if self.json {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(value.render_text())
        }
    }

    pub fn format_error(&self, error: &ToolError) -> String {
        if self.json {
            serde_json::json!({
                "error": error.kind(),
                "message": error.to_string(),
                "notice": !error.is_failure(),
            })
            .to_string()
        } else {
            match error.severity() {
                ErrorSeverity::Notice => format!("Notice: {}", notice_text(error)),
                _ => format!("Error: {error}"),
            }
        }
    }
}

fn notice_text(error: &ToolError) -> String {
    match error {
        ToolError::NoSignalFound(message) => message.clone(),
        other => other.to_string(),
    }
}

impl Render for Report {
    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Score: {}/100", self.score);
        if self.heuristic {
            let _ = writeln!(out, "(generic checklist, the site could not be analyzed)");
        }
        for check in &self.checks {
            let _ = writeln!(
                out,
                "  [{:<7}] {}: {}",
                check.status.label(),
                check.name,
                check.message
            );
        }
        out
    }
}

impl Render for SeoAnalysis {
    fn render_text(&self) -> String {
        format!("SEO analysis for {}\n{}", self.site, self.report.render_text())
    }
}

impl Render for PluginDetection {
    fn render_text(&self) -> String {
        let mut out = format!("Found {} plugin(s) on {}\n", self.plugins.len(), self.site);
        for plugin in &self.plugins {
            let _ = writeln!(out, "  {} ({})", plugin.name, plugin.directory_url);
        }
        out
    }
}

impl Render for ThemeInfo {
    fn render_text(&self) -> String {
        let mut out = format!("Theme: {}\n", self.name);
        let rows = [
            ("Slug", &self.slug),
            ("Version", &self.version),
            ("Author", &self.author),
            ("Theme URI", &self.theme_uri),
            ("Description", &self.description),
            ("Read from", &self.stylesheet),
        ];
        for (label, value) in rows {
            if let Some(value) = value {
                let _ = writeln!(out, "  {label}: {value}");
            }
        }
        if self.slug.is_none() {
            for (i, step) in MANUAL_THEME_STEPS.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", i + 1, step);
            }
        }
        out
    }
}

impl Render for SpeedReport {
    fn render_text(&self) -> String {
        let na = || "N/A".to_string();
        let mut out = format!(
            "Speed report for {}\nScore: {}/100 ({})\n",
            self.site,
            self.score,
            self.band.label()
        );
        if self.fallback {
            let _ = writeln!(out, "(the site could not be measured, showing general advice)");
        }
        let _ = writeln!(
            out,
            "  Load time: {}",
            self.load_time_secs.map(|s| format!("{s:.2}s")).unwrap_or_else(na)
        );
        let _ = writeln!(
            out,
            "  Page size: {}",
            self.page_size_mb().map(|mb| format!("{mb:.2} MB")).unwrap_or_else(na)
        );
        let _ = writeln!(
            out,
            "  Requests: {}",
            self.requests.map(|r| r.to_string()).unwrap_or_else(na)
        );
        let _ = writeln!(out, "Recommendations:");
        for recommendation in &self.recommendations {
            let _ = writeln!(out, "  - {recommendation}");
        }
        out
    }
}

impl Render for ConvertedImage {
    fn render_text(&self) -> String {
        format!(
            "{} -> {} ({}x{}, {} -> {}, {:.1}% saved)",
            self.source_name,
            self.name,
            self.width,
            self.height,
            format_bytes(self.source_size),
            format_bytes(self.size),
            self.savings_percent()
        )
    }
}

#[derive(Debug, Serialize)]
struct FailureRow {
    file: String,
    error: String,
}

impl Serialize for BatchOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let failures: Vec<FailureRow> = self
            .failures
            .iter()
            .map(|(path, error)| FailureRow {
                file: path.display().to_string(),
                error: error.to_string(),
            })
            .collect();
        let skipped: Vec<String> = self.skipped.iter().map(|p| p.display().to_string()).collect();

        let mut state = serializer.serialize_struct("BatchOutcome", 5)?;
        state.serialize_field("converted", &self.converted)?;
        state.serialize_field("failures", &failures)?;
        state.serialize_field("skipped", &skipped)?;
        state.serialize_field("total_input_bytes", &self.total_input_bytes())?;
        state.serialize_field("total_output_bytes", &self.total_output_bytes())?;
        state.end()
    }
}

impl Render for BatchOutcome {
    fn render_text(&self) -> String {
        let mut out = format!("Converted {} image(s)\n", self.converted.len());
        for (i, image) in self.converted.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, image.render_text());
        }
        if !self.converted.is_empty() {
            let _ = writeln!(
                out,
                "Total: {} -> {}",
                format_bytes(self.total_input_bytes()),
                format_bytes(self.total_output_bytes())
            );
        }
        for (path, error) in &self.failures {
            let _ = writeln!(out, "Failed: {}: {}", path.display(), error);
        }
        if !self.skipped.is_empty() {
            let _ = writeln!(
                out,
                "Some files were skipped (only image files are supported): {}",
                self.skipped.len()
            );
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPassword {
    pub password: String,
    pub length: usize,
    pub saved: bool,
}

impl Render for GeneratedPassword {
    fn render_text(&self) -> String {
        let mut out = format!("{}\n", self.password);
        if self.saved {
            out.push_str("(saved to history)\n");
        }
        out
    }
}

impl Render for [SavedPassword] {
    fn render_text(&self) -> String {
        if self.is_empty() {
            return "No saved passwords\n".to_string();
        }
        let mut out = String::new();
        for (i, entry) in self.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>3}. {}  ({} chars, {})",
                i, entry.password, entry.length, entry.timestamp
            );
        }
        out
    }
}

/// Progress line for a batch, e.g. `[2/3] 66.7%`.
pub fn progress_line(progress: &crate::batch::ProgressInfo) -> String {
    format!(
        "[{}/{}] {:.1}% ({} failed, {})",
        progress.completed,
        progress.total,
        progress.percent(),
        progress.errors,
        format_duration(progress.elapsed)
    )
}

const CLIPBOARD_PROGRAMS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("clip", &[]),
];

/// Copies `text` to the system clipboard with the first helper found on PATH.
pub async fn copy_to_clipboard(text: &str) -> Result<(), ToolError> {
    let (program, args) = CLIPBOARD_PROGRAMS
        .iter()
        .find_map(|(name, args)| which::which(name).ok().map(|path| (path, *args)))
        .ok_or_else(|| ToolError::ClipboardError("no clipboard program found".to_string()))?;

    debug!("Copying to clipboard with {}", program.display());
    let mut child = tokio::process::Command::new(&program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ToolError::ClipboardError(e.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| ToolError::ClipboardError(e.to_string()))?;
    }

    let status = child
        .wait()
        .await
        .map_err(|e| ToolError::ClipboardError(e.to_string()))?;
    if !status.success() {
        return Err(ToolError::ClipboardError(format!(
            "{} exited with {}",
            program.display(),
            status
        )));
    }
    Ok(())
}

/// Writes one converted image into `dir` and returns the written path.
pub async fn download(dir: &Path, image: &ConvertedImage) -> Result<PathBuf, ToolError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(sanitize_filename(&image.name));
    tokio::fs::write(&path, &image.data).await?;
    info!("Saved {}", path.display());
    Ok(path)
}

/// Writes every converted image in order. Stops at the first write error.
pub async fn download_all(
    dir: &Path,
    images: &[ConvertedImage],
) -> Result<Vec<PathBuf>, ToolError> {
    let mut written = Vec::with_capacity(images.len());
    for image in images {
        written.push(download(dir, image).await?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::PluginInfo;
    use crate::report::ReportBuilder;
    use crate::validator::normalize_url;
    use crate::OutputFormat;

    fn image(name: &str, data: &[u8]) -> ConvertedImage {
        ConvertedImage {
            name: name.to_string(),
            source_name: name.replace(".webp", ".png"),
            data: data.to_vec(),
            size: data.len(),
            source_size: data.len() * 2,
            width: 2,
            height: 2,
            format: OutputFormat::Webp,
        }
    }

    #[test]
    fn test_report_text_keeps_order() {
        let mut builder = ReportBuilder::new();
        builder.pass("First", "ok").warn("Second", "hmm").fail("Third", "bad");
        let text = builder.build().render_text();
        let first = text.find("First").unwrap();
        let second = text.find("Second").unwrap();
        let third = text.find("Third").unwrap();
        assert!(first < second && second < third);
        assert!(text.starts_with("Score: 33/100"));
    }

    #[test]
    fn test_plugins_json() {
        let detection = PluginDetection {
            site: normalize_url("example.com").unwrap(),
            plugins: vec![PluginInfo::from_slug("contact-form-7")],
        };
        let json = Presenter::new(true).format(&detection).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["site"], "https://example.com");
        assert_eq!(value["plugins"][0]["name"], "Contact Form 7");

        let text = Presenter::new(false).format(&detection).unwrap();
        assert!(text.contains("Contact Form 7 (https://wordpress.org/plugins/contact-form-7/)"));
    }

    #[test]
    fn test_manual_theme_lists_steps() {
        let text = ThemeInfo::manual_detection().render_text();
        assert!(text.starts_with("Theme: Manual Detection Required"));
        assert!(text.contains(&format!("{}. ", MANUAL_THEME_STEPS.len())));
    }

    #[test]
    fn test_fallback_speed_shows_na() {
        let report = SpeedReport::fallback(normalize_url("example.com").unwrap());
        let text = report.render_text();
        assert!(text.contains("Load time: N/A"));
        assert!(text.contains("Score: 75/100 (average)"));
    }

    #[test]
    fn test_notice_vs_error() {
        let presenter = Presenter::default();
        let notice = presenter.format_error(&ToolError::NoSignalFound("nothing here".to_string()));
        assert_eq!(notice, "Notice: nothing here");
        let error = presenter.format_error(&ToolError::NetworkError("refused".to_string()));
        assert!(error.starts_with("Error: "));
    }

    #[test]
    fn test_empty_history() {
        let entries: Vec<SavedPassword> = Vec::new();
        assert_eq!(entries.render_text(), "No saved passwords\n");
        let json = Presenter::new(true).format(entries.as_slice()).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn test_batch_outcome_json_omits_bytes() {
        let outcome = BatchOutcome {
            converted: vec![image("a.webp", b"abc")],
            failures: vec![(
                PathBuf::from("b.png"),
                ToolError::DecodeError("bad".to_string()),
            )],
            skipped: vec![PathBuf::from("c.txt")],
        };
        let value: serde_json::Value =
            serde_json::from_str(&Presenter::new(true).format(&outcome).unwrap()).unwrap();
        assert_eq!(value["converted"][0]["name"], "a.webp");
        assert!(value["converted"][0].get("data").is_none());
        assert_eq!(value["failures"][0]["file"], "b.png");
        assert_eq!(value["skipped"][0], "c.txt");
        assert_eq!(value["total_output_bytes"], 3);
    }

    #[tokio::test]
    async fn test_download_all_writes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![image("one.webp", b"111"), image("two.webp", b"22")];
        let written = download_all(dir.path(), &images).await.unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(std::fs::read(&written[0]).unwrap(), b"111");
        assert_eq!(written[1].file_name().unwrap(), "two.webp");
    }

    #[tokio::test]
    async fn test_duplicate_names_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![image("same.webp", b"first"), image("same.webp", b"second")];
        let written = download_all(dir.path(), &images).await.unwrap();
        assert_eq!(written[0], written[1]);
        assert_eq!(std::fs::read(&written[0]).unwrap(), b"second");
    }
}
