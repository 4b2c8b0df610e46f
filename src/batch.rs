use crate::codec::{decode_image, encode_image, is_image_path, output_file_name, ConvertedImage};
use crate::pipeline::{Invocation, ToolState};
use crate::{metrics, OutputFormat, ToolError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Converts files one at a time, reporting exact progress after each.
pub struct BatchConverter {
    format: OutputFormat,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub converted: Vec<ConvertedImage>,
    pub failures: Vec<(PathBuf, ToolError)>,
    pub skipped: Vec<PathBuf>,
}

impl BatchOutcome {
    pub fn total_input_bytes(&self) -> usize {
        self.converted.iter().map(|c| c.source_size).sum()
    }

    pub fn total_output_bytes(&self) -> usize {
        self.converted.iter().map(|c| c.size).sum()
    }
}

/// Splits `paths` into image files to convert and everything else.
pub fn partition_images(paths: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<PathBuf>) {
    paths.into_iter().partition(|p| is_image_path(p))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl BatchConverter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Reads and converts one file, moving `invocation` through the decode
    /// and encode stages.
    pub async fn convert_file(
        &self,
        invocation: &mut Invocation<'_>,
        path: &Path,
    ) -> Result<ConvertedImage, ToolError> {
        if invocation.state() != ToolState::Decoding {
            invocation.advance(ToolState::Decoding);
        }
        let bytes = tokio::fs::read(path).await?;
        let source_name = display_name(path);
        let source_size = bytes.len();
        let image = tokio::task::spawn_blocking(move || decode_image(&bytes)).await??;

        invocation.advance(ToolState::Encoding);
        let format = self.format;
        let (width, height) = (image.width(), image.height());
        let data = tokio::task::spawn_blocking(move || encode_image(&image, format)).await??;
        metrics::record_conversion(source_size, data.len());

        Ok(ConvertedImage {
            name: output_file_name(&source_name, format),
            source_name,
            size: data.len(),
            source_size,
            width,
            height,
            format,
            data,
        })
    }

    /// Filters out non-image paths, then converts the rest sequentially.
    ///
    /// A file that fails to decode or encode is recorded in `failures` and the
    /// batch moves on; `on_progress` sees every file, failed or not. A
    /// selection with no image files is rejected as `InvalidInput`.
    pub async fn convert_all<F>(
        &self,
        invocation: &mut Invocation<'_>,
        paths: Vec<PathBuf>,
        mut on_progress: F,
    ) -> Result<BatchOutcome, ToolError>
    where
        F: FnMut(&ProgressInfo),
    {
        invocation.advance(ToolState::Validating);
        let (images, skipped) = partition_images(paths);
        if !skipped.is_empty() {
            warn!(
                "Some files were skipped (only image files are supported): {}",
                skipped.len()
            );
        }
        if images.is_empty() {
            return Err(invocation.fail(ToolError::InvalidInput(
                "Please select images to convert".to_string(),
            )));
        }

        let tracker = ProgressTracker::new(images.len());
        let mut outcome = BatchOutcome {
            skipped,
            ..Default::default()
        };

        info!("Converting {} image(s) to {}", images.len(), self.format.extension());

        for path in images {
            match self.convert_file(invocation, &path).await {
                Ok(converted) => {
                    debug!(
                        "Converted {} -> {} ({} bytes)",
                        path.display(),
                        converted.name,
                        converted.size
                    );
                    tracker.record_completion(true);
                    outcome.converted.push(converted);
                }
                Err(e) => {
                    warn!("Failed to convert {}: {}", path.display(), e);
                    tracker.record_completion(false);
                    outcome.failures.push((path, invocation.fail(e)));
                }
            }
            on_progress(&tracker.get_progress());
        }

        invocation.advance(ToolState::Reporting);
        Ok(outcome)
    }
}

pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
    errors: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_completion(&self, success: bool) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get_progress(&self) -> ProgressInfo {
        let completed = self.completed.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);

        ProgressInfo {
            total: self.total,
            completed,
            errors,
            success: completed - errors,
            elapsed: self.start_time.elapsed(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed.load(Ordering::Relaxed) >= self.total
    }
}

#[derive(Debug, Clone)]
pub struct ProgressInfo {
    pub total: usize,
    pub completed: usize,
    pub errors: usize,
    pub success: usize,
    pub elapsed: Duration,
}

impl ProgressInfo {
    /// `completed / total * 100`; an empty batch counts as done.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.completed as f64 / self.total as f64) * 100.0
    }
}
