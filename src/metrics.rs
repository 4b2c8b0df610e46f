//! Tool metrics on the `metrics` facade
//!
//! Recording is a no-op until a recorder is installed; `--metrics` installs the
//! Prometheus recorder and prints the exposition once the command finishes.

use crate::ToolError;
use metrics::{counter, histogram, increment_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub fn record_invocation(tool: &'static str) {
    increment_counter!("wp_toolkit_invocations_total", "tool" => tool);
}

pub fn record_failure(tool: &'static str, error: &ToolError) {
    increment_counter!(
        "wp_toolkit_failures_total",
        "tool" => tool,
        "kind" => error.kind()
    );
}

pub fn record_fallback(tool: &'static str) {
    increment_counter!("wp_toolkit_fallback_reports_total", "tool" => tool);
}

pub fn record_fetch(duration: Duration) {
    histogram!("wp_toolkit_fetch_duration_seconds", duration.as_secs_f64());
}

pub fn record_conversion(input_bytes: usize, output_bytes: usize) {
    increment_counter!("wp_toolkit_images_converted_total");
    counter!("wp_toolkit_image_input_bytes_total", input_bytes as u64);
    counter!("wp_toolkit_image_output_bytes_total", output_bytes as u64);
}

pub fn install_prometheus() -> Result<PrometheusHandle, ToolError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ToolError::ConfigurationError(format!("metrics recorder: {e}")))
}
