//! # wp-toolkit
//!
//! Small, independent utilities for people running WordPress sites: a
//! password generator with saved history, plugin and theme detection, an SEO
//! checklist, a response-time speed report and a batch image converter.
//!
//! Every tool is one pass through the same pipeline:
//!
//! ```text
//! Idle -> Validating -> Fetching | Decoding -> Extracting | Encoding -> Reporting -> Idle
//! ```
//!
//! URL tools normalize their input with [`normalize_url`], fetch the page once
//! through a [`PageSource`], read signals with the pattern rules in
//! [`extract`] and hand a result to the [`Presenter`]. The converter decodes
//! and re-encodes files locally, one at a time.
//!
//! ## Error Handling
//!
//! All failures are [`ToolError`] values. `NoSignalFound` is a notice rather
//! than a failure: a site with no detectable plugins is a valid answer. The SEO
//! and speed tools substitute a generic report when the site cannot be reached;
//! the plugin and theme detectors surface the network error instead.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wp_toolkit::{detect_plugins, page_source, Config, ToolSlot};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let source = page_source(&config, false)?;
//!
//!     let slot = ToolSlot::new("plugins");
//!     let mut invocation = slot.try_begin()?;
//!     let detection = detect_plugins(&mut invocation, source.as_ref(), "example.com").await?;
//!     for plugin in detection.plugins {
//!         println!("{} ({})", plugin.name, plugin.directory_url);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! wp-toolkit password generate --length 24 --no-symbols
//! wp-toolkit plugins example.com
//! wp-toolkit seo example.com --mode html --json
//! wp-toolkit convert photos/*.png --output out/
//! ```
//!
//! ## Benchmarks
//!
//! `cargo bench` runs the criterion suite in `benches/benchmark.rs` (500ms
//! warm-up, 500ms measurement, 20 samples).

/// Configuration and settings shared by every tool
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// URL normalization for user input
pub mod validator;

/// Pattern rules over page HTML
pub mod extract;

/// Scored checklists
pub mod report;

/// Page fetching behind the `PageSource` seam
pub mod fetch;

/// Per-invocation state machine and re-entrancy guard
pub mod pipeline;

pub mod password;

/// Saved password list on disk
pub mod history;

/// Image decoding and re-encoding
pub mod codec;

/// Sequential batch conversion with progress
pub mod batch;

/// Plugin and theme detectors
pub mod detect;

pub mod seo;

pub mod speed;

/// Text/JSON rendering and copy/download actions
pub mod presenter;

/// Command-line interface implementation
pub mod cli;

/// Tool metrics on the `metrics` facade
pub mod metrics;

/// Utility functions and helpers
pub mod utils;


pub use batch::*;
pub use cli::*;
pub use codec::*;
pub use config::*;
pub use detect::*;
pub use error::*;
pub use extract::*;
pub use fetch::*;
pub use history::*;
pub use password::*;
pub use pipeline::*;
pub use presenter::*;
pub use report::*;
pub use seo::*;
pub use speed::*;
pub use utils::*;
pub use validator::*;

pub use self::metrics::install_prometheus;
