//! Per-invocation state for a tool
//!
//! Each tool owns a [`ToolSlot`]. Starting an invocation claims the slot; a
//! second start while the first is still pending is rejected with
//! [`ToolError::Busy`], the CLI counterpart of a disabled button. Dropping the
//! [`Invocation`] returns the slot to `Idle`.

use crate::ToolError;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    Idle,
    Validating,
    Fetching,
    Decoding,
    Extracting,
    Encoding,
    Reporting,
}

/// Legal edges of `Idle -> Validating -> Fetching/Decoding ->
/// Extracting/Encoding -> Reporting -> Idle`.
///
/// Tools with no network or codec step may go straight from `Validating` to a
/// later stage, and a failed fetch may jump to `Reporting` with a fallback.
pub fn can_transition(from: ToolState, to: ToolState) -> bool {
    use ToolState::*;

    matches!(
        (from, to),
        (Idle, Validating)
            | (Validating, Idle)
            | (Validating, Fetching)
            | (Validating, Decoding)
            | (Validating, Extracting)
            | (Validating, Reporting)
            | (Fetching, Extracting)
            | (Fetching, Reporting)
            | (Decoding, Encoding)
            | (Decoding, Reporting)
            | (Encoding, Decoding)
            | (Encoding, Reporting)
            | (Extracting, Reporting)
            | (Reporting, Idle)
    )
}

#[derive(Debug)]
pub struct ToolSlot {
    name: &'static str,
    pending: AtomicBool,
}

impl ToolSlot {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            pending: AtomicBool::new(false),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn try_begin(&self) -> Result<Invocation<'_>, ToolError> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                ToolError::Busy(format!("{} is already running", self.name))
            })?;

        crate::metrics::record_invocation(self.name);
        Ok(Invocation {
            slot: self,
            state: ToolState::Idle,
            trail: vec![ToolState::Idle],
        })
    }
}

#[derive(Debug)]
pub struct Invocation<'a> {
    slot: &'a ToolSlot,
    state: ToolState,
    trail: Vec<ToolState>,
}

impl Invocation<'_> {
    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn tool(&self) -> &'static str {
        self.slot.name
    }

    /// Every state visited so far, starting with `Idle`.
    pub fn trail(&self) -> &[ToolState] {
        &self.trail
    }

    pub fn advance(&mut self, next: ToolState) {
        debug_assert!(
            can_transition(self.state, next),
            "{}: illegal transition {:?} -> {:?}",
            self.slot.name,
            self.state,
            next
        );
        debug!("{}: {:?} -> {:?}", self.slot.name, self.state, next);
        self.state = next;
        self.trail.push(next);
    }

    /// Records a failure at the current stage and returns the error unchanged.
    pub fn fail(&mut self, error: ToolError) -> ToolError {
        crate::metrics::record_failure(self.slot.name, &error);
        if self.state == ToolState::Validating {
            self.advance(ToolState::Idle);
        }
        error
    }
}

impl Drop for Invocation<'_> {
    fn drop(&mut self) {
        if self.state != ToolState::Idle {
            debug!("{}: {:?} -> Idle", self.slot.name, self.state);
        }
        self.slot.pending.store(false, Ordering::Release);
    }
}
