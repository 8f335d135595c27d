// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Aggregate outcome of a multi-target workflow.
//!
//! One target's failure never aborts the batch: it is recorded and the
//! remaining targets still run. The workflow as a whole reports non-zero
//! when any item failed.

use crate::application::error::LifecycleError;

#[derive(Debug)]
pub struct ItemSuccess {
    pub target: String,
    /// Human-oriented detail, e.g. the produced archive path.
    pub detail: String,
}

#[derive(Debug)]
pub struct ItemFailure {
    pub target: String,
    pub error: LifecycleError,
}

#[derive(Debug, Default)]
pub struct WorkflowReport {
    pub completed: Vec<ItemSuccess>,
    pub failures: Vec<ItemFailure>,
    pub warnings: Vec<String>,
}

impl WorkflowReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeeded(&mut self, target: impl Into<String>, detail: impl Into<String>) {
        self.completed.push(ItemSuccess {
            target: target.into(),
            detail: detail.into(),
        });
    }

    pub fn failed(&mut self, target: impl Into<String>, error: LifecycleError) {
        self.failures.push(ItemFailure {
            target: target.into(),
            error,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
