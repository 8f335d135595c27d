// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Compensating actions for multi-step destructive workflows.
//!
//! Each destructive step that succeeds pushes the action that would undo its
//! externally visible effect. On failure the stack unwinds in reverse; the
//! unwind outcome is combined with the primary error, never substituted for
//! it.

use crate::application::error::LifecycleError;
use crate::domain::engine::ContainerEngine;
use tracing::warn;

#[derive(Debug)]
pub enum Compensation {
    /// Restart containers that were stopped on the way in.
    RestartContainers {
        containers: Vec<String>,
        timeout_secs: i64,
    },
}

#[derive(Debug, Default)]
pub struct CompensationStack {
    actions: Vec<Compensation>,
}

impl CompensationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Compensation) {
        self.actions.push(action);
    }

    /// Drop all pending actions; the workflow reached a state where they no
    /// longer apply.
    pub fn discard(&mut self) {
        self.actions.clear();
    }

    /// Run all pending actions in reverse order. Every action is attempted
    /// even if an earlier one fails; failures come back as descriptions.
    pub async fn unwind(&mut self, engine: &dyn ContainerEngine) -> Vec<String> {
        let mut failures = Vec::new();
        while let Some(action) = self.actions.pop() {
            match action {
                Compensation::RestartContainers { containers, timeout_secs } => {
                    warn!(?containers, "unwinding: restarting containers");
                    if let Err(e) = engine.restart_containers(&containers, timeout_secs).await {
                        failures.push(format!("failed to restart containers: {e}"));
                    }
                }
            }
        }
        failures
    }

    /// Unwind after `primary` failed, combining a failed unwind into the
    /// returned error.
    pub async fn fail(
        &mut self,
        engine: &dyn ContainerEngine,
        primary: LifecycleError,
    ) -> LifecycleError {
        let failures = self.unwind(engine).await;
        if failures.is_empty() {
            primary
        } else {
            LifecycleError::Compensated {
                primary: Box::new(primary),
                rollback: failures.join("; "),
            }
        }
    }
}
