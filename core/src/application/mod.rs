// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application layer: the lifecycle workflows.
//!
//! Every workflow follows Resolve → Precondition-check → Act → Record →
//! Cleanup/Rollback, threaded through an explicit [`context::ProjectContext`].

pub mod archive;
pub mod backup;
pub mod clean;
pub mod clone;
pub mod compensation;
pub mod context;
pub mod error;
pub mod history;
pub mod inspect;
pub mod list;
pub mod prompt;
pub mod report;
pub mod restore;
pub mod swap;

pub use context::ProjectContext;
pub use error::LifecycleError;
pub use report::WorkflowReport;
