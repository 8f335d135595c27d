// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # volman-core
//!
//! Volume lifecycle management for multi-service container projects:
//! definition parsing with environment substitution, project/volume name
//! resolution, and the backup/restore/swap/archive/clean workflows over the
//! container engine and metadata store contracts.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod testing;

pub use application::{LifecycleError, ProjectContext, WorkflowReport};
pub use config::Config;
