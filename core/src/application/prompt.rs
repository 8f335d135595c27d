// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Confirmation seam.
//!
//! Destructive gates (overwrite on restore, archive-and-delete, cleanup)
//! consult a [`Prompter`] so workflows stay independent of the terminal.
//! Forced and dry-run paths never reach it.

/// Answers confirmation questions and selection menus.
pub trait Prompter: Send + Sync {
    /// Ask a yes/no question; `false` declines.
    fn confirm(&self, prompt: &str) -> bool;

    /// Pick one of `items`; `None` aborts the selection.
    fn select(&self, prompt: &str, items: &[String]) -> Option<usize>;
}

/// Non-interactive prompter that accepts everything and picks the first
/// item. Suitable for unattended runs.
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }

    fn select(&self, _prompt: &str, items: &[String]) -> Option<usize> {
        if items.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}
