// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Exit-code mapping for workflow failures.

use volman_core::application::LifecycleError;

pub const EXIT_ERROR: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_IN_USE: u8 = 5;
pub const EXIT_NO_DEFINITION: u8 = 6;

pub fn code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<LifecycleError>() {
        Some(LifecycleError::VolumeNotFound(_))
        | Some(LifecycleError::ServiceNotFound(_))
        | Some(LifecycleError::BackupNotFound(_)) => EXIT_NOT_FOUND,
        Some(LifecycleError::InUse { .. }) => EXIT_IN_USE,
        Some(LifecycleError::DefinitionNotFound) | Some(LifecycleError::Definition(_)) => {
            EXIT_NO_DEFINITION
        }
        _ => EXIT_ERROR,
    }
}
