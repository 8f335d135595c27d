// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the volman CLI.

pub mod archive;
pub mod backup;
pub mod clean;
pub mod clone;
pub mod history;
pub mod inspect;
pub mod list;
pub mod restore;
pub mod swap;

pub use self::archive::ArchiveArgs;
pub use self::backup::BackupArgs;
pub use self::clean::CleanArgs;
pub use self::clone::CloneArgs;
pub use self::history::HistoryArgs;
pub use self::inspect::InspectArgs;
pub use self::list::ListArgs;
pub use self::restore::RestoreArgs;
pub use self::swap::SwapArgs;
