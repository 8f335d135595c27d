// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Infrastructure layer: Docker engine, SQLite metadata store, definition
//! parsing and the archive filesystem.

pub mod archive;
pub mod compose;
pub mod docker;
pub mod metadata;
