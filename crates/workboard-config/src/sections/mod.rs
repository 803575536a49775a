// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for workboard.

pub mod bootstrap;
pub mod database;
pub mod logging;

pub use bootstrap::{BootstrapAdmin, BootstrapConfig, BootstrapConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
