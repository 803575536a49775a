// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for Workboard.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WORKBOARD_*`)
//!
//! # Usage
//!
//! ```ignore
//! use workboard_config::load_config;
//!
//! let config = load_config()?;
//! println!("Database at {}", config.database.url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::WorkboardConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct WorkboardConfig {
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub bootstrap: BootstrapConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WORKBOARD_*`)
/// 2. Config file (`/etc/workboard/workboard.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<WorkboardConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::process()),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<WorkboardConfig, ConfigError> {
	let mut merged = WorkboardConfigLayer::default();
	merged.merge(EnvSource::process().load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<WorkboardConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::process()),
	])
}

/// Merge the given sources in precedence order and finalize.
pub fn load_config_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<WorkboardConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = WorkboardConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

fn finalize(layer: WorkboardConfigLayer) -> Result<WorkboardConfig, ConfigError> {
	validate_layer(&layer)?;

	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let bootstrap = layer.bootstrap.unwrap_or_default().finalize();

	info!(
		database = %database.url,
		max_connections = database.max_connections,
		log_format = %logging.format,
		bootstrap_admin = bootstrap.admin.is_some(),
		"Workboard configuration loaded"
	);

	Ok(WorkboardConfig {
		database,
		logging,
		bootstrap,
	})
}

/// Validate cross-field configuration rules.
fn validate_layer(layer: &WorkboardConfigLayer) -> Result<(), ConfigError> {
	if let Some(database) = &layer.database {
		if database.max_connections == Some(0) {
			return Err(ConfigError::Validation(
				"database.max_connections must be at least 1".to_string(),
			));
		}
		if database.url.as_deref().is_some_and(|u| u.trim().is_empty()) {
			return Err(ConfigError::Validation("database.url must not be blank".to_string()));
		}
	}

	if let Some(bootstrap) = &layer.bootstrap {
		let has_email = bootstrap
			.admin_email
			.as_deref()
			.is_some_and(|e| !e.trim().is_empty());
		if bootstrap.admin_name.is_some() && !has_email {
			return Err(ConfigError::Validation(
				"bootstrap.admin_name is set without bootstrap.admin_email".to_string(),
			));
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	fn env(vars: &[(&str, &str)]) -> Box<dyn ConfigSource> {
		Box::new(EnvSource::from_vars(vars.iter().copied()))
	}

	#[test]
	fn test_defaults_only() {
		let config = load_config_from_sources(vec![Box::new(DefaultsSource), env(&[])]).unwrap();
		assert_eq!(config.database, DatabaseConfig::default());
		assert_eq!(config.logging, LoggingConfig::default());
		assert!(config.bootstrap.admin.is_none());
	}

	#[test]
	fn test_environment_overrides_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			"[database]\nurl = \"sqlite:/from/file.db\"\nmax_connections = 8\n\n[logging]\nlevel = \"warn\""
		)
		.unwrap();

		// Deliberately out of order; sources are sorted by precedence.
		let config = load_config_from_sources(vec![
			env(&[("WORKBOARD_DATABASE_URL", "sqlite:/from/env.db")]),
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		])
		.unwrap();

		assert_eq!(config.database.url, "sqlite:/from/env.db");
		assert_eq!(config.database.max_connections, 8);
		assert_eq!(config.logging.level, "warn");
	}

	#[test]
	fn test_bootstrap_admin_from_env() {
		let config = load_config_from_sources(vec![env(&[
			("WORKBOARD_BOOTSTRAP_ADMIN_EMAIL", "Root@Example.com"),
			("WORKBOARD_BOOTSTRAP_ADMIN_NAME", "Root"),
		])])
		.unwrap();

		let admin = config.bootstrap.admin.unwrap();
		assert_eq!(admin.email, "Root@Example.com");
		assert_eq!(admin.name, "Root");
	}

	mod validation {
		use super::*;

		#[test]
		fn test_zero_connections_rejected() {
			let result =
				load_config_from_sources(vec![env(&[("WORKBOARD_DATABASE_MAX_CONNECTIONS", "0")])]);
			assert!(matches!(result, Err(ConfigError::Validation(_))));
		}

		#[test]
		fn test_admin_name_without_email_rejected() {
			let result =
				load_config_from_sources(vec![env(&[("WORKBOARD_BOOTSTRAP_ADMIN_NAME", "Root")])]);
			assert!(matches!(result, Err(ConfigError::Validation(_))));
		}

		#[test]
		fn test_blank_url_in_file_rejected() {
			let mut file = tempfile::NamedTempFile::new().unwrap();
			writeln!(file, "[database]\nurl = \"  \"").unwrap();

			let result = load_config_from_sources(vec![Box::new(TomlSource::new(file.path()))]);
			assert!(matches!(result, Err(ConfigError::Validation(_))));
		}
	}
}
