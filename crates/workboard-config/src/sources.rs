// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files and environment variables.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::WorkboardConfigLayer;
use crate::sections::{BootstrapConfigLayer, DatabaseConfigLayer, LogFormat, LoggingConfigLayer};

/// Default system-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/workboard/workboard.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<WorkboardConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<WorkboardConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(WorkboardConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<WorkboardConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(WorkboardConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: WorkboardConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WORKBOARD_<SECTION>_<FIELD>
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Reads the process environment.
	pub fn process() -> Self {
		Self { vars: None }
	}

	/// Reads from a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		let value = match &self.vars {
			Some(vars) => vars.get(name).cloned(),
			None => std::env::var(name).ok(),
		};
		value.filter(|s| !s.is_empty())
	}

	fn var_u32(&self, name: &str) -> Result<Option<u32>, ConfigError> {
		match self.var(name) {
			Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("invalid u32 value '{v}'"),
			}),
			None => Ok(None),
		}
	}

	fn load_database(&self) -> Result<DatabaseConfigLayer, ConfigError> {
		Ok(DatabaseConfigLayer {
			url: self.var("WORKBOARD_DATABASE_URL"),
			max_connections: self.var_u32("WORKBOARD_DATABASE_MAX_CONNECTIONS")?,
		})
	}

	fn load_logging(&self) -> Result<LoggingConfigLayer, ConfigError> {
		let format = match self.var("WORKBOARD_LOG_FORMAT") {
			Some(v) => Some(v.parse::<LogFormat>().map_err(|message| ConfigError::InvalidValue {
				key: "WORKBOARD_LOG_FORMAT".to_string(),
				message,
			})?),
			None => None,
		};

		Ok(LoggingConfigLayer {
			level: self.var("WORKBOARD_LOG_LEVEL"),
			format,
		})
	}

	fn load_bootstrap(&self) -> Result<BootstrapConfigLayer, ConfigError> {
		Ok(BootstrapConfigLayer {
			admin_email: self.var("WORKBOARD_BOOTSTRAP_ADMIN_EMAIL"),
			admin_name: self.var("WORKBOARD_BOOTSTRAP_ADMIN_NAME"),
		})
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<WorkboardConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(WorkboardConfigLayer {
			database: Some(self.load_database()?),
			logging: Some(self.load_logging()?),
			bootstrap: Some(self.load_bootstrap()?),
		})
	}
}
