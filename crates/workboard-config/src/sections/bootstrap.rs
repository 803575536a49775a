// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Startup seeding of the administrator directory user.

use serde::Deserialize;

const DEFAULT_ADMIN_NAME: &str = "Administrator";

/// Bootstrap configuration (runtime, fully resolved).
///
/// `admin` is `None` when no admin email is configured; nothing is seeded then.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapConfig {
	pub admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
	pub email: String,
	pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfigLayer {
	#[serde(default)]
	pub admin_email: Option<String>,
	#[serde(default)]
	pub admin_name: Option<String>,
}

impl BootstrapConfigLayer {
	pub fn merge(&mut self, other: BootstrapConfigLayer) {
		if other.admin_email.is_some() {
			self.admin_email = other.admin_email;
		}
		if other.admin_name.is_some() {
			self.admin_name = other.admin_name;
		}
	}

	/// Returns `None` for the admin when only a name is set; the caller
	/// validates that combination before finalizing.
	pub fn finalize(self) -> BootstrapConfig {
		let admin = self
			.admin_email
			.map(|e| e.trim().to_string())
			.filter(|e| !e.is_empty())
			.map(|email| BootstrapAdmin {
				email,
				name: self
					.admin_name
					.filter(|n| !n.trim().is_empty())
					.unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
			});
		BootstrapConfig { admin }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_no_email_means_no_admin() {
		assert_eq!(BootstrapConfigLayer::default().finalize(), BootstrapConfig::default());
	}

	#[test]
	fn test_email_with_default_name() {
		let config = BootstrapConfigLayer {
			admin_email: Some(" root@example.com ".to_string()),
			admin_name: None,
		}
		.finalize();
		let admin = config.admin.unwrap();
		assert_eq!(admin.email, "root@example.com");
		assert_eq!(admin.name, "Administrator");
	}
}
