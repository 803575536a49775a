// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions shared by every Workboard crate.
//!
//! - **ID newtypes**: Type-safe wrappers around UUIDs for each entity kind
//!   ([`MemberId`], [`DirectoryUserId`], [`GroupId`], etc.) so a directory
//!   user id can never be stored where a canonical member id is expected
//! - **Roles**: the open [`Role`] set carried by members and directory users
//!
//! All ID types implement transparent serde serialization (as UUID strings) and
//! provide conversion to/from [`uuid::Uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// ID Newtypes
// =============================================================================

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s.trim()).map(Self)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(MemberId, "Canonical identifier for a project member.");
define_id_type!(
	DirectoryUserId,
	"Identifier for a pre-existing directory user (never stored in member lists)."
);
define_id_type!(GroupId, "Unique identifier for a workgroup.");
define_id_type!(SubgroupId, "Unique identifier for a workspace embedded in a workgroup.");
define_id_type!(ProjectTaskId, "Unique identifier for a project task.");
define_id_type!(TaskId, "Unique identifier for a personal task.");

// =============================================================================
// Roles
// =============================================================================

/// A principal's role.
///
/// The set is open: anything the directory hands us is kept verbatim. Only
/// `admin` carries meaning here and it is compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
	pub const ADMIN: &'static str = "admin";
	pub const MEMBER: &'static str = "member";

	pub fn new(role: impl Into<String>) -> Self {
		Self(role.into())
	}

	pub fn admin() -> Self {
		Self(Self::ADMIN.to_string())
	}

	pub fn member() -> Self {
		Self(Self::MEMBER.to_string())
	}

	/// Parse an optional role string, falling back to `member` for blanks.
	pub fn or_default(role: Option<&str>) -> Self {
		match role.map(str::trim) {
			Some(r) if !r.is_empty() => Self::new(r),
			_ => Self::member(),
		}
	}

	/// Returns true if this role grants administrator rights.
	pub fn is_admin(&self) -> bool {
		self.0.trim().eq_ignore_ascii_case(Self::ADMIN)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Default for Role {
	fn default() -> Self {
		Self::member()
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Role {
	fn from(role: &str) -> Self {
		Self::new(role)
	}
}

/// Normalize an email for identity comparison.
///
/// Members and directory users are unified by email, so both sides must agree
/// on one spelling: surrounding whitespace dropped, ASCII lowercased.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::collections::HashSet;

	proptest! {
		#[test]
		fn member_id_generation_is_unique(count in 1..500usize) {
			let mut ids = HashSet::new();
			for _ in 0..count {
				prop_assert!(ids.insert(MemberId::generate()), "Generated duplicate MemberId");
			}
		}

		#[test]
		fn admin_role_is_case_insensitive(mask in proptest::collection::vec(any::<bool>(), 5)) {
			let role: String = "admin"
				.chars()
				.zip(mask)
				.map(|(c, upper)| if upper { c.to_ascii_uppercase() } else { c })
				.collect();
			prop_assert!(Role::new(role).is_admin());
		}

		#[test]
		fn normalize_email_is_idempotent(email in "[ A-Za-z0-9.@_-]{0,40}") {
			let once = normalize_email(&email);
			prop_assert_eq!(normalize_email(&once), once);
		}
	}

	#[test]
	fn parses_id_from_string() {
		let id = GroupId::generate();
		let parsed: GroupId = id.to_string().parse().unwrap();
		assert_eq!(parsed, id);
	}

	#[test]
	fn rejects_malformed_id() {
		assert!("not-a-uuid".parse::<MemberId>().is_err());
	}

	#[test]
	fn role_defaults_to_member() {
		assert_eq!(Role::default().as_str(), "member");
		assert_eq!(Role::or_default(None).as_str(), "member");
		assert_eq!(Role::or_default(Some("  ")).as_str(), "member");
		assert_eq!(Role::or_default(Some("lead")).as_str(), "lead");
	}

	#[test]
	fn only_admin_is_admin() {
		assert!(Role::admin().is_admin());
		assert!(Role::new(" Admin ").is_admin());
		assert!(!Role::member().is_admin());
		assert!(!Role::new("administrator").is_admin());
	}

	#[test]
	fn role_serializes_as_plain_string() {
		let json = serde_json::to_string(&Role::new("lead")).unwrap();
		assert_eq!(json, "\"lead\"");
	}

	#[test]
	fn normalizes_email() {
		assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
	}
}
