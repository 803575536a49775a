// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity records.
//!
//! This module provides:
//! - [`Member`] - the canonical project identity referenced by every member list
//! - [`DirectoryUser`] - a pre-existing directory principal, read-only here
//! - [`Principal`] - either of the two, as returned by an identity lookup
//! - [`NewMember`] / [`MemberPatch`] - inputs for direct creation and edits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{normalize_email, DirectoryUserId, MemberId, Role};

/// Designation given to members promoted from the directory.
pub const REGISTERED_USER_DESIGNATION: &str = "Registered User";

/// A canonical project member.
///
/// Exactly one member exists per (normalized) email. The id is assigned once
/// and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
	#[serde(rename = "memberId")]
	pub id: MemberId,
	pub name: String,
	pub email: String,
	pub phone: String,
	pub designation: String,
	pub role: Role,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Member {
	/// Creates a member from explicit input.
	pub fn new(input: NewMember) -> Self {
		let now = Utc::now();
		Self {
			id: MemberId::generate(),
			name: input.name.trim().to_string(),
			email: normalize_email(&input.email),
			phone: input.phone.unwrap_or_default(),
			designation: input.designation.unwrap_or_default(),
			role: Role::or_default(input.role.as_ref().map(Role::as_str)),
			created_at: now,
			updated_at: now,
		}
	}

	/// Builds the member a directory user is promoted into.
	///
	/// The directory user itself is left untouched.
	pub fn promoted_from(user: &DirectoryUser) -> Self {
		Self::promoted_with(user, &MemberPatch::default())
	}

	/// Promotion with caller-supplied overrides taking precedence over the
	/// directory attributes. The email always comes from the directory.
	pub fn promoted_with(user: &DirectoryUser, patch: &MemberPatch) -> Self {
		let now = Utc::now();
		Self {
			id: MemberId::generate(),
			name: patch.name.clone().unwrap_or_else(|| user.name.clone()),
			email: normalize_email(&user.email),
			phone: patch
				.phone
				.clone()
				.or_else(|| user.phone.clone())
				.unwrap_or_default(),
			designation: patch
				.designation
				.clone()
				.unwrap_or_else(|| REGISTERED_USER_DESIGNATION.to_string()),
			role: patch
				.role
				.clone()
				.unwrap_or_else(|| Role::or_default(user.role.as_ref().map(Role::as_str))),
			created_at: now,
			updated_at: now,
		}
	}

	/// Applies a partial update. Returns true if anything changed.
	pub fn apply(&mut self, patch: MemberPatch) -> bool {
		let before = self.clone();
		if let Some(name) = patch.name {
			self.name = name;
		}
		if let Some(email) = patch.email {
			self.email = normalize_email(&email);
		}
		if let Some(phone) = patch.phone {
			self.phone = phone;
		}
		if let Some(designation) = patch.designation {
			self.designation = designation;
		}
		if let Some(role) = patch.role {
			self.role = role;
		}
		let changed = *self != before;
		if changed {
			self.updated_at = Utc::now();
		}
		changed
	}
}

/// Input for creating a member directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMember {
	pub name: String,
	pub email: String,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub designation: Option<String>,
	#[serde(default)]
	pub role: Option<Role>,
}

/// Partial member update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberPatch {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub designation: Option<String>,
	#[serde(default)]
	pub role: Option<Role>,
}

/// A principal from the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
	pub id: DirectoryUserId,
	pub name: String,
	pub email: String,
	pub phone: Option<String>,
	pub role: Option<Role>,
	pub created_at: DateTime<Utc>,
}

impl DirectoryUser {
	pub fn new(name: impl Into<String>, email: impl Into<String>, role: Option<Role>) -> Self {
		Self {
			id: DirectoryUserId::generate(),
			name: name.into(),
			email: normalize_email(&email.into()),
			phone: None,
			role,
			created_at: Utc::now(),
		}
	}

	pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
		self.phone = Some(phone.into());
		self
	}
}

/// Any principal the identity store knows about.
///
/// Membership lists only ever hold [`Principal::Canonical`] ids; turning an
/// external principal into a canonical one is the resolver's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
	Canonical(Member),
	External(DirectoryUser),
}

impl Principal {
	pub fn email(&self) -> &str {
		match self {
			Principal::Canonical(m) => &m.email,
			Principal::External(u) => &u.email,
		}
	}

	pub fn name(&self) -> &str {
		match self {
			Principal::Canonical(m) => &m.name,
			Principal::External(u) => &u.name,
		}
	}

	pub fn is_canonical(&self) -> bool {
		matches!(self, Principal::Canonical(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn directory_user() -> DirectoryUser {
		DirectoryUser::new("Grace Hopper", "Grace@Navy.mil", Some(Role::new("lead")))
	}

	mod member {
		use super::*;

		#[test]
		fn new_normalizes_and_defaults() {
			let member = Member::new(NewMember {
				name: "  Ada ".to_string(),
				email: " ADA@example.com".to_string(),
				..Default::default()
			});

			assert_eq!(member.name, "Ada");
			assert_eq!(member.email, "ada@example.com");
			assert_eq!(member.phone, "");
			assert_eq!(member.role, Role::member());
			assert_eq!(member.created_at, member.updated_at);
		}

		#[test]
		fn new_generates_unique_ids() {
			let a = Member::new(NewMember::default());
			let b = Member::new(NewMember::default());
			assert_ne!(a.id, b.id);
		}

		#[test]
		fn serializes_member_id_in_camel_case() {
			let member = Member::new(NewMember {
				name: "Ada".to_string(),
				email: "ada@example.com".to_string(),
				..Default::default()
			});
			let json = serde_json::to_value(&member).unwrap();
			assert_eq!(json["memberId"], member.id.to_string());
			assert!(json.get("createdAt").is_some());
		}

		#[test]
		fn apply_reports_changes() {
			let mut member = Member::new(NewMember {
				name: "Ada".to_string(),
				email: "ada@example.com".to_string(),
				..Default::default()
			});

			assert!(!member.apply(MemberPatch::default()));
			assert!(member.apply(MemberPatch {
				phone: Some("555".to_string()),
				..Default::default()
			}));
			assert_eq!(member.phone, "555");
			assert_eq!(member.name, "Ada");
		}
	}

	mod promotion {
		use super::*;

		#[test]
		fn copies_directory_attributes() {
			let user = directory_user().with_phone("123");
			let member = Member::promoted_from(&user);

			assert_eq!(member.name, "Grace Hopper");
			assert_eq!(member.email, "grace@navy.mil");
			assert_eq!(member.phone, "123");
			assert_eq!(member.designation, REGISTERED_USER_DESIGNATION);
			assert_eq!(member.role, Role::new("lead"));
		}

		#[test]
		fn defaults_phone_and_role() {
			let user = DirectoryUser::new("Linus", "linus@example.com", None);
			let member = Member::promoted_from(&user);

			assert_eq!(member.phone, "");
			assert_eq!(member.role, Role::member());
		}

		#[test]
		fn patch_overrides_directory_values_but_not_email() {
			let user = directory_user();
			let patch = MemberPatch {
				name: Some("Admiral Hopper".to_string()),
				email: Some("other@example.com".to_string()),
				designation: Some("Architect".to_string()),
				..Default::default()
			};
			let member = Member::promoted_with(&user, &patch);

			assert_eq!(member.name, "Admiral Hopper");
			assert_eq!(member.email, "grace@navy.mil");
			assert_eq!(member.designation, "Architect");
			assert_eq!(member.role, Role::new("lead"));
		}
	}

	#[test]
	fn principal_accessors() {
		let user = directory_user();
		let external = Principal::External(user.clone());
		let canonical = Principal::Canonical(Member::promoted_from(&user));

		assert_eq!(external.email(), canonical.email());
		assert!(!external.is_canonical());
		assert!(canonical.is_canonical());
		assert_eq!(external.name(), "Grace Hopper");
	}
}
