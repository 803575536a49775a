// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authenticated caller, as handed over by the request layer.
//!
//! Token verification happens upstream; by the time a [`Caller`] exists the
//! identity has been vouched for. `actor_ref` may be a canonical member id or
//! a directory user id, so it goes through the identity resolver like any
//! other raw reference.

use serde::{Deserialize, Serialize};

use crate::types::{normalize_email, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
	/// Opaque actor reference from the auth layer.
	pub actor_ref: String,
	/// Email claim of the authenticated principal.
	pub email: String,
	/// Role claim of the authenticated principal.
	pub role: Role,
}

impl Caller {
	pub fn new(actor_ref: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
		Self {
			actor_ref: actor_ref.into(),
			email: normalize_email(&email.into()),
			role,
		}
	}

	/// Returns true if the auth layer vouched for an administrator.
	pub fn is_admin(&self) -> bool {
		self.role.is_admin()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalizes_email_claim() {
		let caller = Caller::new("abc", " Ops@Example.com", Role::member());
		assert_eq!(caller.email, "ops@example.com");
		assert!(!caller.is_admin());
	}

	#[test]
	fn admin_claim_is_case_insensitive() {
		let caller = Caller::new("abc", "ops@example.com", Role::new("ADMIN"));
		assert!(caller.is_admin());
	}
}
