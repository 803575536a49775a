// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Conversion of raw references into canonical member ids.
//!
//! A raw reference is whatever a client sent: a canonical member id, a
//! directory user id, or garbage. [`IdentityResolver`] is the only place a
//! directory user turns into a [`Member`]; everything downstream stores
//! [`MemberId`]s only.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;
use workboard_core::{Caller, DirectoryUser, DirectoryUserId, Member, MemberId, Principal};
use workboard_db::{DbError, DirectoryUserStore, MemberStore};

use crate::error::{MembershipError, Result};
use crate::stores::Stores;

/// Outcome of resolving one raw reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Resolution {
	#[serde(rename_all = "camelCase")]
	Resolved {
		member_id: MemberId,
		/// True if this call created the member from a directory user.
		promoted: bool,
	},
	Unresolved,
}

impl Resolution {
	pub fn member_id(&self) -> Option<MemberId> {
		match self {
			Resolution::Resolved { member_id, .. } => Some(*member_id),
			Resolution::Unresolved => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefOutcome {
	pub raw_ref: String,
	#[serde(flatten)]
	pub resolution: Resolution,
}

/// Per-element outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResolution {
	pub outcomes: Vec<RefOutcome>,
}

impl BatchResolution {
	/// Resolved ids in input order. Duplicates in the input stay duplicated.
	pub fn member_ids(&self) -> Vec<MemberId> {
		self.outcomes.iter().filter_map(|o| o.resolution.member_id()).collect()
	}

	/// Raw references that matched nothing.
	pub fn skipped_refs(&self) -> Vec<String> {
		self
			.outcomes
			.iter()
			.filter(|o| o.resolution == Resolution::Unresolved)
			.map(|o| o.raw_ref.clone())
			.collect()
	}
}

/// The caller, resolved to a canonical member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
	pub member: Member,
	/// Administrator per the auth layer's role claim or the member record.
	pub is_admin: bool,
}

impl Actor {
	pub fn id(&self) -> MemberId {
		self.member.id
	}
}

#[derive(Clone)]
pub struct IdentityResolver {
	members: Arc<dyn MemberStore>,
	directory: Arc<dyn DirectoryUserStore>,
}

impl IdentityResolver {
	pub fn new(stores: &Stores) -> Self {
		Self {
			members: stores.members.clone(),
			directory: stores.directory.clone(),
		}
	}

	/// Find the principal a raw reference names, without writing anything.
	///
	/// Member ids win over directory user ids. Anything that is not a UUID,
	/// or names neither kind, is `None`.
	#[tracing::instrument(skip(self))]
	pub async fn lookup(&self, raw_ref: &str) -> Result<Option<Principal>> {
		let Ok(uuid) = Uuid::parse_str(raw_ref.trim()) else {
			return Ok(None);
		};

		if let Some(member) = self.members.get_member_by_id(&MemberId::new(uuid)).await? {
			return Ok(Some(Principal::Canonical(member)));
		}

		Ok(self
			.directory
			.get_directory_user_by_id(&DirectoryUserId::new(uuid))
			.await?
			.map(Principal::External))
	}

	/// Resolve one raw reference.
	///
	/// Returns `Unresolved` for anything that is neither a member nor a
	/// directory user. Only store failures are errors.
	#[tracing::instrument(skip(self))]
	pub async fn resolve(&self, raw_ref: &str) -> Result<Resolution> {
		match self.lookup(raw_ref).await? {
			Some(Principal::Canonical(member)) => Ok(Resolution::Resolved {
				member_id: member.id,
				promoted: false,
			}),
			Some(Principal::External(user)) => self.promote(&user).await,
			None => Ok(Resolution::Unresolved),
		}
	}

	/// Resolve every reference in order. Unresolvable entries are logged and
	/// skipped; the batch carries on.
	#[tracing::instrument(skip(self, raw_refs), fields(count = raw_refs.len()))]
	pub async fn resolve_batch(&self, raw_refs: &[String]) -> Result<BatchResolution> {
		let mut outcomes = Vec::with_capacity(raw_refs.len());
		for raw_ref in raw_refs {
			let resolution = self.resolve(raw_ref).await?;
			if resolution == Resolution::Unresolved {
				tracing::warn!(raw_ref = %raw_ref, "skipping unresolvable member reference");
			}
			outcomes.push(RefOutcome {
				raw_ref: raw_ref.clone(),
				resolution,
			});
		}
		Ok(BatchResolution { outcomes })
	}

	/// Resolve the authenticated caller.
	///
	/// The actor reference goes through [`Self::resolve`]; failing that, the
	/// caller's email claim is matched against existing members.
	#[tracing::instrument(skip(self, caller), fields(actor_ref = %caller.actor_ref))]
	pub async fn resolve_actor(&self, caller: &Caller) -> Result<Actor> {
		let member = match self.resolve(&caller.actor_ref).await? {
			Resolution::Resolved { member_id, .. } => self.members.get_member_by_id(&member_id).await?,
			Resolution::Unresolved if !caller.email.is_empty() => {
				self.members.get_member_by_email(&caller.email).await?
			}
			Resolution::Unresolved => None,
		};

		let member = member.ok_or_else(|| {
			tracing::warn!(actor_ref = %caller.actor_ref, "caller does not map to a member");
			MembershipError::ActorNotFound(caller.actor_ref.clone())
		})?;

		Ok(Actor {
			is_admin: caller.is_admin() || member.role.is_admin(),
			member,
		})
	}

	/// Return the member owning the directory user's email, creating it if
	/// none exists yet.
	async fn promote(&self, user: &DirectoryUser) -> Result<Resolution> {
		if let Some(existing) = self.members.get_member_by_email(&user.email).await? {
			tracing::debug!(
				directory_user_id = %user.id,
				member_id = %existing.id,
				"directory user already has a member"
			);
			return Ok(Resolution::Resolved {
				member_id: existing.id,
				promoted: false,
			});
		}

		let member = Member::promoted_from(user);
		match self.members.create_member(&member).await {
			Ok(()) => {
				tracing::info!(
					directory_user_id = %user.id,
					member_id = %member.id,
					"promoted directory user to member"
				);
				Ok(Resolution::Resolved {
					member_id: member.id,
					promoted: true,
				})
			}
			// Lost a race with a concurrent promotion of the same email.
			Err(DbError::Conflict(_)) => {
				let winner = self
					.members
					.get_member_by_email(&user.email)
					.await?
					.ok_or_else(|| {
						MembershipError::Conflict(format!(
							"member for directory user {} vanished after a conflicting insert",
							user.id
						))
					})?;
				tracing::debug!(
					directory_user_id = %user.id,
					member_id = %winner.id,
					"concurrent promotion won; reusing its member"
				);
				Ok(Resolution::Resolved {
					member_id: winner.id,
					promoted: false,
				})
			}
			Err(e) => Err(e.into()),
		}
	}
}
