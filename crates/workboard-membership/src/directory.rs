// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The member directory: canonical members and not-yet-promoted directory
//! users presented as one list, plus direct member management.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;
use workboard_core::{
	normalize_email, DirectoryUserId, Member, MemberId, MemberPatch, NewMember, Role,
	REGISTERED_USER_DESIGNATION,
};
use workboard_db::{DirectoryUserStore, GroupStore, MemberStore};

use crate::error::{MembershipError, Result};
use crate::group_write::write_group;
use crate::stores::Stores;

/// Phone shown for directory users that have none on record.
const UNKNOWN_PHONE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
	Member,
	User,
}

/// One row of the combined directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
	/// Member id for `source = member`, directory user id for `source = user`.
	pub id: Uuid,
	pub name: String,
	pub email: String,
	pub phone: String,
	pub designation: String,
	pub role: Role,
	pub source: EntrySource,
}

/// Result of [`MemberDirectory::update_member`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
	pub member: Member,
	/// True if the reference named a directory user that was promoted.
	pub promoted: bool,
	/// The directory user id the new member supersedes, if promoted.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub superseded_directory_id: Option<DirectoryUserId>,
}

#[derive(Clone)]
pub struct MemberDirectory {
	members: Arc<dyn MemberStore>,
	directory: Arc<dyn DirectoryUserStore>,
	groups: Arc<dyn GroupStore>,
}

impl MemberDirectory {
	pub fn new(stores: &Stores) -> Self {
		Self {
			members: stores.members.clone(),
			directory: stores.directory.clone(),
			groups: stores.groups.clone(),
		}
	}

	/// Every member, followed by every directory user whose email no member
	/// owns yet.
	#[tracing::instrument(skip(self))]
	pub async fn list_directory(&self) -> Result<Vec<DirectoryEntry>> {
		let members = self.members.list_members().await?;
		let users = self.directory.list_directory_users().await?;

		let owned: HashSet<String> = members.iter().map(|m| normalize_email(&m.email)).collect();
		let mut seen_user_emails = HashSet::new();

		let mut entries: Vec<DirectoryEntry> = members
			.into_iter()
			.map(|m| DirectoryEntry {
				id: m.id.into_inner(),
				name: m.name,
				email: m.email,
				phone: m.phone,
				designation: m.designation,
				role: m.role,
				source: EntrySource::Member,
			})
			.collect();

		for user in users {
			let email = normalize_email(&user.email);
			if owned.contains(&email) || !seen_user_emails.insert(email.clone()) {
				continue;
			}
			entries.push(DirectoryEntry {
				id: user.id.into_inner(),
				name: user.name,
				email,
				phone: user
					.phone
					.filter(|p| !p.trim().is_empty())
					.unwrap_or_else(|| UNKNOWN_PHONE.to_string()),
				designation: REGISTERED_USER_DESIGNATION.to_string(),
				role: Role::or_default(user.role.as_ref().map(Role::as_str)),
				source: EntrySource::User,
			});
		}

		Ok(entries)
	}

	/// Create a member directly.
	///
	/// # Errors
	/// `Conflict` if the email belongs to a member or a directory user.
	#[tracing::instrument(skip(self, input))]
	pub async fn create_member(&self, input: NewMember) -> Result<Member> {
		if input.name.trim().is_empty() {
			return Err(MembershipError::InvalidRequest("member name must not be empty".to_string()));
		}
		let email = normalize_email(&input.email);
		if email.is_empty() {
			return Err(MembershipError::InvalidRequest("member email must not be empty".to_string()));
		}

		if self.members.get_member_by_email(&email).await?.is_some()
			|| self.directory.get_directory_user_by_email(&email).await?.is_some()
		{
			return Err(MembershipError::Conflict(format!("email {email} is already in use")));
		}

		let member = Member::new(input);
		self.members.create_member(&member).await?;
		tracing::info!(member_id = %member.id, "member created");
		Ok(member)
	}

	/// Update a member, or promote a directory user with the given overrides.
	///
	/// A member id updates that member in place. A directory user id creates
	/// the member for that user, with `patch` taking precedence over the
	/// directory attributes.
	///
	/// # Errors
	/// - `NotFound` if the reference matches neither kind.
	/// - `Conflict` if the promoted email already has a member, or the new
	///   email of an existing member is taken.
	#[tracing::instrument(skip(self, patch))]
	pub async fn update_member(&self, raw_ref: &str, patch: MemberPatch) -> Result<MemberUpdate> {
		let uuid = Uuid::parse_str(raw_ref.trim())
			.map_err(|_| MembershipError::NotFound(format!("member {raw_ref}")))?;

		if let Some(mut member) = self.members.get_member_by_id(&MemberId::new(uuid)).await? {
			if let Some(name) = &patch.name {
				if name.trim().is_empty() {
					return Err(MembershipError::InvalidRequest(
						"member name must not be empty".to_string(),
					));
				}
			}
			if member.apply(patch) {
				self.members.update_member(&member).await?;
				tracing::info!(member_id = %member.id, "member updated");
			}
			return Ok(MemberUpdate {
				member,
				promoted: false,
				superseded_directory_id: None,
			});
		}

		let user = self
			.directory
			.get_directory_user_by_id(&DirectoryUserId::new(uuid))
			.await?
			.ok_or_else(|| MembershipError::NotFound(format!("member {raw_ref}")))?;

		if self.members.get_member_by_email(&user.email).await?.is_some() {
			return Err(MembershipError::Conflict(format!(
				"a member with email {} already exists",
				user.email
			)));
		}

		let member = Member::promoted_with(&user, &patch);
		self.members.create_member(&member).await?;
		tracing::info!(
			directory_user_id = %user.id,
			member_id = %member.id,
			"promoted directory user on update"
		);

		Ok(MemberUpdate {
			member,
			promoted: true,
			superseded_directory_id: Some(user.id),
		})
	}

	/// Delete a member and strip its id from every group and subgroup
	/// member list. Returns the number of groups rewritten.
	///
	/// Groups the member created keep `created_by` pointing at the removed id.
	///
	/// Groups are stripped before the member row goes, so a `Conflict` from
	/// a group that keeps losing its version race leaves the member in place
	/// and the call can be repeated.
	///
	/// # Errors
	/// `NotFound` if no member has the id.
	#[tracing::instrument(skip(self), fields(member_id = %member_id))]
	pub async fn delete_member(&self, member_id: &MemberId) -> Result<usize> {
		let not_found = || MembershipError::NotFound(format!("member {member_id}"));
		if self.members.get_member_by_id(member_id).await?.is_none() {
			return Err(not_found());
		}

		let mut rewritten = 0;
		for group in self.groups.list_groups().await? {
			if !group.lists_member(member_id) {
				continue;
			}
			match write_group(self.groups.as_ref(), &group.id, |g| {
				g.remove_member(member_id);
				Ok(())
			})
			.await
			{
				Ok(_) => rewritten += 1,
				Err(MembershipError::NotFound(_)) => {
					tracing::debug!(group_id = %group.id, "group deleted before member could be stripped");
				}
				Err(e) => return Err(e),
			}
		}

		if !self.members.delete_member(member_id).await? {
			return Err(not_found());
		}
		tracing::info!(member_id = %member_id, groups_rewritten = rewritten, "member deleted");
		Ok(rewritten)
	}
}
