// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workgroups and their embedded workspaces.
//!
//! This module provides:
//! - [`Group`] - a named, ordered set of canonical members owning its subgroups
//! - [`Subgroup`] - a workspace embedded in exactly one group
//! - [`SubgroupUpdate`] - partial update for a subgroup

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{GroupId, MemberId, SubgroupId};

/// Removes repeated ids, keeping the first occurrence of each.
pub fn dedup_members(members: impl IntoIterator<Item = MemberId>) -> Vec<MemberId> {
	let mut seen = HashSet::new();
	members.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// A workgroup.
///
/// `version` is bumped by the store on every successful write and is used
/// for compare-and-swap updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
	pub id: GroupId,
	pub name: String,
	pub description: Option<String>,
	pub members: Vec<MemberId>,
	pub created_by: MemberId,
	pub subgroups: Vec<Subgroup>,
	pub version: i64,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Group {
	pub fn new(
		name: impl Into<String>,
		description: Option<String>,
		members: Vec<MemberId>,
		created_by: MemberId,
	) -> Self {
		let now = Utc::now();
		Self {
			id: GroupId::generate(),
			name: name.into(),
			description,
			members: dedup_members(members),
			created_by,
			subgroups: Vec::new(),
			version: 0,
			created_at: now,
			updated_at: now,
		}
	}

	pub fn is_creator(&self, member_id: &MemberId) -> bool {
		self.created_by == *member_id
	}

	pub fn has_member(&self, member_id: &MemberId) -> bool {
		self.members.contains(member_id)
	}

	/// Creator or listed member.
	pub fn is_participant(&self, member_id: &MemberId) -> bool {
		self.is_creator(member_id) || self.has_member(member_id)
	}

	/// Replaces the member list wholesale.
	pub fn replace_members(&mut self, members: Vec<MemberId>) {
		self.members = dedup_members(members);
		self.touch();
	}

	pub fn subgroup(&self, id: &SubgroupId) -> Option<&Subgroup> {
		self.subgroups.iter().find(|s| s.id == *id)
	}

	pub fn subgroup_mut(&mut self, id: &SubgroupId) -> Option<&mut Subgroup> {
		self.subgroups.iter_mut().find(|s| s.id == *id)
	}

	pub fn push_subgroup(&mut self, subgroup: Subgroup) {
		self.subgroups.push(subgroup);
		self.touch();
	}

	pub fn remove_subgroup(&mut self, id: &SubgroupId) -> Option<Subgroup> {
		let index = self.subgroups.iter().position(|s| s.id == *id)?;
		self.touch();
		Some(self.subgroups.remove(index))
	}

	/// Whether the id appears in the group's or any subgroup's member list.
	pub fn lists_member(&self, member_id: &MemberId) -> bool {
		self.has_member(member_id) || self.subgroups.iter().any(|s| s.has_member(member_id))
	}

	/// Strips the id from the group's and every subgroup's member list.
	/// Returns whether anything changed. `created_by` fields are left as-is.
	pub fn remove_member(&mut self, member_id: &MemberId) -> bool {
		if !self.lists_member(member_id) {
			return false;
		}
		self.members.retain(|id| id != member_id);
		for subgroup in &mut self.subgroups {
			subgroup.members.retain(|id| id != member_id);
		}
		self.touch();
		true
	}

	/// Subgroups the given member may see.
	///
	/// The creator sees every subgroup; anyone else only those listing them.
	pub fn visible_subgroups(&self, viewer: &MemberId) -> Vec<&Subgroup> {
		if self.is_creator(viewer) {
			return self.subgroups.iter().collect();
		}
		self.subgroups.iter().filter(|s| s.has_member(viewer)).collect()
	}

	/// Every member id referenced anywhere in the group, each once.
	pub fn referenced_member_ids(&self) -> Vec<MemberId> {
		let subgroup_ids = self
			.subgroups
			.iter()
			.flat_map(|s| s.members.iter().copied().chain(std::iter::once(s.created_by)));
		dedup_members(
			std::iter::once(self.created_by)
				.chain(self.members.iter().copied())
				.chain(subgroup_ids),
		)
	}

	pub fn touch(&mut self) {
		self.updated_at = Utc::now();
	}
}

/// A workspace embedded in a group.
///
/// Its members are not required to be members of the parent group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subgroup {
	pub id: SubgroupId,
	pub name: String,
	pub description: Option<String>,
	pub members: Vec<MemberId>,
	pub created_by: MemberId,
	pub created_at: DateTime<Utc>,
}

impl Subgroup {
	pub fn new(
		name: impl Into<String>,
		description: Option<String>,
		members: Vec<MemberId>,
		created_by: MemberId,
	) -> Self {
		Self {
			id: SubgroupId::generate(),
			name: name.into(),
			description,
			members: dedup_members(members),
			created_by,
			created_at: Utc::now(),
		}
	}

	pub fn has_member(&self, member_id: &MemberId) -> bool {
		self.members.contains(member_id)
	}

	/// Applies a partial update; a supplied member list replaces the old one.
	pub fn apply(&mut self, update: SubgroupUpdate) {
		if let Some(name) = update.name {
			self.name = name;
		}
		if let Some(description) = update.description {
			self.description = Some(description);
		}
		if let Some(members) = update.members {
			self.members = dedup_members(members);
		}
	}
}

/// Partial subgroup update with members already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubgroupUpdate {
	pub name: Option<String>,
	pub description: Option<String>,
	pub members: Option<Vec<MemberId>>,
}
