// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Response shapes for groups, annotated relative to the requester.
//!
//! Member ids are expanded with a single batched fetch per group. Ids whose
//! member has since been deleted are left out of the expanded lists.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use workboard_core::{Group, GroupId, Member, MemberId, Role, Subgroup, SubgroupId};
use workboard_db::MemberStore;

use crate::error::Result;
use crate::resolver::Actor;
use crate::stores::Stores;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEntry {
	pub member_id: MemberId,
	pub name: String,
	pub email: String,
	pub phone: String,
	pub designation: String,
	pub role: Role,
	pub is_current: bool,
}

impl MemberEntry {
	fn new(member: &Member, viewer: &MemberId) -> Self {
		Self {
			member_id: member.id,
			name: member.name.clone(),
			email: member.email.clone(),
			phone: member.phone.clone(),
			designation: member.designation.clone(),
			role: member.role.clone(),
			is_current: member.id == *viewer,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgroupView {
	pub id: SubgroupId,
	pub name: String,
	pub description: Option<String>,
	pub members: Vec<MemberEntry>,
	pub created_by: MemberId,
	pub creator: Option<MemberEntry>,
	pub created_at: DateTime<Utc>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub skipped_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
	pub id: GroupId,
	pub name: String,
	pub description: Option<String>,
	pub members: Vec<MemberEntry>,
	pub created_by: MemberId,
	pub creator: Option<MemberEntry>,
	/// Only the subgroups the requester may see.
	pub subgroups: Vec<SubgroupView>,
	pub is_creator: bool,
	/// Admin rights of the requester: true when either the caller's asserted
	/// role or the resolved member's stored role is admin.
	pub is_admin: bool,
	pub version: i64,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	/// Raw references dropped while resolving the request that produced this view.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub skipped_refs: Vec<String>,
}

impl GroupView {
	pub fn with_skipped_refs(mut self, skipped_refs: Vec<String>) -> Self {
		self.skipped_refs = skipped_refs;
		self
	}
}

/// Members of one group, keyed by id.
struct MemberIndex<'a> {
	members: HashMap<MemberId, Member>,
	viewer: &'a MemberId,
}

impl MemberIndex<'_> {
	fn entry(&self, id: &MemberId) -> Option<MemberEntry> {
		self.members.get(id).map(|m| MemberEntry::new(m, self.viewer))
	}

	fn entries(&self, ids: &[MemberId]) -> Vec<MemberEntry> {
		ids.iter().filter_map(|id| self.entry(id)).collect()
	}

	fn subgroup(&self, subgroup: &Subgroup) -> SubgroupView {
		SubgroupView {
			id: subgroup.id,
			name: subgroup.name.clone(),
			description: subgroup.description.clone(),
			members: self.entries(&subgroup.members),
			created_by: subgroup.created_by,
			creator: self.entry(&subgroup.created_by),
			created_at: subgroup.created_at,
			skipped_refs: Vec::new(),
		}
	}
}

#[derive(Clone)]
pub struct ViewBuilder {
	members: Arc<dyn MemberStore>,
}

impl ViewBuilder {
	pub fn new(stores: &Stores) -> Self {
		Self {
			members: stores.members.clone(),
		}
	}

	async fn index<'a>(&self, group: &Group, viewer: &'a MemberId) -> Result<MemberIndex<'a>> {
		let ids = group.referenced_member_ids();
		let members = self
			.members
			.get_members_by_ids(&ids)
			.await?
			.into_iter()
			.map(|m| (m.id, m))
			.collect::<HashMap<_, _>>();

		if members.len() < ids.len() {
			tracing::debug!(
				group_id = %group.id,
				missing = ids.len() - members.len(),
				"group references deleted members"
			);
		}
		Ok(MemberIndex { members, viewer })
	}

	/// Expand a group for `viewer`, applying subgroup visibility.
	#[tracing::instrument(skip(self, group, viewer), fields(group_id = %group.id, viewer = %viewer.id()))]
	pub async fn group_view(&self, group: &Group, viewer: &Actor) -> Result<GroupView> {
		let viewer_id = viewer.id();
		let index = self.index(group, &viewer_id).await?;

		Ok(GroupView {
			id: group.id,
			name: group.name.clone(),
			description: group.description.clone(),
			members: index.entries(&group.members),
			created_by: group.created_by,
			creator: index.entry(&group.created_by),
			subgroups: group
				.visible_subgroups(&viewer_id)
				.into_iter()
				.map(|s| index.subgroup(s))
				.collect(),
			is_creator: group.is_creator(&viewer_id),
			is_admin: viewer.is_admin,
			version: group.version,
			created_at: group.created_at,
			updated_at: group.updated_at,
			skipped_refs: Vec::new(),
		})
	}

	/// Expand the subgroups of `group` that `viewer` may see.
	#[tracing::instrument(skip(self, group, viewer), fields(group_id = %group.id, viewer = %viewer.id()))]
	pub async fn subgroup_views(&self, group: &Group, viewer: &Actor) -> Result<Vec<SubgroupView>> {
		let viewer_id = viewer.id();
		let index = self.index(group, &viewer_id).await?;
		Ok(group
			.visible_subgroups(&viewer_id)
			.into_iter()
			.map(|s| index.subgroup(s))
			.collect())
	}

	/// Expand a single subgroup regardless of visibility. Used to echo back
	/// the result of a write the viewer was allowed to make.
	pub async fn subgroup_view(
		&self,
		group: &Group,
		subgroup: &Subgroup,
		viewer: &Actor,
	) -> Result<SubgroupView> {
		let viewer_id = viewer.id();
		let index = self.index(group, &viewer_id).await?;
		Ok(index.subgroup(subgroup))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use workboard_core::NewMember;
	use workboard_db::testing::create_test_pool;
	use workboard_db::MemberRepository;

	async fn seed(repo: &MemberRepository, name: &str) -> Member {
		let member = Member::new(NewMember {
			name: name.to_string(),
			email: format!("{}@example.com", name.to_lowercase()),
			..Default::default()
		});
		repo.create_member(&member).await.unwrap();
		member
	}

	fn actor(member: &Member, is_admin: bool) -> Actor {
		Actor {
			member: member.clone(),
			is_admin,
		}
	}

	#[tokio::test]
	async fn annotates_entries_relative_to_viewer() {
		let pool = create_test_pool().await;
		let repo = MemberRepository::new(pool.clone());
		let views = ViewBuilder::new(&Stores::sqlite(pool));

		let owner = seed(&repo, "Owner").await;
		let ada = seed(&repo, "Ada").await;
		let group = Group::new("Ops", None, vec![ada.id, owner.id], owner.id);

		let as_ada = views.group_view(&group, &actor(&ada, false)).await.unwrap();
		assert!(!as_ada.is_creator);
		assert!(!as_ada.is_admin);
		let current: Vec<_> = as_ada.members.iter().map(|e| e.is_current).collect();
		assert_eq!(current, vec![true, false]);
		assert_eq!(as_ada.creator.as_ref().unwrap().name, "Owner");

		let as_owner = views.group_view(&group, &actor(&owner, true)).await.unwrap();
		assert!(as_owner.is_creator);
		assert!(as_owner.is_admin);
	}

	#[tokio::test]
	async fn is_admin_takes_stored_member_role_when_caller_role_is_plain() {
		let pool = create_test_pool().await;
		let repo = MemberRepository::new(pool.clone());
		let stores = Stores::sqlite(pool);
		let views = ViewBuilder::new(&stores);

		let root = Member::new(NewMember {
			name: "Root".to_string(),
			email: "root@example.com".to_string(),
			role: Some(Role::admin()),
			..Default::default()
		});
		repo.create_member(&root).await.unwrap();
		let caller = workboard_core::Caller::new(
			root.id.to_string(),
			&root.email,
			Role::member(),
		);
		let actor = crate::resolver::IdentityResolver::new(&stores)
			.resolve_actor(&caller)
			.await
			.unwrap();
		let group = Group::new("Ops", None, vec![], MemberId::generate());

		let view = views.group_view(&group, &actor).await.unwrap();
		assert!(view.is_admin);
		assert!(!view.is_creator);
	}

	#[tokio::test]
	async fn applies_subgroup_visibility() {
		let pool = create_test_pool().await;
		let repo = MemberRepository::new(pool.clone());
		let views = ViewBuilder::new(&Stores::sqlite(pool));

		let owner = seed(&repo, "Owner").await;
		let ada = seed(&repo, "Ada").await;
		let mut group = Group::new("Ops", None, vec![ada.id], owner.id);
		group.push_subgroup(Subgroup::new("With Ada", None, vec![ada.id], owner.id));
		group.push_subgroup(Subgroup::new("Without Ada", None, vec![], owner.id));

		let as_ada = views.subgroup_views(&group, &actor(&ada, false)).await.unwrap();
		assert_eq!(as_ada.len(), 1);
		assert_eq!(as_ada[0].name, "With Ada");

		let as_owner = views.group_view(&group, &actor(&owner, false)).await.unwrap();
		assert_eq!(as_owner.subgroups.len(), 2);
	}

	#[tokio::test]
	async fn deleted_members_drop_out_of_view() {
		let pool = create_test_pool().await;
		let repo = MemberRepository::new(pool.clone());
		let views = ViewBuilder::new(&Stores::sqlite(pool));

		let owner = seed(&repo, "Owner").await;
		let gone = seed(&repo, "Gone").await;
		let group = Group::new("Ops", None, vec![gone.id], owner.id);
		repo.delete_member(&gone.id).await.unwrap();

		let view = views.group_view(&group, &actor(&owner, false)).await.unwrap();
		assert!(view.members.is_empty());
	}

	#[test]
	fn member_entry_serializes_camel_case() {
		let member = Member::new(NewMember {
			name: "Ada".to_string(),
			email: "ada@example.com".to_string(),
			..Default::default()
		});
		let entry = MemberEntry::new(&member, &member.id);
		let json = serde_json::to_value(&entry).unwrap();
		assert_eq!(json["isCurrent"], true);
		assert_eq!(json["memberId"], member.id.to_string());
		assert!(json.get("email").is_some());
	}
}
