// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use serde::Deserialize;
use workboard_core::{Caller, Group, GroupId, Subgroup, SubgroupId, SubgroupUpdate};
use workboard_db::{GroupStore, ProjectTaskStore};

use crate::error::{MembershipError, Result};
use crate::group_write::{load_group, write_group};
use crate::resolver::{Actor, IdentityResolver};
use crate::stores::Stores;
use crate::view::{GroupView, SubgroupView, ViewBuilder};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub member_refs: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubgroupRequest {
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub member_refs: Vec<String>,
}

/// Partial subgroup update. A supplied `member_refs` replaces the member list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubgroupRequest {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub member_refs: Option<Vec<String>>,
}

fn require_name(name: &str, what: &str) -> Result<String> {
	let name = name.trim();
	if name.is_empty() {
		return Err(MembershipError::InvalidRequest(format!("{what} name must not be empty")));
	}
	Ok(name.to_string())
}

/// Workgroup and workspace membership.
///
/// Every member reference that reaches storage has gone through the
/// [`IdentityResolver`] first.
#[derive(Clone)]
pub struct GroupMembershipService {
	resolver: IdentityResolver,
	views: ViewBuilder,
	groups: Arc<dyn GroupStore>,
	project_tasks: Arc<dyn ProjectTaskStore>,
}

impl GroupMembershipService {
	pub fn new(stores: &Stores) -> Self {
		Self {
			resolver: IdentityResolver::new(stores),
			views: ViewBuilder::new(stores),
			groups: stores.groups.clone(),
			project_tasks: stores.project_tasks.clone(),
		}
	}

	async fn load_group(&self, group_id: &GroupId) -> Result<Group> {
		load_group(self.groups.as_ref(), group_id).await
	}

	async fn write_group<F>(&self, group_id: &GroupId, apply: F) -> Result<Group>
	where
		F: FnMut(&mut Group) -> Result<()>,
	{
		write_group(self.groups.as_ref(), group_id, apply).await
	}

	fn forbid(actor: &Actor, action: &str, group_id: &GroupId) -> MembershipError {
		tracing::warn!(member_id = %actor.id(), group_id = %group_id, action, "forbidden");
		MembershipError::Forbidden(format!("{action} on group {group_id}"))
	}

	/// Create a group owned by the caller.
	///
	/// # Errors
	/// `ActorNotFound` if the caller does not map to a member.
	#[tracing::instrument(skip(self, request, caller), fields(actor_ref = %caller.actor_ref))]
	pub async fn create_group(&self, request: CreateGroupRequest, caller: &Caller) -> Result<GroupView> {
		let name = require_name(&request.name, "group")?;
		let actor = self.resolver.resolve_actor(caller).await?;
		let batch = self.resolver.resolve_batch(&request.member_refs).await?;

		let group = Group::new(name, request.description, batch.member_ids(), actor.id());
		self.groups.create_group(&group).await?;
		tracing::info!(
			group_id = %group.id,
			created_by = %actor.id(),
			members = group.members.len(),
			"group created"
		);

		Ok(self
			.views
			.group_view(&group, &actor)
			.await?
			.with_skipped_refs(batch.skipped_refs()))
	}

	/// Replace a group's member list. Administrators only.
	#[tracing::instrument(skip(self, member_refs, caller), fields(group_id = %group_id))]
	pub async fn set_members(
		&self,
		group_id: &GroupId,
		member_refs: &[String],
		caller: &Caller,
	) -> Result<GroupView> {
		self.load_group(group_id).await?;
		let actor = self.resolver.resolve_actor(caller).await?;
		if !actor.is_admin {
			return Err(Self::forbid(&actor, "set members", group_id));
		}

		let batch = self.resolver.resolve_batch(member_refs).await?;
		let members = batch.member_ids();
		let group = self
			.write_group(group_id, |group| {
				group.replace_members(members.clone());
				Ok(())
			})
			.await?;
		tracing::info!(group_id = %group_id, members = group.members.len(), "group members replaced");

		Ok(self
			.views
			.group_view(&group, &actor)
			.await?
			.with_skipped_refs(batch.skipped_refs()))
	}

	/// Add a subgroup. Open to the group's creator and members.
	#[tracing::instrument(skip(self, request, caller), fields(group_id = %group_id))]
	pub async fn create_subgroup(
		&self,
		group_id: &GroupId,
		request: CreateSubgroupRequest,
		caller: &Caller,
	) -> Result<SubgroupView> {
		let name = require_name(&request.name, "subgroup")?;
		let group = self.load_group(group_id).await?;
		let actor = self.resolver.resolve_actor(caller).await?;
		if !group.is_participant(&actor.id()) {
			return Err(Self::forbid(&actor, "create subgroup", group_id));
		}

		let batch = self.resolver.resolve_batch(&request.member_refs).await?;
		let subgroup = Subgroup::new(name, request.description, batch.member_ids(), actor.id());
		let actor_id = actor.id();
		let group = self
			.write_group(group_id, |group| {
				if !group.is_participant(&actor_id) {
					return Err(MembershipError::Forbidden(format!(
						"create subgroup on group {}",
						group.id
					)));
				}
				group.push_subgroup(subgroup.clone());
				Ok(())
			})
			.await?;
		tracing::info!(group_id = %group_id, subgroup_id = %subgroup.id, "subgroup created");

		let mut view = self.views.subgroup_view(&group, &subgroup, &actor).await?;
		view.skipped_refs = batch.skipped_refs();
		Ok(view)
	}

	/// Partially update a subgroup. Administrators only.
	#[tracing::instrument(skip(self, request, caller), fields(group_id = %group_id, subgroup_id = %subgroup_id))]
	pub async fn update_subgroup(
		&self,
		group_id: &GroupId,
		subgroup_id: &SubgroupId,
		request: UpdateSubgroupRequest,
		caller: &Caller,
	) -> Result<SubgroupView> {
		let name = request
			.name
			.as_deref()
			.map(|n| require_name(n, "subgroup"))
			.transpose()?;
		let group = self.load_group(group_id).await?;
		if group.subgroup(subgroup_id).is_none() {
			return Err(MembershipError::NotFound(format!("subgroup {subgroup_id}")));
		}
		let actor = self.resolver.resolve_actor(caller).await?;
		if !actor.is_admin {
			return Err(Self::forbid(&actor, "update subgroup", group_id));
		}

		let (members, skipped_refs) = match &request.member_refs {
			Some(refs) => {
				let batch = self.resolver.resolve_batch(refs).await?;
				(Some(batch.member_ids()), batch.skipped_refs())
			}
			None => (None, Vec::new()),
		};
		let update = SubgroupUpdate {
			name,
			description: request.description,
			members,
		};

		let group = self
			.write_group(group_id, |group| {
				let subgroup = group
					.subgroup_mut(subgroup_id)
					.ok_or_else(|| MembershipError::NotFound(format!("subgroup {subgroup_id}")))?;
				subgroup.apply(update.clone());
				group.touch();
				Ok(())
			})
			.await?;
		tracing::info!(group_id = %group_id, subgroup_id = %subgroup_id, "subgroup updated");

		let subgroup = group
			.subgroup(subgroup_id)
			.ok_or_else(|| MembershipError::NotFound(format!("subgroup {subgroup_id}")))?;
		let mut view = self.views.subgroup_view(&group, subgroup, &actor).await?;
		view.skipped_refs = skipped_refs;
		Ok(view)
	}

	/// Remove a subgroup and its project tasks. Administrators only.
	#[tracing::instrument(skip(self, caller), fields(group_id = %group_id, subgroup_id = %subgroup_id))]
	pub async fn delete_subgroup(
		&self,
		group_id: &GroupId,
		subgroup_id: &SubgroupId,
		caller: &Caller,
	) -> Result<GroupView> {
		let group = self.load_group(group_id).await?;
		if group.subgroup(subgroup_id).is_none() {
			return Err(MembershipError::NotFound(format!("subgroup {subgroup_id}")));
		}
		let actor = self.resolver.resolve_actor(caller).await?;
		if !actor.is_admin {
			return Err(Self::forbid(&actor, "delete subgroup", group_id));
		}

		let group = self
			.write_group(group_id, |group| {
				group
					.remove_subgroup(subgroup_id)
					.map(|_| ())
					.ok_or_else(|| MembershipError::NotFound(format!("subgroup {subgroup_id}")))
			})
			.await?;
		let removed_tasks = self
			.project_tasks
			.delete_project_tasks_for_subgroup(subgroup_id)
			.await?;
		tracing::info!(group_id = %group_id, subgroup_id = %subgroup_id, removed_tasks, "subgroup deleted");

		self.views.group_view(&group, &actor).await
	}

	/// Groups the caller created or belongs to.
	#[tracing::instrument(skip(self, caller), fields(actor_ref = %caller.actor_ref))]
	pub async fn list_groups(&self, caller: &Caller) -> Result<Vec<GroupView>> {
		let actor = self.resolver.resolve_actor(caller).await?;
		let groups = self.groups.list_groups_for_member(&actor.id()).await?;

		let mut views = Vec::with_capacity(groups.len());
		for group in &groups {
			views.push(self.views.group_view(group, &actor).await?);
		}
		Ok(views)
	}

	/// One group, for its creator, its members, or an administrator.
	#[tracing::instrument(skip(self, caller), fields(group_id = %group_id))]
	pub async fn get_group(&self, group_id: &GroupId, caller: &Caller) -> Result<GroupView> {
		let group = self.load_group(group_id).await?;
		let actor = self.resolver.resolve_actor(caller).await?;
		if !(actor.is_admin || group.is_participant(&actor.id())) {
			return Err(Self::forbid(&actor, "read", group_id));
		}
		self.views.group_view(&group, &actor).await
	}

	/// Delete a group with its subgroups and project tasks. Creator or
	/// administrator only.
	#[tracing::instrument(skip(self, caller), fields(group_id = %group_id))]
	pub async fn delete_group(&self, group_id: &GroupId, caller: &Caller) -> Result<()> {
		let group = self.load_group(group_id).await?;
		let actor = self.resolver.resolve_actor(caller).await?;
		if !(actor.is_admin || group.is_creator(&actor.id())) {
			return Err(Self::forbid(&actor, "delete", group_id));
		}

		if !self.groups.delete_group(group_id).await? {
			return Err(MembershipError::NotFound(format!("group {group_id}")));
		}
		tracing::info!(group_id = %group_id, deleted_by = %actor.id(), "group deleted");
		Ok(())
	}

	/// Subgroups of a group visible to the caller.
	#[tracing::instrument(skip(self, caller), fields(group_id = %group_id))]
	pub async fn list_subgroups(&self, group_id: &GroupId, caller: &Caller) -> Result<Vec<SubgroupView>> {
		let group = self.load_group(group_id).await?;
		let actor = self.resolver.resolve_actor(caller).await?;
		if !(actor.is_admin || group.is_participant(&actor.id())) {
			return Err(Self::forbid(&actor, "list subgroups", group_id));
		}
		self.views.subgroup_views(&group, &actor).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::group_write::MAX_WRITE_ATTEMPTS;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use workboard_core::{Member, MemberId, NewMember, Role};
	use workboard_db::testing::create_test_pool;
	use workboard_db::{DbError, GroupRepository, MemberRepository};

	/// Fails the first `failures` updates with a version conflict.
	struct FlakyGroups {
		inner: GroupRepository,
		failures: AtomicUsize,
	}

	#[async_trait]
	impl GroupStore for FlakyGroups {
		async fn create_group(&self, group: &Group) -> std::result::Result<(), DbError> {
			self.inner.create_group(group).await
		}

		async fn get_group_by_id(&self, id: &GroupId) -> std::result::Result<Option<Group>, DbError> {
			self.inner.get_group_by_id(id).await
		}

		async fn update_group(&self, group: &Group) -> std::result::Result<i64, DbError> {
			let remaining = self.failures.load(Ordering::SeqCst);
			if remaining > 0 {
				self.failures.store(remaining - 1, Ordering::SeqCst);
				return Err(DbError::Conflict("stale".to_string()));
			}
			self.inner.update_group(group).await
		}

		async fn delete_group(&self, id: &GroupId) -> std::result::Result<bool, DbError> {
			self.inner.delete_group(id).await
		}

		async fn list_groups_for_member(
			&self,
			member_id: &MemberId,
		) -> std::result::Result<Vec<Group>, DbError> {
			self.inner.list_groups_for_member(member_id).await
		}

		async fn list_groups(&self) -> std::result::Result<Vec<Group>, DbError> {
			self.inner.list_groups().await
		}
	}

	async fn setup(failures: usize) -> (GroupMembershipService, Caller, Member) {
		let pool = create_test_pool().await;
		let mut stores = Stores::sqlite(pool.clone());
		stores.groups = Arc::new(FlakyGroups {
			inner: GroupRepository::new(pool.clone()),
			failures: AtomicUsize::new(failures),
		});

		let admin = Member::new(NewMember {
			name: "Root".to_string(),
			email: "root@example.com".to_string(),
			role: Some(Role::admin()),
			..Default::default()
		});
		MemberRepository::new(pool).create_member(&admin).await.unwrap();
		let caller = Caller::new(admin.id.to_string(), &admin.email, Role::admin());
		(GroupMembershipService::new(&stores), caller, admin)
	}

	#[tokio::test]
	async fn retries_stale_group_writes() {
		let (service, caller, admin) = setup(MAX_WRITE_ATTEMPTS - 1).await;
		let group = service
			.create_group(
				CreateGroupRequest {
					name: "Ops".to_string(),
					..Default::default()
				},
				&caller,
			)
			.await
			.unwrap();

		let view = service
			.set_members(&group.id, &[admin.id.to_string()], &caller)
			.await
			.unwrap();
		assert_eq!(view.members.len(), 1);
		assert_eq!(view.version, 1);
	}

	#[tokio::test]
	async fn gives_up_after_repeated_conflicts() {
		let (service, caller, admin) = setup(MAX_WRITE_ATTEMPTS).await;
		let group = service
			.create_group(
				CreateGroupRequest {
					name: "Ops".to_string(),
					..Default::default()
				},
				&caller,
			)
			.await
			.unwrap();

		let err = service
			.set_members(&group.id, &[admin.id.to_string()], &caller)
			.await
			.unwrap_err();
		assert_eq!(err.kind(), crate::error::ErrorKind::Conflict);
	}

	#[tokio::test]
	async fn rejects_blank_names() {
		let (service, caller, _) = setup(0).await;
		let err = service
			.create_group(
				CreateGroupRequest {
					name: "   ".to_string(),
					..Default::default()
				},
				&caller,
			)
			.await
			.unwrap_err();
		assert!(matches!(err, MembershipError::InvalidRequest(_)));
	}
}
