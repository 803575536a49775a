// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use workboard_core::{
	Caller, Group, GroupId, NewProjectTask, ProjectCode, ProjectTask, ProjectTaskId,
	ProjectTaskPatch, SubgroupId,
};
use workboard_db::{DbError, GroupStore, ProjectTaskStore};

use crate::error::{MembershipError, Result};
use crate::resolver::{Actor, IdentityResolver};
use crate::stores::Stores;

/// Attempts at claiming the next project code before giving up.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Project tasks inside a subgroup.
///
/// Access follows subgroup visibility: only callers who can see the subgroup
/// may create, list, edit or delete its tasks.
#[derive(Clone)]
pub struct ProjectTaskService {
	resolver: IdentityResolver,
	groups: Arc<dyn GroupStore>,
	project_tasks: Arc<dyn ProjectTaskStore>,
}

impl ProjectTaskService {
	pub fn new(stores: &Stores) -> Self {
		Self {
			resolver: IdentityResolver::new(stores),
			groups: stores.groups.clone(),
			project_tasks: stores.project_tasks.clone(),
		}
	}

	/// Load the group, check the subgroup exists and the caller can see it.
	async fn authorize(
		&self,
		group_id: &GroupId,
		subgroup_id: &SubgroupId,
		caller: &Caller,
	) -> Result<(Group, Actor)> {
		let group = self
			.groups
			.get_group_by_id(group_id)
			.await?
			.ok_or_else(|| MembershipError::NotFound(format!("group {group_id}")))?;
		if group.subgroup(subgroup_id).is_none() {
			return Err(MembershipError::NotFound(format!("subgroup {subgroup_id}")));
		}

		let actor = self.resolver.resolve_actor(caller).await?;
		let visible = group
			.visible_subgroups(&actor.id())
			.iter()
			.any(|s| s.id == *subgroup_id);
		if !visible {
			tracing::warn!(member_id = %actor.id(), subgroup_id = %subgroup_id, "subgroup not visible to caller");
			return Err(MembershipError::Forbidden(format!("subgroup {subgroup_id}")));
		}
		Ok((group, actor))
	}

	async fn load_task(&self, task_id: &ProjectTaskId) -> Result<ProjectTask> {
		self
			.project_tasks
			.get_project_task_by_id(task_id)
			.await?
			.ok_or_else(|| MembershipError::NotFound(format!("project task {task_id}")))
	}

	/// Create a task with the next free `PRJ-` code.
	#[tracing::instrument(skip(self, input, caller), fields(group_id = %group_id, subgroup_id = %subgroup_id))]
	pub async fn create_task(
		&self,
		group_id: &GroupId,
		subgroup_id: &SubgroupId,
		input: NewProjectTask,
		caller: &Caller,
	) -> Result<ProjectTask> {
		if input.task_name.trim().is_empty() {
			return Err(MembershipError::InvalidRequest("task name must not be empty".to_string()));
		}
		let (group, actor) = self.authorize(group_id, subgroup_id, caller).await?;

		let mut attempt = 0;
		loop {
			attempt += 1;
			let latest = self.project_tasks.latest_project_code().await?;
			let task = ProjectTask::new(
				ProjectCode::next_after(latest),
				group.id,
				*subgroup_id,
				actor.id(),
				input.clone(),
			);
			match self.project_tasks.create_project_task(&task).await {
				Ok(()) => {
					tracing::info!(task_id = %task.id, code = %task.code, "project task created");
					return Ok(task);
				}
				Err(DbError::Conflict(msg)) if attempt < MAX_CODE_ATTEMPTS => {
					tracing::debug!(attempt, error = %msg, "project code taken, retrying");
				}
				Err(e) => return Err(e.into()),
			}
		}
	}

	/// Tasks of a subgroup, newest first.
	#[tracing::instrument(skip(self, caller), fields(group_id = %group_id, subgroup_id = %subgroup_id))]
	pub async fn list_tasks(
		&self,
		group_id: &GroupId,
		subgroup_id: &SubgroupId,
		status: Option<&str>,
		caller: &Caller,
	) -> Result<Vec<ProjectTask>> {
		self.authorize(group_id, subgroup_id, caller).await?;
		Ok(self
			.project_tasks
			.list_project_tasks(subgroup_id, status)
			.await?)
	}

	#[tracing::instrument(skip(self, patch, caller), fields(task_id = %task_id))]
	pub async fn update_task(
		&self,
		task_id: &ProjectTaskId,
		patch: ProjectTaskPatch,
		caller: &Caller,
	) -> Result<ProjectTask> {
		if matches!(&patch.task_name, Some(name) if name.trim().is_empty()) {
			return Err(MembershipError::InvalidRequest("task name must not be empty".to_string()));
		}
		let mut task = self.load_task(task_id).await?;
		self.authorize(&task.group_id, &task.subgroup_id, caller).await?;

		task.apply(patch);
		self.project_tasks.update_project_task(&task).await?;
		tracing::info!(task_id = %task.id, code = %task.code, "project task updated");
		Ok(task)
	}

	#[tracing::instrument(skip(self, caller), fields(task_id = %task_id))]
	pub async fn delete_task(&self, task_id: &ProjectTaskId, caller: &Caller) -> Result<()> {
		let task = self.load_task(task_id).await?;
		self.authorize(&task.group_id, &task.subgroup_id, caller).await?;

		if !self.project_tasks.delete_project_task(task_id).await? {
			return Err(MembershipError::NotFound(format!("project task {task_id}")));
		}
		tracing::info!(task_id = %task_id, code = %task.code, "project task deleted");
		Ok(())
	}
}
