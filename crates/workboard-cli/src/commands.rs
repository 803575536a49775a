// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand dispatch onto the membership services.

use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use workboard_core::{
	MemberPatch, NewMember, NewProjectTask, NewTask, ProjectTaskPatch, Role, TaskPatch,
};
use workboard_membership::{
	CreateGroupRequest, CreateSubgroupRequest, DashboardService, GroupMembershipService,
	IdentityResolver, MemberDirectory, ProjectTaskService, Stores, TaskService,
	UpdateSubgroupRequest,
};

use crate::cli::{
	ActorArgs, Command, GroupsCommand, MemberFields, MembersCommand, PersonalTaskFields,
	PersonalTasksCommand, SubgroupsCommand, TaskFields, TasksCommand,
};

/// Services wired over one set of stores.
pub struct App {
	resolver: IdentityResolver,
	groups: GroupMembershipService,
	directory: MemberDirectory,
	tasks: ProjectTaskService,
	personal_tasks: TaskService,
	dashboard: DashboardService,
}

impl App {
	pub fn new(stores: &Stores) -> Self {
		Self {
			resolver: IdentityResolver::new(stores),
			groups: GroupMembershipService::new(stores),
			directory: MemberDirectory::new(stores),
			tasks: ProjectTaskService::new(stores),
			personal_tasks: TaskService::new(stores),
			dashboard: DashboardService::new(stores),
		}
	}

	/// Runs a data command and returns its JSON result.
	pub async fn execute(
		&self,
		command: Command,
		actor: &ActorArgs,
	) -> anyhow::Result<serde_json::Value> {
		match command {
			Command::Migrate | Command::Version => {
				anyhow::bail!("{command:?} is handled before the services start")
			}
			Command::Members(cmd) => self.members(cmd).await,
			Command::Resolve { refs } => {
				let batch = self
					.resolver
					.resolve_batch(&refs)
					.await
					.context("failed to resolve references")?;
				to_json(&batch)
			}
			Command::Groups(cmd) => self.groups(cmd, actor).await,
			Command::Subgroups(cmd) => self.subgroups(cmd, actor).await,
			Command::Tasks(cmd) => self.tasks(cmd, actor).await,
			Command::PersonalTasks(cmd) => self.personal_tasks(cmd, actor).await,
			Command::Dashboard => to_json(
				&self
					.dashboard
					.stats()
					.await
					.context("failed to compute dashboard stats")?,
			),
		}
	}

	async fn members(&self, command: MembersCommand) -> anyhow::Result<serde_json::Value> {
		match command {
			MembersCommand::List => to_json(&self.directory.list_directory().await?),
			MembersCommand::Create {
				name,
				email,
				phone,
				designation,
				role,
			} => {
				let member = self
					.directory
					.create_member(NewMember {
						name,
						email,
						phone,
						designation,
						role: role.map(Role::new),
					})
					.await
					.context("failed to create member")?;
				to_json(&member)
			}
			MembersCommand::Update { reference, fields } => {
				let update = self
					.directory
					.update_member(&reference, member_patch(fields))
					.await
					.with_context(|| format!("failed to update member {reference}"))?;
				to_json(&update)
			}
			MembersCommand::Delete { member_id } => {
				let groups_updated = self
					.directory
					.delete_member(&member_id)
					.await
					.with_context(|| format!("failed to delete member {member_id}"))?;
				Ok(json!({ "deleted": member_id, "groupsUpdated": groups_updated }))
			}
		}
	}

	async fn groups(
		&self,
		command: GroupsCommand,
		actor: &ActorArgs,
	) -> anyhow::Result<serde_json::Value> {
		let caller = actor.caller()?;
		match command {
			GroupsCommand::List => to_json(&self.groups.list_groups(&caller).await?),
			GroupsCommand::Show { group_id } => {
				to_json(&self.groups.get_group(&group_id, &caller).await?)
			}
			GroupsCommand::Create {
				name,
				description,
				members,
			} => {
				let view = self
					.groups
					.create_group(
						CreateGroupRequest {
							name,
							description,
							member_refs: members,
						},
						&caller,
					)
					.await
					.context("failed to create group")?;
				to_json(&view)
			}
			GroupsCommand::SetMembers { group_id, refs } => {
				let view = self
					.groups
					.set_members(&group_id, &refs, &caller)
					.await
					.with_context(|| format!("failed to set members of group {group_id}"))?;
				to_json(&view)
			}
			GroupsCommand::Delete { group_id } => {
				self.groups
					.delete_group(&group_id, &caller)
					.await
					.with_context(|| format!("failed to delete group {group_id}"))?;
				Ok(json!({ "deleted": group_id }))
			}
		}
	}

	async fn subgroups(
		&self,
		command: SubgroupsCommand,
		actor: &ActorArgs,
	) -> anyhow::Result<serde_json::Value> {
		let caller = actor.caller()?;
		match command {
			SubgroupsCommand::List { group_id } => {
				to_json(&self.groups.list_subgroups(&group_id, &caller).await?)
			}
			SubgroupsCommand::Create {
				group_id,
				name,
				description,
				members,
			} => {
				let view = self
					.groups
					.create_subgroup(
						&group_id,
						CreateSubgroupRequest {
							name,
							description,
							member_refs: members,
						},
						&caller,
					)
					.await
					.context("failed to create subgroup")?;
				to_json(&view)
			}
			SubgroupsCommand::Update {
				group_id,
				subgroup_id,
				name,
				description,
				members,
				clear_members,
			} => {
				let member_refs = if clear_members {
					Some(Vec::new())
				} else if members.is_empty() {
					None
				} else {
					Some(members)
				};
				let view = self
					.groups
					.update_subgroup(
						&group_id,
						&subgroup_id,
						UpdateSubgroupRequest {
							name,
							description,
							member_refs,
						},
						&caller,
					)
					.await
					.with_context(|| format!("failed to update subgroup {subgroup_id}"))?;
				to_json(&view)
			}
			SubgroupsCommand::Delete {
				group_id,
				subgroup_id,
			} => {
				let view = self
					.groups
					.delete_subgroup(&group_id, &subgroup_id, &caller)
					.await
					.with_context(|| format!("failed to delete subgroup {subgroup_id}"))?;
				to_json(&view)
			}
		}
	}

	async fn tasks(
		&self,
		command: TasksCommand,
		actor: &ActorArgs,
	) -> anyhow::Result<serde_json::Value> {
		let caller = actor.caller()?;
		match command {
			TasksCommand::Create {
				group_id,
				subgroup_id,
				name,
				fields,
			} => {
				let input = NewProjectTask {
					task_name: name,
					priority: fields.priority,
					status: fields.status,
					estimate: fields.estimate,
					start_date: fields.start_date,
					end_date: fields.end_date,
				};
				let task = self
					.tasks
					.create_task(&group_id, &subgroup_id, input, &caller)
					.await
					.context("failed to create task")?;
				to_json(&task)
			}
			TasksCommand::List {
				group_id,
				subgroup_id,
				status,
			} => to_json(
				&self
					.tasks
					.list_tasks(&group_id, &subgroup_id, status.as_deref(), &caller)
					.await?,
			),
			TasksCommand::Update {
				task_id,
				name,
				fields,
			} => {
				let task = self
					.tasks
					.update_task(&task_id, task_patch(name, fields), &caller)
					.await
					.with_context(|| format!("failed to update task {task_id}"))?;
				to_json(&task)
			}
			TasksCommand::Delete { task_id } => {
				self.tasks
					.delete_task(&task_id, &caller)
					.await
					.with_context(|| format!("failed to delete task {task_id}"))?;
				Ok(json!({ "deleted": task_id }))
			}
		}
	}

	async fn personal_tasks(
		&self,
		command: PersonalTasksCommand,
		actor: &ActorArgs,
	) -> anyhow::Result<serde_json::Value> {
		let caller = actor.caller()?;
		match command {
			PersonalTasksCommand::Create {
				name,
				assignee,
				fields,
			} => {
				let input = NewTask {
					name,
					priority: fields.priority,
					status: fields.status,
					start_date: fields.start_date,
					end_date: fields.end_date,
					estimate: fields.estimate,
					actual_time: fields.actual_time,
				};
				let task = self
					.personal_tasks
					.create_task(input, &assignee, &caller)
					.await
					.context("failed to create personal task")?;
				to_json(&task)
			}
			PersonalTasksCommand::List => to_json(&self.personal_tasks.list_tasks(&caller).await?),
			PersonalTasksCommand::Update {
				task_id,
				name,
				assignee,
				fields,
			} => {
				let task = self
					.personal_tasks
					.update_task(
						&task_id,
						personal_task_patch(name, fields),
						assignee.as_deref(),
						&caller,
					)
					.await
					.with_context(|| format!("failed to update personal task {task_id}"))?;
				to_json(&task)
			}
			PersonalTasksCommand::Delete { task_id } => {
				self.personal_tasks
					.delete_task(&task_id, &caller)
					.await
					.with_context(|| format!("failed to delete personal task {task_id}"))?;
				Ok(json!({ "deleted": task_id }))
			}
		}
	}
}

fn personal_task_patch(name: Option<String>, fields: PersonalTaskFields) -> TaskPatch {
	TaskPatch {
		name,
		priority: fields.priority,
		status: fields.status,
		assigned_to: None,
		start_date: fields.start_date,
		end_date: fields.end_date,
		estimate: fields.estimate,
		actual_time: fields.actual_time,
	}
}

fn member_patch(fields: MemberFields) -> MemberPatch {
	MemberPatch {
		name: fields.name,
		email: fields.email,
		phone: fields.phone,
		designation: fields.designation,
		role: fields.role.map(Role::new),
	}
}

fn task_patch(name: Option<String>, fields: TaskFields) -> ProjectTaskPatch {
	ProjectTaskPatch {
		task_name: name,
		priority: fields.priority,
		status: fields.status,
		estimate: fields.estimate,
		start_date: fields.start_date,
		end_date: fields.end_date,
	}
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<serde_json::Value> {
	serde_json::to_value(value).context("failed to serialize output")
}
