// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use workboard_core::{Caller, GroupId, MemberId, ProjectTaskId, Role, SubgroupId, TaskId};

/// Workboard - workgroup membership management.
#[derive(Parser, Debug)]
#[command(name = "workboard", about = "Workgroup membership management", version)]
pub struct Cli {
	/// Config file (defaults to /etc/workboard/workboard.toml)
	#[arg(long, global = true, env = "WORKBOARD_CONFIG")]
	pub config: Option<PathBuf>,

	/// Log level or filter directive, overriding the configured level
	#[arg(long, global = true)]
	pub log_level: Option<String>,

	/// Emit logs as JSON
	#[arg(long, global = true)]
	pub json_logs: bool,

	#[command(flatten)]
	pub actor: ActorArgs,

	#[command(subcommand)]
	pub command: Command,
}

/// Who is performing the operation. Trusted as given.
#[derive(Args, Debug, Clone, Default)]
pub struct ActorArgs {
	/// Member or directory user id of the caller
	#[arg(long = "actor", global = true, env = "WORKBOARD_ACTOR")]
	pub actor_ref: Option<String>,

	/// Email of the caller, used when the id does not resolve
	#[arg(long, global = true, env = "WORKBOARD_ACTOR_EMAIL")]
	pub actor_email: Option<String>,

	/// Role of the caller
	#[arg(long, global = true, env = "WORKBOARD_ACTOR_ROLE")]
	pub actor_role: Option<String>,
}

impl ActorArgs {
	/// Builds the caller context; at least one of id or email is required.
	pub fn caller(&self) -> anyhow::Result<Caller> {
		let actor_ref = self.actor_ref.clone().unwrap_or_default();
		let email = self.actor_email.clone().unwrap_or_default();
		if actor_ref.trim().is_empty() && email.trim().is_empty() {
			anyhow::bail!("this command needs a caller: pass --actor or --actor-email");
		}
		Ok(Caller::new(
			actor_ref,
			email,
			Role::or_default(self.actor_role.as_deref()),
		))
	}
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Apply database migrations
	Migrate,
	/// Show version information
	Version,
	/// Manage members and browse the directory
	#[command(subcommand)]
	Members(MembersCommand),
	/// Resolve raw member references to canonical member ids
	Resolve {
		/// Member ids or directory user ids
		#[arg(required = true)]
		refs: Vec<String>,
	},
	/// Manage workgroups
	#[command(subcommand)]
	Groups(GroupsCommand),
	/// Manage workspaces inside a workgroup
	#[command(subcommand)]
	Subgroups(SubgroupsCommand),
	/// Manage project tasks inside a workspace
	#[command(subcommand)]
	Tasks(TasksCommand),
	/// Manage personal tasks
	#[command(subcommand)]
	PersonalTasks(PersonalTasksCommand),
	/// Totals across members, groups and tasks
	Dashboard,
}

#[derive(Subcommand, Debug)]
pub enum MembersCommand {
	/// List members together with directory users not yet promoted
	List,
	/// Create a member directly
	Create {
		#[arg(long)]
		name: String,
		#[arg(long)]
		email: String,
		#[arg(long)]
		phone: Option<String>,
		#[arg(long)]
		designation: Option<String>,
		#[arg(long)]
		role: Option<String>,
	},
	/// Update a member; a directory user id promotes that user
	Update {
		/// Member id or directory user id
		reference: String,
		#[command(flatten)]
		fields: MemberFields,
	},
	/// Delete a member
	Delete { member_id: MemberId },
}

#[derive(Args, Debug, Default)]
pub struct MemberFields {
	#[arg(long)]
	pub name: Option<String>,
	#[arg(long)]
	pub email: Option<String>,
	#[arg(long)]
	pub phone: Option<String>,
	#[arg(long)]
	pub designation: Option<String>,
	#[arg(long)]
	pub role: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum GroupsCommand {
	/// Groups the caller created or belongs to
	List,
	/// Show one group
	Show { group_id: GroupId },
	/// Create a group
	Create {
		#[arg(long)]
		name: String,
		#[arg(long)]
		description: Option<String>,
		/// Member reference; repeat for several
		#[arg(long = "member")]
		members: Vec<String>,
	},
	/// Replace a group's member list
	SetMembers {
		group_id: GroupId,
		/// Member references; none clears the list
		refs: Vec<String>,
	},
	/// Delete a group and its workspaces
	Delete { group_id: GroupId },
}

#[derive(Subcommand, Debug)]
pub enum SubgroupsCommand {
	/// Workspaces of a group visible to the caller
	List { group_id: GroupId },
	/// Create a workspace
	Create {
		group_id: GroupId,
		#[arg(long)]
		name: String,
		#[arg(long)]
		description: Option<String>,
		/// Member reference; repeat for several
		#[arg(long = "member")]
		members: Vec<String>,
	},
	/// Update a workspace
	Update {
		group_id: GroupId,
		subgroup_id: SubgroupId,
		#[arg(long)]
		name: Option<String>,
		#[arg(long)]
		description: Option<String>,
		/// Replacement member reference; repeat for several
		#[arg(long = "member", conflicts_with = "clear_members")]
		members: Vec<String>,
		/// Remove every member
		#[arg(long)]
		clear_members: bool,
	},
	/// Delete a workspace and its tasks
	Delete {
		group_id: GroupId,
		subgroup_id: SubgroupId,
	},
}

#[derive(Subcommand, Debug)]
pub enum TasksCommand {
	/// Create a task
	Create {
		group_id: GroupId,
		subgroup_id: SubgroupId,
		#[arg(long)]
		name: String,
		#[command(flatten)]
		fields: TaskFields,
	},
	/// List tasks, newest first
	List {
		group_id: GroupId,
		subgroup_id: SubgroupId,
		#[arg(long)]
		status: Option<String>,
	},
	/// Update a task
	Update {
		task_id: ProjectTaskId,
		#[arg(long)]
		name: Option<String>,
		#[command(flatten)]
		fields: TaskFields,
	},
	/// Delete a task
	Delete { task_id: ProjectTaskId },
}

#[derive(Args, Debug, Default)]
pub struct TaskFields {
	#[arg(long)]
	pub priority: Option<String>,
	#[arg(long)]
	pub status: Option<String>,
	#[arg(long)]
	pub estimate: Option<String>,
	#[arg(long)]
	pub start_date: Option<String>,
	#[arg(long)]
	pub end_date: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PersonalTasksCommand {
	/// Create a task owned by the caller
	Create {
		#[arg(long)]
		name: String,
		/// Member or directory user id of the assignee
		#[arg(long)]
		assignee: String,
		#[command(flatten)]
		fields: PersonalTaskFields,
	},
	/// Tasks the caller created or is assigned to; every task for admins
	List,
	/// Update a task
	Update {
		task_id: TaskId,
		#[arg(long)]
		name: Option<String>,
		/// Reassign to this member or directory user id
		#[arg(long)]
		assignee: Option<String>,
		#[command(flatten)]
		fields: PersonalTaskFields,
	},
	/// Delete a task
	Delete { task_id: TaskId },
}

#[derive(Args, Debug, Default)]
pub struct PersonalTaskFields {
	#[arg(long)]
	pub priority: Option<String>,
	#[arg(long)]
	pub status: Option<String>,
	/// YYYY-MM-DD
	#[arg(long)]
	pub start_date: Option<NaiveDate>,
	/// YYYY-MM-DD
	#[arg(long)]
	pub end_date: Option<NaiveDate>,
	/// H:MM
	#[arg(long)]
	pub estimate: Option<String>,
	/// H:MM
	#[arg(long)]
	pub actual_time: Option<String>,
}
