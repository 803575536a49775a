// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain types for Workboard.
//!
//! Two identity sources meet here: the external directory ([`DirectoryUser`])
//! and canonical project members ([`Member`]). Workgroups ([`Group`]) and their
//! embedded workspaces ([`Subgroup`]) only ever reference [`MemberId`]s, as do
//! workspace [`ProjectTask`]s and personal [`Task`]s.

pub mod caller;
pub mod group;
pub mod member;
pub mod project_task;
pub mod task;
pub mod types;

pub use caller::Caller;
pub use group::{dedup_members, Group, Subgroup, SubgroupUpdate};
pub use member::{
	DirectoryUser, Member, MemberPatch, NewMember, Principal, REGISTERED_USER_DESIGNATION,
};
pub use project_task::{
	NewProjectTask, ProjectCode, ProjectCodeError, ProjectTask, ProjectTaskPatch,
	DEFAULT_PRIORITY, DEFAULT_STATUS, PROJECT_TASK_CHART_STATUSES,
};
pub use task::{
	NewTask, Task, TaskPatch, WorkMinutes, DEFAULT_TASK_STATUS, TASK_CHART_STATUSES,
};
pub use types::{
	normalize_email, DirectoryUserId, GroupId, MemberId, ProjectTaskId, Role, SubgroupId, TaskId,
};
