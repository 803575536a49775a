// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project tasks tracked inside a workspace.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{GroupId, MemberId, ProjectTaskId, SubgroupId};

pub const DEFAULT_PRIORITY: &str = "Medium";
pub const DEFAULT_STATUS: &str = "Pending";

/// Statuses the dashboard always reports for project tasks.
pub const PROJECT_TASK_CHART_STATUSES: [&str; 3] = ["Planning", "In Progress", "Completed"];

const PROJECT_CODE_PREFIX: &str = "PRJ-";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectCodeError {
	#[error("project code must start with PRJ-: {0}")]
	MissingPrefix(String),

	#[error("project code has an invalid sequence number: {0}")]
	InvalidSequence(String),
}

/// Human-facing sequential project code, `PRJ-001`, `PRJ-002`, ...
///
/// The number is zero-padded to three digits and grows past that as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectCode(u32);

impl ProjectCode {
	pub fn first() -> Self {
		Self(1)
	}

	pub fn from_sequence(seq: u32) -> Self {
		Self(seq)
	}

	pub fn sequence(&self) -> u32 {
		self.0
	}

	/// The code following `latest`, or the first code when there is none.
	pub fn next_after(latest: Option<ProjectCode>) -> Self {
		match latest {
			Some(code) => Self(code.0.saturating_add(1)),
			None => Self::first(),
		}
	}
}

impl fmt::Display for ProjectCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{PROJECT_CODE_PREFIX}{:03}", self.0)
	}
}

impl FromStr for ProjectCode {
	type Err = ProjectCodeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let digits = s
			.trim()
			.strip_prefix(PROJECT_CODE_PREFIX)
			.ok_or_else(|| ProjectCodeError::MissingPrefix(s.to_string()))?;
		if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
			return Err(ProjectCodeError::InvalidSequence(s.to_string()));
		}
		digits
			.parse()
			.map(Self)
			.map_err(|_| ProjectCodeError::InvalidSequence(s.to_string()))
	}
}

impl Serialize for ProjectCode {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for ProjectCode {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// A task belonging to a workspace (subgroup).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTask {
	pub id: ProjectTaskId,
	#[serde(rename = "projectId")]
	pub code: ProjectCode,
	pub task_name: String,
	pub group_id: GroupId,
	#[serde(rename = "workspaceId")]
	pub subgroup_id: SubgroupId,
	pub priority: String,
	pub status: String,
	pub estimate: String,
	pub start_date: String,
	pub end_date: String,
	pub created_by: MemberId,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl ProjectTask {
	/// Builds a task from input under `code`, which the caller chooses
	/// (normally the successor of the latest stored code).
	pub fn new(
		code: ProjectCode,
		group_id: GroupId,
		subgroup_id: SubgroupId,
		created_by: MemberId,
		input: NewProjectTask,
	) -> Self {
		let now = Utc::now();
		Self {
			id: ProjectTaskId::generate(),
			code,
			task_name: input.task_name.trim().to_string(),
			group_id,
			subgroup_id,
			priority: input.priority.unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
			status: input.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
			estimate: input.estimate.unwrap_or_default(),
			start_date: input.start_date.unwrap_or_default(),
			end_date: input.end_date.unwrap_or_default(),
			created_by,
			created_at: now,
			updated_at: now,
		}
	}

	pub fn apply(&mut self, patch: ProjectTaskPatch) {
		if let Some(task_name) = patch.task_name {
			self.task_name = task_name;
		}
		if let Some(priority) = patch.priority {
			self.priority = priority;
		}
		if let Some(status) = patch.status {
			self.status = status;
		}
		if let Some(estimate) = patch.estimate {
			self.estimate = estimate;
		}
		if let Some(start_date) = patch.start_date {
			self.start_date = start_date;
		}
		if let Some(end_date) = patch.end_date {
			self.end_date = end_date;
		}
		self.updated_at = Utc::now();
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectTask {
	pub task_name: String,
	#[serde(default)]
	pub priority: Option<String>,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default)]
	pub estimate: Option<String>,
	#[serde(default)]
	pub start_date: Option<String>,
	#[serde(default)]
	pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTaskPatch {
	#[serde(default)]
	pub task_name: Option<String>,
	#[serde(default)]
	pub priority: Option<String>,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default)]
	pub estimate: Option<String>,
	#[serde(default)]
	pub start_date: Option<String>,
	#[serde(default)]
	pub end_date: Option<String>,
}
