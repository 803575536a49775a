// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Personal tasks: assigned to one member, outside any workspace.
//!
//! Estimates and logged time are entered as `H:MM` and kept as whole
//! minutes ([`WorkMinutes`]).

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::project_task::DEFAULT_PRIORITY;
use crate::types::{MemberId, TaskId};

pub const DEFAULT_TASK_STATUS: &str = "Not Started";

/// Statuses the dashboard always reports for personal tasks.
pub const TASK_CHART_STATUSES: [&str; 3] = ["Not Started", "In Progress", "Completed"];

/// A span of work in whole minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkMinutes(u32);

impl WorkMinutes {
	pub const ZERO: WorkMinutes = WorkMinutes(0);

	pub fn new(minutes: u32) -> Self {
		Self(minutes)
	}

	pub fn minutes(&self) -> u32 {
		self.0
	}

	/// Parses `H:MM`. Anything else, including blanks, negative parts and
	/// extra colons, reads as zero.
	pub fn from_hhmm(value: &str) -> Self {
		let mut parts = value.trim().split(':');
		let (Some(h), Some(m), None) = (parts.next(), parts.next(), parts.next()) else {
			return Self::ZERO;
		};
		match (h.trim().parse::<u32>(), m.trim().parse::<u32>()) {
			(Ok(h), Ok(m)) => Self(h.saturating_mul(60).saturating_add(m)),
			_ => Self::ZERO,
		}
	}
}

/// `H:MM`, hours unpadded.
impl fmt::Display for WorkMinutes {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
	pub id: TaskId,
	pub name: String,
	pub priority: String,
	pub status: String,
	pub assigned_to: MemberId,
	pub start_date: Option<NaiveDate>,
	pub end_date: Option<NaiveDate>,
	pub estimate: WorkMinutes,
	pub actual_time: WorkMinutes,
	pub created_by: MemberId,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Task {
	pub fn new(input: NewTask, assigned_to: MemberId, created_by: MemberId) -> Self {
		let now = Utc::now();
		Self {
			id: TaskId::generate(),
			name: input.name.trim().to_string(),
			priority: non_blank(input.priority).unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
			status: non_blank(input.status).unwrap_or_else(|| DEFAULT_TASK_STATUS.to_string()),
			assigned_to,
			start_date: input.start_date,
			end_date: input.end_date,
			estimate: input.estimate.as_deref().map(WorkMinutes::from_hhmm).unwrap_or_default(),
			actual_time: input.actual_time.as_deref().map(WorkMinutes::from_hhmm).unwrap_or_default(),
			created_by,
			created_at: now,
			updated_at: now,
		}
	}

	pub fn is_creator(&self, member_id: &MemberId) -> bool {
		self.created_by == *member_id
	}

	/// Creator or assignee.
	pub fn involves(&self, member_id: &MemberId) -> bool {
		self.is_creator(member_id) || self.assigned_to == *member_id
	}

	/// Applies a partial update. Blank time entries leave the stored value.
	pub fn apply(&mut self, patch: TaskPatch) {
		if let Some(name) = patch.name {
			self.name = name.trim().to_string();
		}
		if let Some(priority) = patch.priority {
			self.priority = priority;
		}
		if let Some(status) = patch.status {
			self.status = status;
		}
		if let Some(assigned_to) = patch.assigned_to {
			self.assigned_to = assigned_to;
		}
		if let Some(start_date) = patch.start_date {
			self.start_date = Some(start_date);
		}
		if let Some(end_date) = patch.end_date {
			self.end_date = Some(end_date);
		}
		if let Some(estimate) = non_blank(patch.estimate) {
			self.estimate = WorkMinutes::from_hhmm(&estimate);
		}
		if let Some(actual_time) = non_blank(patch.actual_time) {
			self.actual_time = WorkMinutes::from_hhmm(&actual_time);
		}
		self.updated_at = Utc::now();
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.trim().is_empty())
}

/// Task input with the assignee left to the caller to resolve.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
	pub name: String,
	#[serde(default)]
	pub priority: Option<String>,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default)]
	pub start_date: Option<NaiveDate>,
	#[serde(default)]
	pub end_date: Option<NaiveDate>,
	/// `H:MM`
	#[serde(default)]
	pub estimate: Option<String>,
	/// `H:MM`
	#[serde(default)]
	pub actual_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub priority: Option<String>,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default)]
	pub assigned_to: Option<MemberId>,
	#[serde(default)]
	pub start_date: Option<NaiveDate>,
	#[serde(default)]
	pub end_date: Option<NaiveDate>,
	#[serde(default)]
	pub estimate: Option<String>,
	#[serde(default)]
	pub actual_time: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	mod work_minutes {
		use super::*;

		#[test]
		fn parses_hours_and_minutes() {
			assert_eq!(WorkMinutes::from_hhmm("1:30").minutes(), 90);
			assert_eq!(WorkMinutes::from_hhmm("0:05").minutes(), 5);
			assert_eq!(WorkMinutes::from_hhmm(" 12:00 ").minutes(), 720);
		}

		#[test]
		fn malformed_input_is_zero() {
			for raw in ["", "90", "1:2:3", "a:10", "1:b", "-1:30", ":"] {
				assert_eq!(WorkMinutes::from_hhmm(raw), WorkMinutes::ZERO, "{raw:?}");
			}
		}

		#[test]
		fn displays_unpadded_hours() {
			assert_eq!(WorkMinutes::new(0).to_string(), "0:00");
			assert_eq!(WorkMinutes::new(95).to_string(), "1:35");
			assert_eq!(WorkMinutes::new(6000).to_string(), "100:00");
		}
	}

	mod task {
		use super::*;

		fn sample() -> (Task, MemberId, MemberId) {
			let [assignee, creator] = [MemberId::generate(), MemberId::generate()];
			let task = Task::new(
				NewTask {
					name: " Write report ".to_string(),
					estimate: Some("2:15".to_string()),
					..Default::default()
				},
				assignee,
				creator,
			);
			(task, assignee, creator)
		}

		#[test]
		fn new_applies_defaults() {
			let (task, assignee, creator) = sample();
			assert_eq!(task.name, "Write report");
			assert_eq!(task.priority, "Medium");
			assert_eq!(task.status, "Not Started");
			assert_eq!(task.estimate.minutes(), 135);
			assert_eq!(task.actual_time, WorkMinutes::ZERO);
			assert!(task.involves(&assignee));
			assert!(task.involves(&creator));
			assert!(!task.is_creator(&assignee));
			assert!(!task.involves(&MemberId::generate()));
		}

		#[test]
		fn apply_keeps_times_on_blank_entries() {
			let (mut task, _, _) = sample();
			task.apply(TaskPatch {
				status: Some("In Progress".to_string()),
				estimate: Some("  ".to_string()),
				actual_time: Some("0:45".to_string()),
				..Default::default()
			});
			assert_eq!(task.status, "In Progress");
			assert_eq!(task.estimate.minutes(), 135);
			assert_eq!(task.actual_time.minutes(), 45);
			assert_eq!(task.priority, "Medium");
		}

		#[test]
		fn serializes_minutes_as_numbers() {
			let (task, assignee, _) = sample();
			let json = serde_json::to_value(&task).unwrap();
			assert_eq!(json["estimate"], 135);
			assert_eq!(json["assignedTo"], assignee.to_string());
			assert!(json["startDate"].is_null());
		}
	}

	proptest! {
		#[test]
		fn display_parses_back(minutes in 0u32..1_000_000) {
			let value = WorkMinutes::new(minutes);
			prop_assert_eq!(WorkMinutes::from_hhmm(&value.to_string()), value);
		}
	}
}
