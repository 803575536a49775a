// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Workspace-wide totals for the dashboard.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use workboard_core::{Member, PROJECT_TASK_CHART_STATUSES, TASK_CHART_STATUSES};
use workboard_db::{GroupStore, MemberStore, ProjectTaskStore, TaskStore};

use crate::error::Result;
use crate::stores::Stores;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
	pub status: String,
	pub count: u64,
}

/// A member with the time logged on the personal tasks they created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWorkload {
	#[serde(flatten)]
	pub member: Member,
	pub total_actual_minutes: u64,
	/// `total_actual_minutes` as `H:MM`.
	pub total_actual_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
	pub members: Vec<MemberWorkload>,
	pub tasks: u64,
	pub workgroups: usize,
	pub workspaces: usize,
	pub project_tasks: u64,
	pub task_status: Vec<StatusCount>,
	pub project_task_status: Vec<StatusCount>,
}

#[derive(Clone)]
pub struct DashboardService {
	members: Arc<dyn MemberStore>,
	groups: Arc<dyn GroupStore>,
	project_tasks: Arc<dyn ProjectTaskStore>,
	tasks: Arc<dyn TaskStore>,
}

impl DashboardService {
	pub fn new(stores: &Stores) -> Self {
		Self {
			members: stores.members.clone(),
			groups: stores.groups.clone(),
			project_tasks: stores.project_tasks.clone(),
			tasks: stores.tasks.clone(),
		}
	}

	#[tracing::instrument(skip(self))]
	pub async fn stats(&self) -> Result<DashboardStats> {
		let members = self.members.list_members().await?;
		let groups = self.groups.list_groups().await?;
		let task_counts = self.tasks.task_status_counts().await?;
		let project_task_counts = self.project_tasks.project_task_status_counts().await?;

		let logged: HashMap<_, _> = self.tasks.actual_minutes_by_creator().await?.into_iter().collect();
		let members = members
			.into_iter()
			.map(|member| {
				let minutes = logged
					.get(&member.id)
					.map(|m| u64::try_from(*m).unwrap_or_default())
					.unwrap_or_default();
				MemberWorkload {
					total_actual_time: format_minutes(minutes),
					total_actual_minutes: minutes,
					member,
				}
			})
			.collect();

		let stats = DashboardStats {
			members,
			tasks: total(&task_counts),
			workgroups: groups.len(),
			workspaces: groups.iter().map(|g| g.subgroups.len()).sum(),
			project_tasks: total(&project_task_counts),
			task_status: chart(&TASK_CHART_STATUSES, task_counts),
			project_task_status: chart(&PROJECT_TASK_CHART_STATUSES, project_task_counts),
		};
		tracing::debug!(
			workgroups = stats.workgroups,
			tasks = stats.tasks,
			project_tasks = stats.project_tasks,
			"dashboard stats computed"
		);
		Ok(stats)
	}
}

/// Same `H:MM` shape as [`workboard_core::WorkMinutes`], for sums past `u32`.
fn format_minutes(minutes: u64) -> String {
	format!("{}:{:02}", minutes / 60, minutes % 60)
}

fn total(counts: &[(String, i64)]) -> u64 {
	counts.iter().map(|(_, n)| u64::try_from(*n).unwrap_or_default()).sum()
}

/// The fixed statuses first, zero when absent, then any other stored status
/// in store order.
fn chart(fixed: &[&str], counts: Vec<(String, i64)>) -> Vec<StatusCount> {
	let mut by_status: HashMap<String, i64> = HashMap::new();
	let mut extra = Vec::new();
	for (status, count) in counts {
		if fixed.contains(&status.as_str()) {
			by_status.insert(status, count);
		} else {
			extra.push((status, count));
		}
	}

	fixed
		.iter()
		.map(|status| (status.to_string(), by_status.get(*status).copied().unwrap_or(0)))
		.chain(extra)
		.map(|(status, count)| StatusCount {
			status,
			count: u64::try_from(count).unwrap_or_default(),
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use workboard_core::{
		Group, MemberId, NewMember, NewProjectTask, NewTask, ProjectCode, ProjectTask, Subgroup,
		Task,
	};
	use workboard_db::testing::create_test_pool;
	use workboard_db::{GroupRepository, MemberRepository, ProjectTaskRepository, TaskRepository};

	fn pairs(counts: &[StatusCount]) -> Vec<(&str, u64)> {
		counts.iter().map(|c| (c.status.as_str(), c.count)).collect()
	}

	#[test]
	fn chart_keeps_fixed_statuses_and_appends_others() {
		let counts = vec![
			("Blocked".to_string(), 2),
			("Completed".to_string(), 4),
		];
		let chart = chart(&TASK_CHART_STATUSES, counts);
		assert_eq!(
			pairs(&chart),
			vec![("Not Started", 0), ("In Progress", 0), ("Completed", 4), ("Blocked", 2)]
		);
	}

	#[tokio::test]
	async fn empty_store_reports_zeroes() {
		let pool = create_test_pool().await;
		let stats = DashboardService::new(&Stores::sqlite(pool)).stats().await.unwrap();

		assert!(stats.members.is_empty());
		assert_eq!((stats.tasks, stats.workgroups, stats.workspaces, stats.project_tasks), (0, 0, 0, 0));
		assert_eq!(stats.task_status.len(), 3);
		assert!(stats.project_task_status.iter().all(|c| c.count == 0));
	}

	#[tokio::test]
	async fn totals_span_every_store() {
		let pool = create_test_pool().await;
		let members = MemberRepository::new(pool.clone());
		let tasks = TaskRepository::new(pool.clone());

		let ada = Member::new(NewMember {
			name: "Ada".to_string(),
			email: "ada@example.com".to_string(),
			..Default::default()
		});
		let bob = Member::new(NewMember {
			name: "Bob".to_string(),
			email: "bob@example.com".to_string(),
			..Default::default()
		});
		members.create_member(&ada).await.unwrap();
		members.create_member(&bob).await.unwrap();

		for (actual, status) in [("1:30", "Completed"), ("0:45", "In Progress")] {
			let mut task = Task::new(
				NewTask {
					name: "Work".to_string(),
					actual_time: Some(actual.to_string()),
					..Default::default()
				},
				bob.id,
				ada.id,
			);
			task.status = status.to_string();
			tasks.create_task(&task).await.unwrap();
		}

		let mut group = Group::new("Ops", None, vec![bob.id], ada.id);
		let launch = Subgroup::new("Launch", None, vec![], ada.id);
		let launch_id = launch.id;
		group.push_subgroup(launch);
		group.push_subgroup(Subgroup::new("Oncall", None, vec![], ada.id));
		let groups = GroupRepository::new(pool.clone());
		groups.create_group(&group).await.unwrap();
		groups
			.create_group(&Group::new("Design", None, vec![], MemberId::generate()))
			.await
			.unwrap();
		ProjectTaskRepository::new(pool.clone())
			.create_project_task(&ProjectTask::new(
				ProjectCode::first(),
				group.id,
				launch_id,
				ada.id,
				NewProjectTask {
					task_name: "Plan".to_string(),
					..Default::default()
				},
			))
			.await
			.unwrap();

		let stats = DashboardService::new(&Stores::sqlite(pool)).stats().await.unwrap();

		assert_eq!(stats.workgroups, 2);
		assert_eq!(stats.workspaces, 2);
		assert_eq!(stats.tasks, 2);
		assert_eq!(stats.project_tasks, 1);
		assert_eq!(
			pairs(&stats.task_status),
			vec![("Not Started", 0), ("In Progress", 1), ("Completed", 1)]
		);
		assert_eq!(
			pairs(&stats.project_task_status),
			vec![("Planning", 0), ("In Progress", 0), ("Completed", 0), ("Pending", 1)]
		);

		let workload: HashMap<_, _> = stats
			.members
			.iter()
			.map(|w| (w.member.id, (w.total_actual_minutes, w.total_actual_time.as_str())))
			.collect();
		assert_eq!(workload[&ada.id], (135, "2:15"));
		assert_eq!(workload[&bob.id], (0, "0:00"));

		let json = serde_json::to_value(&stats).unwrap();
		assert_eq!(json["projectTaskStatus"][3]["status"], "Pending");
		assert!(json["members"][0].get("totalActualMinutes").is_some());
		assert!(json["members"][0].get("memberId").is_some());
	}
}
