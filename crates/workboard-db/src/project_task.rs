// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project task repository.
//!
//! Project codes are stored as their bare sequence number in the unique `seq`
//! column. Two writers racing for the same next code cannot both succeed; the
//! loser sees [`DbError::Conflict`] and retries with a fresh code.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, QueryBuilder, Row, Sqlite};
use workboard_core::{ProjectCode, ProjectTask, ProjectTaskId, SubgroupId};

use crate::error::DbError;
use crate::row::{format_timestamp, parse_id, parse_timestamp};

#[async_trait]
pub trait ProjectTaskStore: Send + Sync {
	async fn create_project_task(&self, task: &ProjectTask) -> Result<(), DbError>;
	async fn get_project_task_by_id(
		&self,
		id: &ProjectTaskId,
	) -> Result<Option<ProjectTask>, DbError>;
	async fn list_project_tasks(
		&self,
		subgroup_id: &SubgroupId,
		status: Option<&str>,
	) -> Result<Vec<ProjectTask>, DbError>;
	async fn update_project_task(&self, task: &ProjectTask) -> Result<(), DbError>;
	async fn delete_project_task(&self, id: &ProjectTaskId) -> Result<bool, DbError>;
	async fn delete_project_tasks_for_subgroup(&self, subgroup_id: &SubgroupId)
		-> Result<u64, DbError>;
	async fn latest_project_code(&self) -> Result<Option<ProjectCode>, DbError>;
	async fn project_task_status_counts(&self) -> Result<Vec<(String, i64)>, DbError>;
}

#[derive(Clone)]
pub struct ProjectTaskRepository {
	pool: SqlitePool,
}

impl ProjectTaskRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a task with the code it already carries.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if the code is taken.
	#[tracing::instrument(skip(self, task), fields(task_id = %task.id, code = %task.code))]
	pub async fn create_project_task(&self, task: &ProjectTask) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO project_tasks (
				id, seq, task_name, group_id, subgroup_id, priority, status,
				estimate, start_date, end_date, created_by, created_at, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(task.id.to_string())
		.bind(i64::from(task.code.sequence()))
		.bind(&task.task_name)
		.bind(task.group_id.to_string())
		.bind(task.subgroup_id.to_string())
		.bind(&task.priority)
		.bind(&task.status)
		.bind(&task.estimate)
		.bind(&task.start_date)
		.bind(&task.end_date)
		.bind(task.created_by.to_string())
		.bind(format_timestamp(&task.created_at))
		.bind(format_timestamp(&task.updated_at))
		.execute(&self.pool)
		.await
		.map_err(|e| DbError::from_unique_violation(e, || format!("project code {} is taken", task.code)))?;

		tracing::debug!(task_id = %task.id, code = %task.code, "project task created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(task_id = %id))]
	pub async fn get_project_task_by_id(
		&self,
		id: &ProjectTaskId,
	) -> Result<Option<ProjectTask>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, seq, task_name, group_id, subgroup_id, priority, status,
			       estimate, start_date, end_date, created_by, created_at, updated_at
			FROM project_tasks
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_project_task(&r)).transpose()
	}

	/// Tasks of one subgroup, newest code first, optionally filtered by status.
	#[tracing::instrument(skip(self), fields(subgroup_id = %subgroup_id))]
	pub async fn list_project_tasks(
		&self,
		subgroup_id: &SubgroupId,
		status: Option<&str>,
	) -> Result<Vec<ProjectTask>, DbError> {
		let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
			r#"
			SELECT id, seq, task_name, group_id, subgroup_id, priority, status,
			       estimate, start_date, end_date, created_by, created_at, updated_at
			FROM project_tasks
			WHERE subgroup_id = "#,
		);
		builder.push_bind(subgroup_id.to_string());
		if let Some(status) = status {
			builder.push(" AND status = ");
			builder.push_bind(status.to_string());
		}
		builder.push(" ORDER BY seq DESC");

		let rows = builder.build().fetch_all(&self.pool).await?;
		rows.iter().map(row_to_project_task).collect()
	}

	/// Overwrite a task's editable fields. The code never changes.
	#[tracing::instrument(skip(self, task), fields(task_id = %task.id))]
	pub async fn update_project_task(&self, task: &ProjectTask) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE project_tasks
			SET task_name = ?, priority = ?, status = ?, estimate = ?,
			    start_date = ?, end_date = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&task.task_name)
		.bind(&task.priority)
		.bind(&task.status)
		.bind(&task.estimate)
		.bind(&task.start_date)
		.bind(&task.end_date)
		.bind(format_timestamp(&task.updated_at))
		.bind(task.id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("project task {}", task.id)));
		}
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(task_id = %id))]
	pub async fn delete_project_task(&self, id: &ProjectTaskId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM project_tasks WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Remove every task of a subgroup. Returns how many were removed.
	#[tracing::instrument(skip(self), fields(subgroup_id = %subgroup_id))]
	pub async fn delete_project_tasks_for_subgroup(
		&self,
		subgroup_id: &SubgroupId,
	) -> Result<u64, DbError> {
		let result = sqlx::query("DELETE FROM project_tasks WHERE subgroup_id = ?")
			.bind(subgroup_id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected())
	}

	/// The highest code handed out so far, across all subgroups.
	#[tracing::instrument(skip(self))]
	pub async fn latest_project_code(&self) -> Result<Option<ProjectCode>, DbError> {
		let (max,): (Option<i64>,) = sqlx::query_as("SELECT MAX(seq) FROM project_tasks")
			.fetch_one(&self.pool)
			.await?;

		max.map(sequence_to_code).transpose()
	}

	/// Project task count per distinct status, ordered by status.
	#[tracing::instrument(skip(self))]
	pub async fn project_task_status_counts(&self) -> Result<Vec<(String, i64)>, DbError> {
		let counts = sqlx::query_as(
			"SELECT status, COUNT(*) FROM project_tasks GROUP BY status ORDER BY status",
		)
		.fetch_all(&self.pool)
		.await?;
		Ok(counts)
	}
}

fn sequence_to_code(seq: i64) -> Result<ProjectCode, DbError> {
	u32::try_from(seq)
		.map(ProjectCode::from_sequence)
		.map_err(|_| DbError::Internal(format!("Invalid project sequence: {seq}")))
}

fn row_to_project_task(row: &sqlx::sqlite::SqliteRow) -> Result<ProjectTask, DbError> {
	let id: String = row.try_get("id")?;
	let seq: i64 = row.try_get("seq")?;
	let group_id: String = row.try_get("group_id")?;
	let subgroup_id: String = row.try_get("subgroup_id")?;
	let created_by: String = row.try_get("created_by")?;
	let created_at: String = row.try_get("created_at")?;
	let updated_at: String = row.try_get("updated_at")?;

	Ok(ProjectTask {
		id: parse_id(&id, "project task ID")?,
		code: sequence_to_code(seq)?,
		task_name: row.try_get("task_name")?,
		group_id: parse_id(&group_id, "group ID")?,
		subgroup_id: parse_id(&subgroup_id, "subgroup ID")?,
		priority: row.try_get("priority")?,
		status: row.try_get("status")?,
		estimate: row.try_get("estimate")?,
		start_date: row.try_get("start_date")?,
		end_date: row.try_get("end_date")?,
		created_by: parse_id(&created_by, "created_by")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}

#[async_trait]
impl ProjectTaskStore for ProjectTaskRepository {
	async fn create_project_task(&self, task: &ProjectTask) -> Result<(), DbError> {
		self.create_project_task(task).await
	}

	async fn get_project_task_by_id(
		&self,
		id: &ProjectTaskId,
	) -> Result<Option<ProjectTask>, DbError> {
		self.get_project_task_by_id(id).await
	}

	async fn list_project_tasks(
		&self,
		subgroup_id: &SubgroupId,
		status: Option<&str>,
	) -> Result<Vec<ProjectTask>, DbError> {
		self.list_project_tasks(subgroup_id, status).await
	}

	async fn update_project_task(&self, task: &ProjectTask) -> Result<(), DbError> {
		self.update_project_task(task).await
	}

	async fn delete_project_task(&self, id: &ProjectTaskId) -> Result<bool, DbError> {
		self.delete_project_task(id).await
	}

	async fn delete_project_tasks_for_subgroup(
		&self,
		subgroup_id: &SubgroupId,
	) -> Result<u64, DbError> {
		self.delete_project_tasks_for_subgroup(subgroup_id).await
	}

	async fn latest_project_code(&self) -> Result<Option<ProjectCode>, DbError> {
		self.latest_project_code().await
	}

	async fn project_task_status_counts(&self) -> Result<Vec<(String, i64)>, DbError> {
		self.project_task_status_counts().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::group::GroupRepository;
	use crate::testing::create_test_pool;
	use workboard_core::{Group, MemberId, NewProjectTask, ProjectTaskPatch, Subgroup};

	struct Fixture {
		repo: ProjectTaskRepository,
		groups: GroupRepository,
		group: Group,
		subgroup_id: SubgroupId,
	}

	async fn fixture() -> Fixture {
		let pool = create_test_pool().await;
		let groups = GroupRepository::new(pool.clone());
		let creator = MemberId::generate();
		let mut group = Group::new("Ops", None, vec![], creator);
		let subgroup = Subgroup::new("Launch", None, vec![], creator);
		let subgroup_id = subgroup.id;
		group.push_subgroup(subgroup);
		groups.create_group(&group).await.unwrap();

		Fixture {
			repo: ProjectTaskRepository::new(pool),
			groups,
			group,
			subgroup_id,
		}
	}

	fn task(f: &Fixture, seq: u32, name: &str) -> ProjectTask {
		ProjectTask::new(
			ProjectCode::from_sequence(seq),
			f.group.id,
			f.subgroup_id,
			f.group.created_by,
			NewProjectTask {
				task_name: name.to_string(),
				..Default::default()
			},
		)
	}

	#[tokio::test]
	async fn create_fetch_and_latest_code() {
		let f = fixture().await;
		assert!(f.repo.latest_project_code().await.unwrap().is_none());

		let first = task(&f, 1, "Plan");
		f.repo.create_project_task(&first).await.unwrap();
		f.repo.create_project_task(&task(&f, 2, "Build")).await.unwrap();

		let stored = f.repo.get_project_task_by_id(&first.id).await.unwrap().unwrap();
		assert_eq!(stored.code.to_string(), "PRJ-001");
		assert_eq!(stored.priority, "Medium");
		assert_eq!(stored.status, "Pending");
		assert_eq!(
			f.repo.latest_project_code().await.unwrap(),
			Some(ProjectCode::from_sequence(2))
		);
	}

	#[tokio::test]
	async fn taken_code_is_conflict() {
		let f = fixture().await;
		f.repo.create_project_task(&task(&f, 1, "Plan")).await.unwrap();

		let result = f.repo.create_project_task(&task(&f, 1, "Again")).await;
		assert!(matches!(result, Err(DbError::Conflict(_))));
	}

	#[tokio::test]
	async fn lists_newest_first_with_status_filter() {
		let f = fixture().await;
		let plan = task(&f, 1, "Plan");
		let mut build = task(&f, 2, "Build");
		build.status = "Done".to_string();
		f.repo.create_project_task(&plan).await.unwrap();
		f.repo.create_project_task(&build).await.unwrap();

		let all: Vec<_> = f
			.repo
			.list_project_tasks(&f.subgroup_id, None)
			.await
			.unwrap()
			.into_iter()
			.map(|t| t.task_name)
			.collect();
		assert_eq!(all, vec!["Build", "Plan"]);

		let done = f.repo.list_project_tasks(&f.subgroup_id, Some("Done")).await.unwrap();
		assert_eq!(done.len(), 1);
		assert_eq!(done[0].id, build.id);

		assert!(f
			.repo
			.list_project_tasks(&SubgroupId::generate(), None)
			.await
			.unwrap()
			.is_empty());
	}

	#[tokio::test]
	async fn update_keeps_code() {
		let f = fixture().await;
		let mut plan = task(&f, 1, "Plan");
		f.repo.create_project_task(&plan).await.unwrap();

		plan.apply(ProjectTaskPatch {
			status: Some("In Progress".to_string()),
			..Default::default()
		});
		f.repo.update_project_task(&plan).await.unwrap();

		let stored = f.repo.get_project_task_by_id(&plan.id).await.unwrap().unwrap();
		assert_eq!(stored.status, "In Progress");
		assert_eq!(stored.code, ProjectCode::first());

		let ghost = task(&f, 9, "Ghost");
		assert!(matches!(
			f.repo.update_project_task(&ghost).await,
			Err(DbError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn deletes_single_and_per_subgroup() {
		let f = fixture().await;
		let plan = task(&f, 1, "Plan");
		f.repo.create_project_task(&plan).await.unwrap();
		f.repo.create_project_task(&task(&f, 2, "Build")).await.unwrap();
		f.repo.create_project_task(&task(&f, 3, "Ship")).await.unwrap();

		assert!(f.repo.delete_project_task(&plan.id).await.unwrap());
		assert!(!f.repo.delete_project_task(&plan.id).await.unwrap());
		assert_eq!(
			f.repo.delete_project_tasks_for_subgroup(&f.subgroup_id).await.unwrap(),
			2
		);
	}

	#[tokio::test]
	async fn counts_tasks_per_status() {
		let f = fixture().await;
		let mut done = task(&f, 1, "Plan");
		done.status = "Completed".to_string();
		f.repo.create_project_task(&done).await.unwrap();
		f.repo.create_project_task(&task(&f, 2, "Build")).await.unwrap();
		f.repo.create_project_task(&task(&f, 3, "Ship")).await.unwrap();

		assert_eq!(
			f.repo.project_task_status_counts().await.unwrap(),
			vec![("Completed".to_string(), 1), ("Pending".to_string(), 2)]
		);
	}

	#[tokio::test]
	async fn deleting_group_removes_its_tasks() {
		let f = fixture().await;
		let plan = task(&f, 1, "Plan");
		f.repo.create_project_task(&plan).await.unwrap();

		f.groups.delete_group(&f.group.id).await.unwrap();
		assert!(f.repo.get_project_task_by_id(&plan.id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn task_requires_existing_group() {
		let f = fixture().await;
		let mut orphan = task(&f, 1, "Orphan");
		orphan.group_id = workboard_core::GroupId::generate();
		assert!(f.repo.create_project_task(&orphan).await.is_err());
	}
}
