// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Personal task repository, plus the aggregates the dashboard reads.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, QueryBuilder, Row, Sqlite};
use workboard_core::{MemberId, Task, TaskId, WorkMinutes};

use crate::error::DbError;
use crate::row::{format_date, format_timestamp, parse_date, parse_id, parse_timestamp};

#[async_trait]
pub trait TaskStore: Send + Sync {
	async fn create_task(&self, task: &Task) -> Result<(), DbError>;
	async fn get_task_by_id(&self, id: &TaskId) -> Result<Option<Task>, DbError>;
	async fn list_tasks(&self, involving: Option<&MemberId>) -> Result<Vec<Task>, DbError>;
	async fn update_task(&self, task: &Task) -> Result<(), DbError>;
	async fn delete_task(&self, id: &TaskId) -> Result<bool, DbError>;
	async fn task_status_counts(&self) -> Result<Vec<(String, i64)>, DbError>;
	async fn actual_minutes_by_creator(&self) -> Result<Vec<(MemberId, i64)>, DbError>;
}

#[derive(Clone)]
pub struct TaskRepository {
	pool: SqlitePool,
}

impl TaskRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, task), fields(task_id = %task.id))]
	pub async fn create_task(&self, task: &Task) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO tasks (
				id, name, priority, status, assigned_to, start_date, end_date,
				estimate_minutes, actual_minutes, created_by, created_at, updated_at
			)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(task.id.to_string())
		.bind(&task.name)
		.bind(&task.priority)
		.bind(&task.status)
		.bind(task.assigned_to.to_string())
		.bind(format_date(task.start_date.as_ref()))
		.bind(format_date(task.end_date.as_ref()))
		.bind(i64::from(task.estimate.minutes()))
		.bind(i64::from(task.actual_time.minutes()))
		.bind(task.created_by.to_string())
		.bind(format_timestamp(&task.created_at))
		.bind(format_timestamp(&task.updated_at))
		.execute(&self.pool)
		.await?;

		tracing::debug!(task_id = %task.id, "task created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(task_id = %id))]
	pub async fn get_task_by_id(&self, id: &TaskId) -> Result<Option<Task>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, priority, status, assigned_to, start_date, end_date,
			       estimate_minutes, actual_minutes, created_by, created_at, updated_at
			FROM tasks
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_task(&r)).transpose()
	}

	/// Newest first. With `involving`, only tasks that member created or is
	/// assigned to.
	#[tracing::instrument(skip(self))]
	pub async fn list_tasks(&self, involving: Option<&MemberId>) -> Result<Vec<Task>, DbError> {
		let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
			r#"
			SELECT id, name, priority, status, assigned_to, start_date, end_date,
			       estimate_minutes, actual_minutes, created_by, created_at, updated_at
			FROM tasks"#,
		);
		if let Some(member_id) = involving {
			builder.push(" WHERE assigned_to = ");
			builder.push_bind(member_id.to_string());
			builder.push(" OR created_by = ");
			builder.push_bind(member_id.to_string());
		}
		builder.push(" ORDER BY created_at DESC");

		let rows = builder.build().fetch_all(&self.pool).await?;
		rows.iter().map(row_to_task).collect()
	}

	#[tracing::instrument(skip(self, task), fields(task_id = %task.id))]
	pub async fn update_task(&self, task: &Task) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE tasks
			SET name = ?, priority = ?, status = ?, assigned_to = ?, start_date = ?,
			    end_date = ?, estimate_minutes = ?, actual_minutes = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&task.name)
		.bind(&task.priority)
		.bind(&task.status)
		.bind(task.assigned_to.to_string())
		.bind(format_date(task.start_date.as_ref()))
		.bind(format_date(task.end_date.as_ref()))
		.bind(i64::from(task.estimate.minutes()))
		.bind(i64::from(task.actual_time.minutes()))
		.bind(format_timestamp(&task.updated_at))
		.bind(task.id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("task {}", task.id)));
		}
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(task_id = %id))]
	pub async fn delete_task(&self, id: &TaskId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Task count per distinct status, ordered by status.
	#[tracing::instrument(skip(self))]
	pub async fn task_status_counts(&self) -> Result<Vec<(String, i64)>, DbError> {
		let counts =
			sqlx::query_as("SELECT status, COUNT(*) FROM tasks GROUP BY status ORDER BY status")
				.fetch_all(&self.pool)
				.await?;
		Ok(counts)
	}

	/// Logged minutes summed over the tasks each member created.
	#[tracing::instrument(skip(self))]
	pub async fn actual_minutes_by_creator(&self) -> Result<Vec<(MemberId, i64)>, DbError> {
		let rows: Vec<(String, i64)> = sqlx::query_as(
			"SELECT created_by, SUM(actual_minutes) FROM tasks GROUP BY created_by",
		)
		.fetch_all(&self.pool)
		.await?;

		rows
			.into_iter()
			.map(|(id, minutes)| Ok((parse_id(&id, "created_by")?, minutes)))
			.collect()
	}
}

fn minutes_column(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<WorkMinutes, DbError> {
	let minutes: i64 = row.try_get(column)?;
	u32::try_from(minutes)
		.map(WorkMinutes::new)
		.map_err(|_| DbError::Internal(format!("Invalid {column}: {minutes}")))
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task, DbError> {
	let id: String = row.try_get("id")?;
	let assigned_to: String = row.try_get("assigned_to")?;
	let start_date: Option<String> = row.try_get("start_date")?;
	let end_date: Option<String> = row.try_get("end_date")?;
	let created_by: String = row.try_get("created_by")?;
	let created_at: String = row.try_get("created_at")?;
	let updated_at: String = row.try_get("updated_at")?;

	Ok(Task {
		id: parse_id(&id, "task ID")?,
		name: row.try_get("name")?,
		priority: row.try_get("priority")?,
		status: row.try_get("status")?,
		assigned_to: parse_id(&assigned_to, "assigned_to")?,
		start_date: parse_date(start_date.as_deref(), "start_date")?,
		end_date: parse_date(end_date.as_deref(), "end_date")?,
		estimate: minutes_column(row, "estimate_minutes")?,
		actual_time: minutes_column(row, "actual_minutes")?,
		created_by: parse_id(&created_by, "created_by")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}

#[async_trait]
impl TaskStore for TaskRepository {
	async fn create_task(&self, task: &Task) -> Result<(), DbError> {
		self.create_task(task).await
	}

	async fn get_task_by_id(&self, id: &TaskId) -> Result<Option<Task>, DbError> {
		self.get_task_by_id(id).await
	}

	async fn list_tasks(&self, involving: Option<&MemberId>) -> Result<Vec<Task>, DbError> {
		self.list_tasks(involving).await
	}

	async fn update_task(&self, task: &Task) -> Result<(), DbError> {
		self.update_task(task).await
	}

	async fn delete_task(&self, id: &TaskId) -> Result<bool, DbError> {
		self.delete_task(id).await
	}

	async fn task_status_counts(&self) -> Result<Vec<(String, i64)>, DbError> {
		self.task_status_counts().await
	}

	async fn actual_minutes_by_creator(&self) -> Result<Vec<(MemberId, i64)>, DbError> {
		self.actual_minutes_by_creator().await
	}
}
