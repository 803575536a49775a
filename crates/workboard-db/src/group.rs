// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Group repository for database operations.
//!
//! A group and its subgroups are stored as a single row; member lists and
//! subgroups are JSON columns. Writes are guarded by the `version` column so
//! two concurrent read-modify-write cycles cannot silently overwrite each
//! other: the loser gets [`DbError::Conflict`].

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};
use workboard_core::{Group, GroupId, MemberId, Subgroup};

use crate::error::DbError;
use crate::row::{format_timestamp, parse_id, parse_timestamp};

#[async_trait]
pub trait GroupStore: Send + Sync {
	async fn create_group(&self, group: &Group) -> Result<(), DbError>;
	async fn get_group_by_id(&self, id: &GroupId) -> Result<Option<Group>, DbError>;
	async fn update_group(&self, group: &Group) -> Result<i64, DbError>;
	async fn delete_group(&self, id: &GroupId) -> Result<bool, DbError>;
	async fn list_groups_for_member(&self, member_id: &MemberId) -> Result<Vec<Group>, DbError>;
	async fn list_groups(&self) -> Result<Vec<Group>, DbError>;
}

/// Repository for groups and their embedded subgroups.
#[derive(Clone)]
pub struct GroupRepository {
	pool: SqlitePool,
}

impl GroupRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a new group, including any subgroups it already carries.
	#[tracing::instrument(skip(self, group), fields(group_id = %group.id))]
	pub async fn create_group(&self, group: &Group) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO workgroups (id, name, description, members, created_by, subgroups, version, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(group.id.to_string())
		.bind(&group.name)
		.bind(&group.description)
		.bind(serde_json::to_string(&group.members)?)
		.bind(group.created_by.to_string())
		.bind(serde_json::to_string(&group.subgroups)?)
		.bind(group.version)
		.bind(format_timestamp(&group.created_at))
		.bind(format_timestamp(&group.updated_at))
		.execute(&self.pool)
		.await
		.map_err(|e| DbError::from_unique_violation(e, || format!("group {} already exists", group.id)))?;

		tracing::debug!(group_id = %group.id, members = group.members.len(), "group created");
		Ok(())
	}

	/// Get a group by ID.
	///
	/// # Returns
	/// `None` if no group exists with this ID.
	#[tracing::instrument(skip(self), fields(group_id = %id))]
	pub async fn get_group_by_id(&self, id: &GroupId) -> Result<Option<Group>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, description, members, created_by, subgroups, version, created_at, updated_at
			FROM workgroups
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_group(&r)).transpose()
	}

	/// Write back a group read earlier.
	///
	/// The write only lands if the stored version still equals `group.version`.
	///
	/// # Returns
	/// The new version.
	///
	/// # Errors
	/// - `DbError::NotFound` if the group no longer exists.
	/// - `DbError::Conflict` if someone else wrote the group in the meantime.
	#[tracing::instrument(skip(self, group), fields(group_id = %group.id, version = group.version))]
	pub async fn update_group(&self, group: &Group) -> Result<i64, DbError> {
		let result = sqlx::query(
			r#"
			UPDATE workgroups
			SET name = ?, description = ?, members = ?, subgroups = ?, updated_at = ?, version = version + 1
			WHERE id = ? AND version = ?
			"#,
		)
		.bind(&group.name)
		.bind(&group.description)
		.bind(serde_json::to_string(&group.members)?)
		.bind(serde_json::to_string(&group.subgroups)?)
		.bind(format_timestamp(&group.updated_at))
		.bind(group.id.to_string())
		.bind(group.version)
		.execute(&self.pool)
		.await?;

		if result.rows_affected() == 0 {
			let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM workgroups WHERE id = ?")
				.bind(group.id.to_string())
				.fetch_optional(&self.pool)
				.await?;
			return Err(match exists {
				None => DbError::NotFound(format!("group {}", group.id)),
				Some((current,)) => {
					tracing::debug!(group_id = %group.id, expected = group.version, current, "stale group write");
					DbError::Conflict(format!(
						"group {} was modified concurrently (expected version {}, found {current})",
						group.id, group.version
					))
				}
			});
		}

		Ok(group.version + 1)
	}

	/// Delete a group. Its project tasks go with it.
	#[tracing::instrument(skip(self), fields(group_id = %id))]
	pub async fn delete_group(&self, id: &GroupId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM workgroups WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Groups the member created or is listed in, oldest first.
	#[tracing::instrument(skip(self), fields(member_id = %member_id))]
	pub async fn list_groups_for_member(&self, member_id: &MemberId) -> Result<Vec<Group>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, name, description, members, created_by, subgroups, version, created_at, updated_at
			FROM workgroups
			WHERE created_by = ?1
			   OR EXISTS (SELECT 1 FROM json_each(workgroups.members) WHERE json_each.value = ?1)
			ORDER BY created_at, rowid
			"#,
		)
		.bind(member_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_group).collect()
	}

	/// Every group, oldest first.
	#[tracing::instrument(skip(self))]
	pub async fn list_groups(&self) -> Result<Vec<Group>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, name, description, members, created_by, subgroups, version, created_at, updated_at
			FROM workgroups
			ORDER BY created_at, rowid
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_group).collect()
	}
}

fn row_to_group(row: &sqlx::sqlite::SqliteRow) -> Result<Group, DbError> {
	let id: String = row.try_get("id")?;
	let members: String = row.try_get("members")?;
	let created_by: String = row.try_get("created_by")?;
	let subgroups: String = row.try_get("subgroups")?;
	let created_at: String = row.try_get("created_at")?;
	let updated_at: String = row.try_get("updated_at")?;

	Ok(Group {
		id: parse_id(&id, "group ID")?,
		name: row.try_get("name")?,
		description: row.try_get("description")?,
		members: serde_json::from_str::<Vec<MemberId>>(&members)?,
		created_by: parse_id(&created_by, "created_by")?,
		subgroups: serde_json::from_str::<Vec<Subgroup>>(&subgroups)?,
		version: row.try_get("version")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}

#[async_trait]
impl GroupStore for GroupRepository {
	async fn create_group(&self, group: &Group) -> Result<(), DbError> {
		self.create_group(group).await
	}

	async fn get_group_by_id(&self, id: &GroupId) -> Result<Option<Group>, DbError> {
		self.get_group_by_id(id).await
	}

	async fn update_group(&self, group: &Group) -> Result<i64, DbError> {
		self.update_group(group).await
	}

	async fn delete_group(&self, id: &GroupId) -> Result<bool, DbError> {
		self.delete_group(id).await
	}

	async fn list_groups_for_member(&self, member_id: &MemberId) -> Result<Vec<Group>, DbError> {
		self.list_groups_for_member(member_id).await
	}

	async fn list_groups(&self) -> Result<Vec<Group>, DbError> {
		self.list_groups().await
	}
}
