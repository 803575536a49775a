// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Member repository for database operations.
//!
//! Canonical members are the only identities stored in group and subgroup
//! member lists. The `members.email` column is unique, so a second insert
//! for the same email surfaces as [`DbError::Conflict`].

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, QueryBuilder, Row, Sqlite};
use workboard_core::{normalize_email, Member, MemberId, Role};

use crate::error::DbError;
use crate::row::{format_timestamp, parse_id, parse_timestamp};

#[async_trait]
pub trait MemberStore: Send + Sync {
	async fn create_member(&self, member: &Member) -> Result<(), DbError>;
	async fn get_member_by_id(&self, id: &MemberId) -> Result<Option<Member>, DbError>;
	async fn get_member_by_email(&self, email: &str) -> Result<Option<Member>, DbError>;
	async fn get_members_by_ids(&self, ids: &[MemberId]) -> Result<Vec<Member>, DbError>;
	async fn list_members(&self) -> Result<Vec<Member>, DbError>;
	async fn update_member(&self, member: &Member) -> Result<(), DbError>;
	async fn delete_member(&self, id: &MemberId) -> Result<bool, DbError>;
}

/// Repository for canonical member records.
#[derive(Clone)]
pub struct MemberRepository {
	pool: SqlitePool,
}

impl MemberRepository {
	/// Create a new repository with the given pool.
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a new member.
	///
	/// # Errors
	/// Returns `DbError::Conflict` if a member with the same email exists.
	#[tracing::instrument(skip(self, member), fields(member_id = %member.id))]
	pub async fn create_member(&self, member: &Member) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO members (id, name, email, phone, designation, role, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(member.id.to_string())
		.bind(&member.name)
		.bind(normalize_email(&member.email))
		.bind(&member.phone)
		.bind(&member.designation)
		.bind(member.role.as_str())
		.bind(format_timestamp(&member.created_at))
		.bind(format_timestamp(&member.updated_at))
		.execute(&self.pool)
		.await
		.map_err(|e| {
			DbError::from_unique_violation(e, || {
				format!("member with email {} already exists", member.email)
			})
		})?;

		tracing::debug!(member_id = %member.id, "member created");
		Ok(())
	}

	/// Get a member by ID.
	///
	/// # Returns
	/// `None` if no member exists with this ID.
	#[tracing::instrument(skip(self), fields(member_id = %id))]
	pub async fn get_member_by_id(&self, id: &MemberId) -> Result<Option<Member>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, email, phone, designation, role, created_at, updated_at
			FROM members
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_member(&r)).transpose()
	}

	/// Get a member by email. The lookup is case-insensitive.
	#[tracing::instrument(skip(self, email))]
	pub async fn get_member_by_email(&self, email: &str) -> Result<Option<Member>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, email, phone, designation, role, created_at, updated_at
			FROM members
			WHERE email = ?
			"#,
		)
		.bind(normalize_email(email))
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_member(&r)).transpose()
	}

	/// Fetch many members in a single query.
	///
	/// Ids that do not exist are simply absent from the result. The result is
	/// unordered; callers index it by id.
	#[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
	pub async fn get_members_by_ids(&self, ids: &[MemberId]) -> Result<Vec<Member>, DbError> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
			"SELECT id, name, email, phone, designation, role, created_at, updated_at FROM members WHERE id IN (",
		);
		let mut separated = builder.separated(", ");
		for id in ids {
			separated.push_bind(id.to_string());
		}
		separated.push_unseparated(")");

		let rows = builder.build().fetch_all(&self.pool).await?;
		rows.iter().map(row_to_member).collect()
	}

	/// List all members, oldest first.
	#[tracing::instrument(skip(self))]
	pub async fn list_members(&self) -> Result<Vec<Member>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, name, email, phone, designation, role, created_at, updated_at
			FROM members
			ORDER BY created_at, rowid
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_member).collect()
	}

	/// Overwrite a member's mutable fields.
	///
	/// # Errors
	/// - `DbError::NotFound` if the member does not exist.
	/// - `DbError::Conflict` if the new email belongs to another member.
	#[tracing::instrument(skip(self, member), fields(member_id = %member.id))]
	pub async fn update_member(&self, member: &Member) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE members
			SET name = ?, email = ?, phone = ?, designation = ?, role = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&member.name)
		.bind(normalize_email(&member.email))
		.bind(&member.phone)
		.bind(&member.designation)
		.bind(member.role.as_str())
		.bind(format_timestamp(&member.updated_at))
		.bind(member.id.to_string())
		.execute(&self.pool)
		.await
		.map_err(|e| {
			DbError::from_unique_violation(e, || {
				format!("member with email {} already exists", member.email)
			})
		})?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!("member {}", member.id)));
		}
		Ok(())
	}

	/// Delete a member.
	///
	/// # Returns
	/// `true` if a row was removed. Group member lists are not rewritten.
	#[tracing::instrument(skip(self), fields(member_id = %id))]
	pub async fn delete_member(&self, id: &MemberId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM members WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}
}

fn row_to_member(row: &sqlx::sqlite::SqliteRow) -> Result<Member, DbError> {
	let id: String = row.try_get("id")?;
	let role: String = row.try_get("role")?;
	let created_at: String = row.try_get("created_at")?;
	let updated_at: String = row.try_get("updated_at")?;

	Ok(Member {
		id: parse_id(&id, "member ID")?,
		name: row.try_get("name")?,
		email: row.try_get("email")?,
		phone: row.try_get("phone")?,
		designation: row.try_get("designation")?,
		role: Role::or_default(Some(&role)),
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}

#[async_trait]
impl MemberStore for MemberRepository {
	async fn create_member(&self, member: &Member) -> Result<(), DbError> {
		self.create_member(member).await
	}

	async fn get_member_by_id(&self, id: &MemberId) -> Result<Option<Member>, DbError> {
		self.get_member_by_id(id).await
	}

	async fn get_member_by_email(&self, email: &str) -> Result<Option<Member>, DbError> {
		self.get_member_by_email(email).await
	}

	async fn get_members_by_ids(&self, ids: &[MemberId]) -> Result<Vec<Member>, DbError> {
		self.get_members_by_ids(ids).await
	}

	async fn list_members(&self) -> Result<Vec<Member>, DbError> {
		self.list_members().await
	}

	async fn update_member(&self, member: &Member) -> Result<(), DbError> {
		self.update_member(member).await
	}

	async fn delete_member(&self, id: &MemberId) -> Result<bool, DbError> {
		self.delete_member(id).await
	}
}
