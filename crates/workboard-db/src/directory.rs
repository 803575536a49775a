// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory user repository.
//!
//! Directory users are pre-existing principals from an external system. The
//! membership layer only ever reads them; [`DirectoryUserRepository::create_directory_user`]
//! exists for seeding and tests.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};
use workboard_core::{normalize_email, DirectoryUser, DirectoryUserId, Role};

use crate::error::DbError;
use crate::row::{format_timestamp, parse_id, parse_timestamp};

#[async_trait]
pub trait DirectoryUserStore: Send + Sync {
	async fn get_directory_user_by_id(
		&self,
		id: &DirectoryUserId,
	) -> Result<Option<DirectoryUser>, DbError>;
	async fn get_directory_user_by_email(&self, email: &str)
		-> Result<Option<DirectoryUser>, DbError>;
	async fn list_directory_users(&self) -> Result<Vec<DirectoryUser>, DbError>;
}

#[derive(Clone)]
pub struct DirectoryUserRepository {
	pool: SqlitePool,
}

impl DirectoryUserRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Insert a directory user.
	#[tracing::instrument(skip(self, user), fields(directory_user_id = %user.id))]
	pub async fn create_directory_user(&self, user: &DirectoryUser) -> Result<(), DbError> {
		sqlx::query(
			r#"
			INSERT INTO directory_users (id, name, email, phone, role, created_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(user.id.to_string())
		.bind(&user.name)
		.bind(normalize_email(&user.email))
		.bind(&user.phone)
		.bind(user.role.as_ref().map(Role::as_str))
		.bind(format_timestamp(&user.created_at))
		.execute(&self.pool)
		.await?;

		tracing::debug!(directory_user_id = %user.id, "directory user created");
		Ok(())
	}

	#[tracing::instrument(skip(self), fields(directory_user_id = %id))]
	pub async fn get_directory_user_by_id(
		&self,
		id: &DirectoryUserId,
	) -> Result<Option<DirectoryUser>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, email, phone, role, created_at
			FROM directory_users
			WHERE id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_directory_user(&r)).transpose()
	}

	/// Get a directory user by email.
	///
	/// Emails are not unique in the directory; the oldest record wins.
	#[tracing::instrument(skip(self, email))]
	pub async fn get_directory_user_by_email(
		&self,
		email: &str,
	) -> Result<Option<DirectoryUser>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, name, email, phone, role, created_at
			FROM directory_users
			WHERE email = ?
			ORDER BY created_at, rowid
			LIMIT 1
			"#,
		)
		.bind(normalize_email(email))
		.fetch_optional(&self.pool)
		.await?;

		row.map(|r| row_to_directory_user(&r)).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_directory_users(&self) -> Result<Vec<DirectoryUser>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, name, email, phone, role, created_at
			FROM directory_users
			ORDER BY created_at, rowid
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_directory_user).collect()
	}
}

fn row_to_directory_user(row: &sqlx::sqlite::SqliteRow) -> Result<DirectoryUser, DbError> {
	let id: String = row.try_get("id")?;
	let role: Option<String> = row.try_get("role")?;
	let created_at: String = row.try_get("created_at")?;

	Ok(DirectoryUser {
		id: parse_id(&id, "directory user ID")?,
		name: row.try_get("name")?,
		email: row.try_get("email")?,
		phone: row.try_get("phone")?,
		role: role.filter(|r| !r.trim().is_empty()).map(Role::new),
		created_at: parse_timestamp(&created_at, "created_at")?,
	})
}

#[async_trait]
impl DirectoryUserStore for DirectoryUserRepository {
	async fn get_directory_user_by_id(
		&self,
		id: &DirectoryUserId,
	) -> Result<Option<DirectoryUser>, DbError> {
		self.get_directory_user_by_id(id).await
	}

	async fn get_directory_user_by_email(
		&self,
		email: &str,
	) -> Result<Option<DirectoryUser>, DbError> {
		self.get_directory_user_by_email(email).await
	}

	async fn list_directory_users(&self) -> Result<Vec<DirectoryUser>, DbError> {
		self.list_directory_users().await
	}
}
