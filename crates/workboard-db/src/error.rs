// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

impl DbError {
	/// Maps a unique-constraint violation to `Conflict`, passing anything else
	/// through as `Sqlx`.
	pub(crate) fn from_unique_violation(e: sqlx::Error, message: impl FnOnce() -> String) -> Self {
		match &e {
			sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Conflict(message()),
			_ => DbError::Sqlx(e),
		}
	}
}

pub type Result<T> = std::result::Result<T, DbError>;
