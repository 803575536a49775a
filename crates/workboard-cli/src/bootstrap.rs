// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Startup seeding of the configured administrator.

use sqlx::sqlite::SqlitePool;
use workboard_config::BootstrapAdmin;
use workboard_core::{DirectoryUser, Role};
use workboard_db::{DbError, DirectoryUserRepository};

/// Ensures a directory user exists for the bootstrap admin.
///
/// Returns true when a user was created. An existing user with the same email
/// is left untouched, whatever its role.
#[tracing::instrument(skip(pool, admin))]
pub async fn seed_admin(pool: &SqlitePool, admin: &BootstrapAdmin) -> Result<bool, DbError> {
	let repo = DirectoryUserRepository::new(pool.clone());
	if repo.get_directory_user_by_email(&admin.email).await?.is_some() {
		tracing::debug!("bootstrap admin already present");
		return Ok(false);
	}

	let user = DirectoryUser::new(admin.name.clone(), admin.email.clone(), Some(Role::admin()));
	repo.create_directory_user(&user).await?;
	tracing::info!(directory_user_id = %user.id, "seeded bootstrap admin");
	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use workboard_db::testing::create_test_pool;

	fn admin() -> BootstrapAdmin {
		BootstrapAdmin {
			email: "Root@Example.com".to_string(),
			name: "Root".to_string(),
		}
	}

	#[tokio::test]
	async fn seeds_once() {
		let pool = create_test_pool().await;

		assert!(seed_admin(&pool, &admin()).await.unwrap());
		assert!(!seed_admin(&pool, &admin()).await.unwrap());

		let repo = DirectoryUserRepository::new(pool);
		let users = repo.list_directory_users().await.unwrap();
		assert_eq!(users.len(), 1);
		assert_eq!(users[0].email, "root@example.com");
		assert!(users[0].role.as_ref().is_some_and(Role::is_admin));
	}

	#[tokio::test]
	async fn leaves_existing_user_alone() {
		let pool = create_test_pool().await;
		let repo = DirectoryUserRepository::new(pool.clone());
		let existing = DirectoryUser::new("Someone", "root@example.com", None);
		repo.create_directory_user(&existing).await.unwrap();

		assert!(!seed_admin(&pool, &admin()).await.unwrap());
		let stored = repo.get_directory_user_by_email("root@example.com").await.unwrap().unwrap();
		assert_eq!(stored.id, existing.id);
		assert!(stored.role.is_none());
	}
}
