// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use sqlx::sqlite::SqlitePool;
use workboard_db::{
	DirectoryUserRepository, DirectoryUserStore, GroupRepository, GroupStore, MemberRepository,
	MemberStore, ProjectTaskRepository, ProjectTaskStore, TaskRepository, TaskStore,
};

/// The persistence collaborators every service is built from.
#[derive(Clone)]
pub struct Stores {
	pub members: Arc<dyn MemberStore>,
	pub directory: Arc<dyn DirectoryUserStore>,
	pub groups: Arc<dyn GroupStore>,
	pub project_tasks: Arc<dyn ProjectTaskStore>,
	pub tasks: Arc<dyn TaskStore>,
}

impl Stores {
	/// SQLite-backed stores sharing one pool.
	pub fn sqlite(pool: SqlitePool) -> Self {
		Self {
			members: Arc::new(MemberRepository::new(pool.clone())),
			directory: Arc::new(DirectoryUserRepository::new(pool.clone())),
			groups: Arc::new(GroupRepository::new(pool.clone())),
			project_tasks: Arc::new(ProjectTaskRepository::new(pool.clone())),
			tasks: Arc::new(TaskRepository::new(pool)),
		}
	}
}
