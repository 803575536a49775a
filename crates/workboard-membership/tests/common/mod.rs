// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use workboard_core::{Caller, DirectoryUser, Member, MemberId, NewMember, Role};
use workboard_db::testing::create_test_pool;
use workboard_db::{DbError, DirectoryUserRepository, MemberRepository, MemberStore};
use workboard_membership::Stores;

/// Member store that counts inserts.
pub struct CountingMembers {
	inner: MemberRepository,
	pub creates: AtomicUsize,
}

impl CountingMembers {
	pub fn creates(&self) -> usize {
		self.creates.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl MemberStore for CountingMembers {
	async fn create_member(&self, member: &Member) -> Result<(), DbError> {
		self.creates.fetch_add(1, Ordering::SeqCst);
		self.inner.create_member(member).await
	}

	async fn get_member_by_id(&self, id: &MemberId) -> Result<Option<Member>, DbError> {
		self.inner.get_member_by_id(id).await
	}

	async fn get_member_by_email(&self, email: &str) -> Result<Option<Member>, DbError> {
		self.inner.get_member_by_email(email).await
	}

	async fn get_members_by_ids(&self, ids: &[MemberId]) -> Result<Vec<Member>, DbError> {
		self.inner.get_members_by_ids(ids).await
	}

	async fn list_members(&self) -> Result<Vec<Member>, DbError> {
		self.inner.list_members().await
	}

	async fn update_member(&self, member: &Member) -> Result<(), DbError> {
		self.inner.update_member(member).await
	}

	async fn delete_member(&self, id: &MemberId) -> Result<bool, DbError> {
		self.inner.delete_member(id).await
	}
}

pub struct World {
	pub pool: SqlitePool,
	pub stores: Stores,
	pub members: Arc<CountingMembers>,
	pub directory: DirectoryUserRepository,
}

impl World {
	pub async fn new() -> Self {
		let pool = create_test_pool().await;
		let members = Arc::new(CountingMembers {
			inner: MemberRepository::new(pool.clone()),
			creates: AtomicUsize::new(0),
		});
		let mut stores = Stores::sqlite(pool.clone());
		stores.members = members.clone();

		Self {
			directory: DirectoryUserRepository::new(pool.clone()),
			pool,
			stores,
			members,
		}
	}

	/// Insert a member directly, bypassing the insert counter.
	pub async fn member(&self, name: &str, role: Role) -> (Member, Caller) {
		let member = Member::new(NewMember {
			name: name.to_string(),
			email: format!("{}@example.com", name.to_lowercase()),
			role: Some(role.clone()),
			..Default::default()
		});
		self.members.inner.create_member(&member).await.unwrap();
		let caller = Caller::new(member.id.to_string(), &member.email, role);
		(member, caller)
	}

	pub async fn directory_user(&self, name: &str, email: &str) -> DirectoryUser {
		let user = DirectoryUser::new(name, email, None);
		self.directory.create_directory_user(&user).await.unwrap();
		user
	}
}
