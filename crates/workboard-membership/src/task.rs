// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use workboard_core::{Caller, MemberId, NewTask, Task, TaskId, TaskPatch};
use workboard_db::TaskStore;

use crate::error::{MembershipError, Result};
use crate::resolver::{Actor, IdentityResolver, Resolution};
use crate::stores::Stores;

/// Personal tasks.
///
/// Admins see and manage every task. Anyone else sees the tasks they created
/// or are assigned to, may edit those, and may delete only their own.
#[derive(Clone)]
pub struct TaskService {
	resolver: IdentityResolver,
	tasks: Arc<dyn TaskStore>,
}

impl TaskService {
	pub fn new(stores: &Stores) -> Self {
		Self {
			resolver: IdentityResolver::new(stores),
			tasks: stores.tasks.clone(),
		}
	}

	async fn load_task(&self, task_id: &TaskId) -> Result<Task> {
		self
			.tasks
			.get_task_by_id(task_id)
			.await?
			.ok_or_else(|| MembershipError::NotFound(format!("task {task_id}")))
	}

	/// The assignee goes through the resolver like any member reference, so a
	/// directory user is promoted on assignment.
	async fn resolve_assignee(&self, raw_ref: &str) -> Result<MemberId> {
		match self.resolver.resolve(raw_ref).await? {
			Resolution::Resolved { member_id, .. } => Ok(member_id),
			Resolution::Unresolved => Err(MembershipError::InvalidRequest(format!(
				"assignee {raw_ref} is neither a member nor a directory user"
			))),
		}
	}

	fn forbid(actor: &Actor, action: &str, task_id: &TaskId) -> MembershipError {
		tracing::warn!(member_id = %actor.id(), task_id = %task_id, action, "forbidden");
		MembershipError::Forbidden(format!("{action} on task {task_id}"))
	}

	/// Create a task owned by the caller.
	///
	/// # Errors
	/// `InvalidRequest` for a blank name or an assignee that does not resolve.
	#[tracing::instrument(skip(self, input, caller), fields(actor_ref = %caller.actor_ref))]
	pub async fn create_task(&self, input: NewTask, assignee_ref: &str, caller: &Caller) -> Result<Task> {
		if input.name.trim().is_empty() {
			return Err(MembershipError::InvalidRequest("task name must not be empty".to_string()));
		}
		if assignee_ref.trim().is_empty() {
			return Err(MembershipError::InvalidRequest("task assignee must not be empty".to_string()));
		}
		let actor = self.resolver.resolve_actor(caller).await?;
		let assigned_to = self.resolve_assignee(assignee_ref).await?;

		let task = Task::new(input, assigned_to, actor.id());
		self.tasks.create_task(&task).await?;
		tracing::info!(task_id = %task.id, assigned_to = %assigned_to, "task created");
		Ok(task)
	}

	/// Every task for admins; otherwise those the caller created or is
	/// assigned to. Newest first.
	#[tracing::instrument(skip(self, caller), fields(actor_ref = %caller.actor_ref))]
	pub async fn list_tasks(&self, caller: &Caller) -> Result<Vec<Task>> {
		let actor = self.resolver.resolve_actor(caller).await?;
		let involving = (!actor.is_admin).then(|| actor.id());
		Ok(self.tasks.list_tasks(involving.as_ref()).await?)
	}

	/// Partial update by an admin, the creator, or the assignee.
	/// `assignee_ref`, when given, reassigns the task.
	#[tracing::instrument(skip(self, patch, caller), fields(task_id = %task_id))]
	pub async fn update_task(
		&self,
		task_id: &TaskId,
		mut patch: TaskPatch,
		assignee_ref: Option<&str>,
		caller: &Caller,
	) -> Result<Task> {
		if matches!(&patch.name, Some(name) if name.trim().is_empty()) {
			return Err(MembershipError::InvalidRequest("task name must not be empty".to_string()));
		}
		let mut task = self.load_task(task_id).await?;
		let actor = self.resolver.resolve_actor(caller).await?;
		if !actor.is_admin && !task.involves(&actor.id()) {
			return Err(Self::forbid(&actor, "update", task_id));
		}

		if let Some(raw_ref) = assignee_ref.filter(|r| !r.trim().is_empty()) {
			patch.assigned_to = Some(self.resolve_assignee(raw_ref).await?);
		}
		task.apply(patch);
		self.tasks.update_task(&task).await?;
		tracing::info!(task_id = %task.id, "task updated");
		Ok(task)
	}

	/// Delete by an admin or the creator.
	#[tracing::instrument(skip(self, caller), fields(task_id = %task_id))]
	pub async fn delete_task(&self, task_id: &TaskId, caller: &Caller) -> Result<()> {
		let task = self.load_task(task_id).await?;
		let actor = self.resolver.resolve_actor(caller).await?;
		if !actor.is_admin && !task.is_creator(&actor.id()) {
			return Err(Self::forbid(&actor, "delete", task_id));
		}

		if !self.tasks.delete_task(task_id).await? {
			return Err(MembershipError::NotFound(format!("task {task_id}")));
		}
		tracing::info!(task_id = %task_id, "task deleted");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use workboard_core::{DirectoryUser, Member, NewMember, Role};
	use workboard_db::testing::create_test_pool;
	use workboard_db::{DirectoryUserRepository, MemberRepository};

	struct Fixture {
		service: TaskService,
		members: MemberRepository,
		directory: DirectoryUserRepository,
		ada: (Member, Caller),
		bob: (Member, Caller),
		eve: (Member, Caller),
		root: Caller,
	}

	async fn member(repo: &MemberRepository, name: &str, role: Role) -> (Member, Caller) {
		let member = Member::new(NewMember {
			name: name.to_string(),
			email: format!("{name}@example.com"),
			role: Some(role.clone()),
			..Default::default()
		});
		repo.create_member(&member).await.unwrap();
		let caller = Caller::new(member.id.to_string(), &member.email, role);
		(member, caller)
	}

	async fn fixture() -> Fixture {
		let pool = create_test_pool().await;
		let members = MemberRepository::new(pool.clone());
		let ada = member(&members, "ada", Role::member()).await;
		let bob = member(&members, "bob", Role::member()).await;
		let eve = member(&members, "eve", Role::member()).await;
		let (_, root) = member(&members, "root", Role::admin()).await;

		Fixture {
			service: TaskService::new(&Stores::sqlite(pool.clone())),
			directory: DirectoryUserRepository::new(pool),
			members,
			ada,
			bob,
			eve,
			root,
		}
	}

	fn named(name: &str) -> NewTask {
		NewTask {
			name: name.to_string(),
			..Default::default()
		}
	}

	mod create {
		use super::*;

		#[tokio::test]
		async fn records_creator_and_assignee() {
			let f = fixture().await;
			let task = f
				.service
				.create_task(named("Report"), &f.bob.0.id.to_string(), &f.ada.1)
				.await
				.unwrap();

			assert_eq!(task.created_by, f.ada.0.id);
			assert_eq!(task.assigned_to, f.bob.0.id);
			assert_eq!(task.status, "Not Started");
		}

		#[tokio::test]
		async fn directory_user_assignee_is_promoted() {
			let f = fixture().await;
			let grace = DirectoryUser::new("Grace", "grace@example.com", None);
			f.directory.create_directory_user(&grace).await.unwrap();

			let task = f
				.service
				.create_task(named("Review"), &grace.id.to_string(), &f.ada.1)
				.await
				.unwrap();

			let assignee = f.members.get_member_by_email("grace@example.com").await.unwrap().unwrap();
			assert_eq!(task.assigned_to, assignee.id);
		}

		#[tokio::test]
		async fn rejects_blank_name_and_unknown_assignee() {
			let f = fixture().await;
			let blank = f.service.create_task(named(" "), &f.bob.0.id.to_string(), &f.ada.1).await;
			assert!(matches!(blank, Err(MembershipError::InvalidRequest(_))));

			let nobody = f
				.service
				.create_task(named("Report"), &MemberId::generate().to_string(), &f.ada.1)
				.await;
			assert!(matches!(nobody, Err(MembershipError::InvalidRequest(_))));

			let missing = f.service.create_task(named("Report"), "", &f.ada.1).await;
			assert!(matches!(missing, Err(MembershipError::InvalidRequest(_))));
		}
	}

	#[tokio::test]
	async fn listing_follows_involvement_unless_admin() {
		let f = fixture().await;
		let for_bob = f
			.service
			.create_task(named("For Bob"), &f.bob.0.id.to_string(), &f.ada.1)
			.await
			.unwrap();
		f.service
			.create_task(named("Eve's own"), &f.eve.0.id.to_string(), &f.eve.1)
			.await
			.unwrap();

		let ids = |tasks: Vec<Task>| tasks.into_iter().map(|t| t.id).collect::<Vec<_>>();
		assert_eq!(ids(f.service.list_tasks(&f.ada.1).await.unwrap()), vec![for_bob.id]);
		assert_eq!(ids(f.service.list_tasks(&f.bob.1).await.unwrap()), vec![for_bob.id]);
		assert_eq!(f.service.list_tasks(&f.root).await.unwrap().len(), 2);
	}

	mod permissions {
		use super::*;

		#[tokio::test]
		async fn assignee_may_edit_but_not_delete() {
			let f = fixture().await;
			let task = f
				.service
				.create_task(named("Report"), &f.bob.0.id.to_string(), &f.ada.1)
				.await
				.unwrap();

			let updated = f
				.service
				.update_task(
					&task.id,
					TaskPatch {
						status: Some("In Progress".to_string()),
						actual_time: Some("1:15".to_string()),
						..Default::default()
					},
					None,
					&f.bob.1,
				)
				.await
				.unwrap();
			assert_eq!(updated.status, "In Progress");
			assert_eq!(updated.actual_time.minutes(), 75);

			let err = f.service.delete_task(&task.id, &f.bob.1).await.unwrap_err();
			assert_eq!(err.kind(), crate::error::ErrorKind::Forbidden);
			f.service.delete_task(&task.id, &f.ada.1).await.unwrap();
		}

		#[tokio::test]
		async fn outsider_is_forbidden_and_admin_is_not() {
			let f = fixture().await;
			let task = f
				.service
				.create_task(named("Report"), &f.bob.0.id.to_string(), &f.ada.1)
				.await
				.unwrap();

			let edit = f
				.service
				.update_task(&task.id, TaskPatch::default(), None, &f.eve.1)
				.await;
			assert!(matches!(edit, Err(MembershipError::Forbidden(_))));
			let delete = f.service.delete_task(&task.id, &f.eve.1).await;
			assert!(matches!(delete, Err(MembershipError::Forbidden(_))));

			let reassigned = f
				.service
				.update_task(
					&task.id,
					TaskPatch::default(),
					Some(&f.eve.0.id.to_string()),
					&f.root,
				)
				.await
				.unwrap();
			assert_eq!(reassigned.assigned_to, f.eve.0.id);
			f.service.delete_task(&task.id, &f.root).await.unwrap();
		}

		#[tokio::test]
		async fn unknown_task_is_not_found_before_actor_check() {
			let f = fixture().await;
			let stranger = Caller::new(MemberId::generate().to_string(), "", Role::member());
			let err = f.service.delete_task(&TaskId::generate(), &stranger).await.unwrap_err();
			assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
		}
	}
}
