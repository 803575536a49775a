// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use workboard_core::{Group, GroupId};
use workboard_db::{DbError, GroupStore};

use crate::error::{MembershipError, Result};

/// Attempts at a group read-modify-write before a version conflict is
/// returned to the caller.
pub(crate) const MAX_WRITE_ATTEMPTS: usize = 3;

pub(crate) async fn load_group(groups: &dyn GroupStore, group_id: &GroupId) -> Result<Group> {
	groups
		.get_group_by_id(group_id)
		.await?
		.ok_or_else(|| MembershipError::NotFound(format!("group {group_id}")))
}

/// Re-read, mutate, and compare-and-swap a group, retrying on a stale
/// version. `apply` runs against the fresh copy each attempt.
pub(crate) async fn write_group<F>(
	groups: &dyn GroupStore,
	group_id: &GroupId,
	mut apply: F,
) -> Result<Group>
where
	F: FnMut(&mut Group) -> Result<()>,
{
	let mut attempt = 0;
	loop {
		attempt += 1;
		let mut group = load_group(groups, group_id).await?;
		apply(&mut group)?;
		match groups.update_group(&group).await {
			Ok(version) => {
				group.version = version;
				return Ok(group);
			}
			Err(DbError::Conflict(msg)) if attempt < MAX_WRITE_ATTEMPTS => {
				tracing::debug!(group_id = %group_id, attempt, error = %msg, "retrying group write");
			}
			Err(e) => return Err(e.into()),
		}
	}
}
