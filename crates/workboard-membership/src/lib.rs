// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity reconciliation and workgroup membership for Workboard.
//!
//! Raw member references arrive from clients as either canonical member ids
//! or directory user ids. The flow for every membership mutation is:
//! - [`IdentityResolver`] turns each reference into a [`workboard_core::MemberId`],
//!   promoting directory users on demand
//! - [`GroupMembershipService`] persists the resolved list
//! - [`ViewBuilder`] expands the stored ids back into member records,
//!   annotated for the requester
//!
//! [`MemberDirectory`] and [`ProjectTaskService`] cover direct member
//! management and the project tasks attached to workspaces. [`TaskService`]
//! handles personal tasks and [`DashboardService`] the cross-store totals.

mod dashboard;
mod directory;
mod error;
mod group_write;
mod project_task;
mod resolver;
mod service;
mod stores;
mod task;
mod view;

pub use dashboard::{DashboardService, DashboardStats, MemberWorkload, StatusCount};
pub use directory::{DirectoryEntry, EntrySource, MemberDirectory, MemberUpdate};
pub use error::{ErrorKind, MembershipError, Result};
pub use project_task::ProjectTaskService;
pub use resolver::{Actor, BatchResolution, IdentityResolver, RefOutcome, Resolution};
pub use service::{
	CreateGroupRequest, CreateSubgroupRequest, GroupMembershipService, UpdateSubgroupRequest,
};
pub use stores::Stores;
pub use task::TaskService;
pub use view::{GroupView, MemberEntry, SubgroupView, ViewBuilder};
