// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # workboard-db
//!
//! Persistence layer for Workboard using SQLite via sqlx.
//!
//! ## Repository Pattern
//!
//! Each domain has two components:
//! - **`*Store` trait**: the interface the membership services depend on
//!   (e.g., `MemberStore`, `GroupStore`)
//! - **`*Repository` struct**: concrete implementation holding a `SqlitePool`
//!
//! The trait impls delegate to inherent methods, so callers holding a concrete
//! repository never need the trait in scope.
//!
//! ## Error Handling
//!
//! | Variant | When it is returned |
//! |---------|---------------------|
//! | `NotFound` | Update of a row that does not exist |
//! | `Conflict` | Unique email or project code taken, stale group version |
//! | `Sqlx` | Unexpected database errors, propagated via `?` |
//! | `Internal` | Unparseable stored data (bad UUID, bad timestamp) |
//! | `Serialization` | Corrupt JSON member or subgroup lists |
//!
//! Lookups by id or email return `Result<Option<T>>`; deletes return
//! `Result<bool>`.
//!
//! ## Testing
//!
//! With the `test-support` feature (always on for this crate's own tests),
//! [`testing::create_test_pool`] returns an in-memory pool with every
//! migration applied.

pub mod directory;
pub mod error;
pub mod group;
pub mod member;
pub mod pool;
pub mod project_task;
mod row;
pub mod task;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use directory::{DirectoryUserRepository, DirectoryUserStore};
pub use error::{DbError, Result};
pub use group::{GroupRepository, GroupStore};
pub use member::{MemberRepository, MemberStore};
pub use pool::{create_pool, run_migrations};
pub use project_task::{ProjectTaskRepository, ProjectTaskStore};
pub use task::{TaskRepository, TaskStore};
