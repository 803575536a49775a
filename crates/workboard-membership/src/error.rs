// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use workboard_db::DbError;

/// Stable classification of a [`MembershipError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	NotFound,
	Forbidden,
	ActorNotFound,
	Conflict,
	InvalidRequest,
	Store,
}

impl ErrorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorKind::NotFound => "not_found",
			ErrorKind::Forbidden => "forbidden",
			ErrorKind::ActorNotFound => "actor_not_found",
			ErrorKind::Conflict => "conflict",
			ErrorKind::InvalidRequest => "invalid_request",
			ErrorKind::Store => "store",
		}
	}
}

impl std::fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
	#[error("not found: {0}")]
	NotFound(String),

	#[error("forbidden: {0}")]
	Forbidden(String),

	#[error("actor could not be resolved: {0}")]
	ActorNotFound(String),

	#[error("conflict: {0}")]
	Conflict(String),

	#[error("invalid request: {0}")]
	InvalidRequest(String),

	#[error("store error: {0}")]
	Store(#[source] DbError),
}

impl MembershipError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			MembershipError::NotFound(_) => ErrorKind::NotFound,
			MembershipError::Forbidden(_) => ErrorKind::Forbidden,
			MembershipError::ActorNotFound(_) => ErrorKind::ActorNotFound,
			MembershipError::Conflict(_) => ErrorKind::Conflict,
			MembershipError::InvalidRequest(_) => ErrorKind::InvalidRequest,
			MembershipError::Store(_) => ErrorKind::Store,
		}
	}
}

/// Constraint failures keep their meaning; everything else is a store failure.
impl From<DbError> for MembershipError {
	fn from(err: DbError) -> Self {
		match err {
			DbError::NotFound(msg) => MembershipError::NotFound(msg),
			DbError::Conflict(msg) => MembershipError::Conflict(msg),
			other => MembershipError::Store(other),
		}
	}
}

pub type Result<T> = std::result::Result<T, MembershipError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn db_constraint_errors_keep_their_kind() {
		let conflict: MembershipError = DbError::Conflict("email taken".to_string()).into();
		assert_eq!(conflict.kind(), ErrorKind::Conflict);

		let missing: MembershipError = DbError::NotFound("group".to_string()).into();
		assert_eq!(missing.kind(), ErrorKind::NotFound);
	}

	#[test]
	fn other_db_errors_are_store_failures() {
		let err: MembershipError = DbError::Internal("bad uuid".to_string()).into();
		assert_eq!(err.kind(), ErrorKind::Store);
		assert!(std::error::Error::source(&err).is_some());
	}

	#[test]
	fn kinds_have_stable_names() {
		assert_eq!(ErrorKind::ActorNotFound.to_string(), "actor_not_found");
		assert_eq!(
			MembershipError::Forbidden("x".to_string()).kind().as_str(),
			"forbidden"
		);
	}
}
