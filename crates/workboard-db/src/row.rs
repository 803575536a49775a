// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Column conversions shared by the repositories.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn parse_id<T: From<Uuid>>(value: &str, what: &str) -> Result<T, DbError> {
	Uuid::parse_str(value)
		.map(T::from)
		.map_err(|e| DbError::Internal(format!("Invalid {what}: {e}")))
}

pub(crate) fn parse_timestamp(value: &str, what: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {what}: {e}")))
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn parse_date(value: Option<&str>, what: &str) -> Result<Option<NaiveDate>, DbError> {
	value
		.map(|v| {
			NaiveDate::parse_from_str(v, DATE_FORMAT)
				.map_err(|e| DbError::Internal(format!("Invalid {what}: {e}")))
		})
		.transpose()
}

pub(crate) fn format_date(date: Option<&NaiveDate>) -> Option<String> {
	date.map(|d| d.format(DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use workboard_core::MemberId;

	#[test]
	fn timestamp_survives_storage_format() {
		let now = Utc::now();
		let parsed = parse_timestamp(&format_timestamp(&now), "ts").unwrap();
		assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
	}

	#[test]
	fn dates_store_as_iso_days() {
		let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
		let stored = format_date(Some(&day));
		assert_eq!(stored.as_deref(), Some("2025-03-09"));
		assert_eq!(parse_date(stored.as_deref(), "day").unwrap(), Some(day));
		assert_eq!(parse_date(None, "day").unwrap(), None);
		assert!(matches!(parse_date(Some("09/03/2025"), "day"), Err(DbError::Internal(_))));
	}

	#[test]
	fn invalid_id_is_internal_error() {
		let result: Result<MemberId, _> = parse_id("garbage", "member ID");
		assert!(matches!(result, Err(DbError::Internal(msg)) if msg.contains("member ID")));
	}
}
