//! API utility functions
//!
//! Pure helpers shared by the handlers, kept here so they can be unit tested
//! without a router.

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use crate::api::error::ApiError;

/// Current UTC time as an RFC 3339 string with microsecond precision
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a path segment as a job id
///
/// Anything that is not a UUID cannot name a job, so it is reported the same
/// way as a job that does not exist.
pub fn parse_job_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::JobNotFound)
}
