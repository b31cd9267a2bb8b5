//! Build metadata for the directory service.
//!
//! Deploy pipelines stamp the image with `TCN_BUILD_VERSION`,
//! `TCN_GIT_SHA` and `TCN_BUILD_TIME`; the unprefixed `APP_VERSION`,
//! `GIT_SHA` and `BUILD_TIME` are read when the prefixed ones are unset.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::env;
use utoipa::ToSchema;

const UNKNOWN: &str = "unknown";

/// Build metadata served at `/api/v1/build-info` and logged at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// Crate name of the running binary
    pub service: String,
    pub version: String,
    pub git_sha: String,
    /// RFC 3339 in UTC, or "unknown"
    pub build_time: String,
}

impl BuildInfo {
    /// First seven characters of the commit, for log lines.
    #[must_use]
    pub fn short_sha(&self) -> &str {
        self.git_sha
            .char_indices()
            .nth(7)
            .map_or(self.git_sha.as_str(), |(end, _)| &self.git_sha[..end])
    }
}

#[derive(Clone, Debug)]
pub struct BuildInfoProvider {
    info: BuildInfo,
}

impl BuildInfoProvider {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve metadata through `lookup` instead of the process environment.
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut first = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(key).filter(|value| !value.trim().is_empty()))
        };

        let version = first(&["TCN_BUILD_VERSION", "APP_VERSION"])
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
        let git_sha = first(&["TCN_GIT_SHA", "GIT_SHA"]).unwrap_or_else(|| UNKNOWN.to_string());
        let build_time = first(&["TCN_BUILD_TIME", "BUILD_TIME"])
            .and_then(|value| normalize_build_time(&value))
            .unwrap_or_else(|| UNKNOWN.to_string());

        Self {
            info: BuildInfo {
                service: env!("CARGO_PKG_NAME").to_string(),
                version,
                git_sha,
                build_time,
            },
        }
    }

    #[must_use]
    pub fn build_info(&self) -> BuildInfo {
        self.info.clone()
    }
}

/// Accept RFC 3339, or a zone-less timestamp taken as UTC.
fn normalize_build_time(value: &str) -> Option<String> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc3339(&format!("{value}Z")))
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .ok()
}
