//! Bulletin posts pushed to the Portal's community bulletin board.
//!
//! Staff submit a bulletin with a poster image path; [`BulletinSync`]
//! validates it, makes the poster URL absolute, and posts it to the
//! Portal. A Portal that answers with an error status does not fail the
//! request: the response reports `portalSynced: false` with the Portal's
//! error text.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_aux::prelude::deserialize_default_from_null;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::client::{HttpPortalClient, PortalApi, PortalApiError};
use crate::config::PortalConfig;

/// Bulletin fields submitted for syncing. Every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulletinSyncRequest {
    #[serde(
        rename = "sourceId",
        default,
        deserialize_with = "deserialize_default_from_null"
    )]
    pub source_id: String,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub subject: String,
    /// Absolute URL, or a path on the Portal host such as `/bulletinboard/x.jpg`
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub poster_url: String,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub category: String,
}

impl BulletinSyncRequest {
    /// Wire names of the required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("sourceId", &self.source_id),
            ("title", &self.title),
            ("subject", &self.subject),
            ("poster_url", &self.poster_url),
            ("category", &self.category),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Body of `POST /bulletin` on the Portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalBulletin {
    #[serde(rename = "sourceId")]
    pub source_id: String,
    pub title: String,
    pub subject: String,
    pub poster_url: String,
    pub category: String,
    /// RFC 3339 time of the sync, in UTC with milliseconds.
    pub created: String,
}

/// Outcome of a bulletin sync that reached the Portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulletinSyncResponse {
    pub success: bool,
    /// The Portal accepted the bulletin
    pub portal_synced: bool,
    /// Portal error text when `portalSynced` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Portal response body, or the submitted `sourceId` and resolved `poster_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum BulletinSyncError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Portal API not configured")]
    NotConfigured,

    #[error("Invalid poster URL: {0}")]
    InvalidPosterUrl(String),

    #[error(transparent)]
    Portal(#[from] PortalApiError),
}

pub struct BulletinSync {
    api: Option<Arc<dyn PortalApi>>,
    poster_base_url: String,
}

impl BulletinSync {
    #[must_use]
    pub fn from_config(config: &PortalConfig) -> Self {
        if config.is_configured() {
            Self::with_api(
                Arc::new(HttpPortalClient::new(
                    config.normalized_base_url(),
                    config.api_key.trim(),
                )),
                config.poster_base_url(),
            )
        } else {
            Self::unconfigured()
        }
    }

    /// Sync through any `PortalApi`, resolving relative poster paths
    /// against `poster_base_url`.
    #[must_use]
    pub fn with_api(api: Arc<dyn PortalApi>, poster_base_url: impl Into<String>) -> Self {
        Self {
            api: Some(api),
            poster_base_url: poster_base_url.into(),
        }
    }

    #[must_use]
    pub const fn unconfigured() -> Self {
        Self {
            api: None,
            poster_base_url: String::new(),
        }
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api.is_some()
    }

    /// Validate a bulletin and post it to the Portal.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields` or `InvalidPosterUrl` for a bad request,
    /// `NotConfigured` without Portal settings, and `Portal` when the
    /// Portal could not be reached or answered 2xx with a body that is
    /// not JSON. An error status from the Portal is a partial success,
    /// not an error.
    pub async fn sync(
        &self,
        request: &BulletinSyncRequest,
    ) -> Result<BulletinSyncResponse, BulletinSyncError> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(BulletinSyncError::MissingFields(missing));
        }

        let Some(api) = &self.api else {
            return Err(BulletinSyncError::NotConfigured);
        };

        let bulletin = PortalBulletin {
            source_id: request.source_id.trim().to_string(),
            title: request.title.clone(),
            subject: request.subject.clone(),
            poster_url: resolve_poster_url(&self.poster_base_url, &request.poster_url)?,
            category: request.category.clone(),
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        info!(
            source_id = %bulletin.source_id,
            poster_url = %bulletin.poster_url,
            "syncing bulletin to Portal"
        );

        match api.sync_bulletin(&bulletin).await {
            Ok(data) => Ok(BulletinSyncResponse {
                success: true,
                portal_synced: true,
                portal_error: None,
                message: None,
                data: Some(data),
            }),
            Err(PortalApiError::ApiError { status, message }) => {
                warn!(
                    status,
                    source_id = %bulletin.source_id,
                    error = %message,
                    "Portal rejected bulletin"
                );
                Ok(BulletinSyncResponse {
                    success: true,
                    portal_synced: false,
                    portal_error: Some(message),
                    message: Some("Bulletin accepted but portal sync failed".to_string()),
                    data: Some(json!({
                        "sourceId": bulletin.source_id,
                        "poster_url": bulletin.poster_url,
                    })),
                })
            }
            Err(err) => {
                error!(source_id = %bulletin.source_id, error = %err, "bulletin sync failed");
                Err(err.into())
            }
        }
    }
}

/// Make a poster URL absolute. `http(s)://` URLs pass through; anything
/// else is joined onto `base` with URL reference rules, so `/x.jpg`
/// lands at the root of `base`'s host.
///
/// # Errors
///
/// Returns `InvalidPosterUrl` when `base` is not an absolute URL or the
/// join fails.
pub fn resolve_poster_url(base: &str, poster_url: &str) -> Result<String, BulletinSyncError> {
    let poster_url = poster_url.trim();
    if poster_url.starts_with("http://") || poster_url.starts_with("https://") {
        return Ok(poster_url.to_string());
    }

    Url::parse(base)
        .and_then(|base| base.join(poster_url))
        .map(|url| url.to_string())
        .map_err(|err| BulletinSyncError::InvalidPosterUrl(format!("{poster_url}: {err}")))
}
