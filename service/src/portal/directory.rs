//! Member directory with fallback to the built-in sample dataset.
//!
//! [`MemberDirectory`] wraps a [`PortalApi`] so that a missing
//! configuration, an upstream error or a transport failure never reaches
//! the caller. What happens on failure is decided per operation by
//! [`DirectoryOperation::failure_policy`]:
//!
//! - [`FailurePolicy::MockData`]: serve the sample dataset, filtered the
//!   way the query would have been, tagged `meta.fallback = "mock_data"`.
//! - [`FailurePolicy::HardFail`]: return `success: false` with an error
//!   message. Used by the community listing and the bulk exports, which
//!   feed SMS/email campaigns and must never target sample contacts.
//!
//! An unconfigured directory serves sample data for every operation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::cache::{CacheKey, CachedResponse, ResponseCache};
use super::client::{HttpPortalClient, PortalApi, PortalApiError};
use super::fallback;
use super::recipients::RecipientSelection;
use super::types::{
    ApiResponse, ContactField, Member, MemberQuery, PortalContactsData, ResponseMeta,
};
use crate::config::PortalConfig;

/// Default page size for free-text search.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;
/// Default page size for bulk contact exports.
pub const DEFAULT_EXPORT_LIMIT: u32 = 500;
/// Page size reported for live listings when the caller gave none.
pub const DEFAULT_LIST_LIMIT: u32 = 100;
/// Page size reported for sample-data listings when the caller gave none.
pub const FALLBACK_LIST_LIMIT: u32 = 50;

/// What an operation does when the Portal cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    MockData,
    HardFail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryOperation {
    Search,
    List,
    Lookup,
    Community,
    Emails,
    Phones,
}

impl DirectoryOperation {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::List => "list",
            Self::Lookup => "lookup",
            Self::Community => "community",
            Self::Emails => "emails",
            Self::Phones => "phones",
        }
    }

    #[must_use]
    pub const fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::Search | Self::List | Self::Lookup => FailurePolicy::MockData,
            Self::Community | Self::Emails | Self::Phones => FailurePolicy::HardFail,
        }
    }

    /// Error message returned under [`FailurePolicy::HardFail`].
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::Emails => "Failed to fetch emails",
            Self::Phones => "Failed to fetch phone numbers",
            _ => "Failed to fetch members",
        }
    }

    const fn export(field: ContactField) -> Self {
        match field {
            ContactField::Email => Self::Emails,
            ContactField::Phone => Self::Phones,
        }
    }
}

pub struct MemberDirectory {
    api: Option<Arc<dyn PortalApi>>,
    cache: Option<ResponseCache>,
}

impl MemberDirectory {
    /// Build a directory from explicit Portal settings.
    ///
    /// A blank base URL or API key yields an unconfigured directory; no
    /// process environment is consulted here.
    #[must_use]
    pub fn from_config(config: &PortalConfig) -> Self {
        let directory = if config.is_configured() {
            Self::with_api(Arc::new(HttpPortalClient::new(
                config.normalized_base_url(),
                config.api_key.trim(),
            )))
        } else {
            info!("Portal URL or API key not configured; serving sample member data");
            Self::unconfigured()
        };

        if config.cache.enabled {
            directory.with_cache(
                Duration::from_secs(config.cache.ttl_secs),
                config.cache.max_entries,
            )
        } else {
            directory
        }
    }

    /// Build a directory over any `PortalApi` implementation.
    #[must_use]
    pub fn with_api(api: Arc<dyn PortalApi>) -> Self {
        Self {
            api: Some(api),
            cache: None,
        }
    }

    /// A directory that only ever serves sample data.
    #[must_use]
    pub const fn unconfigured() -> Self {
        Self {
            api: None,
            cache: None,
        }
    }

    /// Cache live responses for `ttl`, holding at most `max_entries`.
    #[must_use]
    pub fn with_cache(mut self, ttl: Duration, max_entries: usize) -> Self {
        self.cache = Some(ResponseCache::new(ttl, max_entries));
        self
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api.is_some()
    }

    /// Check that the Portal is reachable.
    ///
    /// An unconfigured directory reports `true`, since it still works on
    /// sample data.
    pub async fn test_connection(&self) -> bool {
        let Some(api) = &self.api else {
            info!("Portal not configured; sample data mode is always available");
            return true;
        };

        match api.ping().await {
            Ok(reachable) => reachable,
            Err(err) => {
                error!(error = %err, "Portal connection test failed");
                false
            }
        }
    }

    /// Search members by name or T-number.
    ///
    /// The term is forwarded as-is; callers enforce any minimum length.
    pub async fn search_members(&self, term: &str, limit: u32) -> ApiResponse<Vec<Member>> {
        let op = DirectoryOperation::Search;
        let sample = || sample_response(fallback::search(term));

        let Some(api) = &self.api else {
            return sample();
        };

        let key = CacheKey::new(op.name(), &[term, &limit.to_string()]);
        if let Some(hit) = self.cached_members(&key) {
            return hit;
        }

        match api.search_contacts(term, limit).await {
            Ok(data) => {
                let meta = ResponseMeta {
                    total: Some(data.count),
                    limit: Some(data.pagination.limit),
                    ..ResponseMeta::default()
                };
                let response = ApiResponse::ok(normalize(data)).with_meta(meta);
                self.remember(key, CachedResponse::Members(response.clone()));
                response
            }
            Err(err) => degrade(op, &err, sample),
        }
    }

    /// Paged member listing with optional community and search filters.
    pub async fn get_members(&self, query: &MemberQuery) -> ApiResponse<Vec<Member>> {
        let op = DirectoryOperation::List;
        let page = query.page_or_first();
        let limit = query.requested_limit();
        let sample = || {
            let members = fallback::filter(|m| {
                query
                    .search
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .map_or(true, |s| fallback::matches_search(m, s))
                    && query
                        .community
                        .as_deref()
                        .filter(|c| !c.is_empty())
                        .map_or(true, |c| fallback::matches_community(m, c))
            });
            let meta = ResponseMeta {
                total: Some(members.len() as u64),
                page: Some(page),
                limit: Some(limit.unwrap_or(FALLBACK_LIST_LIMIT)),
                ..ResponseMeta::mock_data()
            };
            ApiResponse::ok(members).with_meta(meta)
        };

        let Some(api) = &self.api else {
            return sample();
        };

        let key = CacheKey::new(
            op.name(),
            &[
                &page.to_string(),
                &limit.map(|l| l.to_string()).unwrap_or_default(),
                query.community.as_deref().unwrap_or_default(),
                query.search.as_deref().unwrap_or_default(),
                if query.include_deceased { "deceased" } else { "" },
            ],
        );
        if let Some(hit) = self.cached_members(&key) {
            return hit;
        }

        match api.list_contacts(query).await {
            Ok(data) => {
                let meta = ResponseMeta {
                    total: Some(data.count),
                    page: Some(page),
                    limit: Some(limit.unwrap_or(DEFAULT_LIST_LIMIT)),
                    fallback: None,
                };
                let response = ApiResponse::ok(normalize(data)).with_meta(meta);
                self.remember(key, CachedResponse::Members(response.clone()));
                response
            }
            Err(err) => degrade(op, &err, sample),
        }
    }

    /// Look up one member by exact T-number.
    ///
    /// "Not found" is a successful empty result, both from the Portal (404)
    /// and from the sample dataset.
    pub async fn get_member_by_t_number(&self, t_number: &str) -> ApiResponse<Option<Member>> {
        let op = DirectoryOperation::Lookup;
        let sample = || {
            ApiResponse::ok(fallback::by_t_number(t_number)).with_meta(ResponseMeta::mock_data())
        };

        let Some(api) = &self.api else {
            return sample();
        };

        let key = CacheKey::exact(op.name(), &[t_number]);
        if let Some(CachedResponse::Member(hit)) = self.cache_get(&key) {
            return hit;
        }

        match api.get_contact(t_number).await {
            Ok(contact) => {
                let response = ApiResponse::ok(contact.map(Member::from));
                self.remember(key, CachedResponse::Member(response.clone()));
                response
            }
            Err(err) => {
                log_failure(op, &err);
                sample()
            }
        }
    }

    /// All activated members of a community.
    pub async fn get_members_by_community(&self, community: &str) -> ApiResponse<Vec<Member>> {
        let op = DirectoryOperation::Community;
        let sample = || sample_response(fallback::by_community(community));

        let Some(api) = &self.api else {
            return sample();
        };

        let key = CacheKey::exact(op.name(), &[community]);
        if let Some(hit) = self.cached_members(&key) {
            return hit;
        }

        match api.contacts_by_community(community).await {
            Ok(data) => {
                let response = ApiResponse::ok(normalize(data));
                self.remember(key, CachedResponse::Members(response.clone()));
                response
            }
            Err(err) => degrade(op, &err, sample),
        }
    }

    /// Members with an email address, for email campaigns.
    pub async fn get_all_emails(&self, limit: u32) -> ApiResponse<Vec<Member>> {
        self.export(ContactField::Email, limit).await
    }

    /// Members with a phone number, for SMS campaigns.
    pub async fn get_all_phone_numbers(&self, limit: u32) -> ApiResponse<Vec<Member>> {
        self.export(ContactField::Phone, limit).await
    }

    async fn export(&self, field: ContactField, limit: u32) -> ApiResponse<Vec<Member>> {
        let op = DirectoryOperation::export(field);
        let sample = || sample_response(fallback::with_contact(field));

        let Some(api) = &self.api else {
            return sample();
        };

        let key = CacheKey::new(op.name(), &[&limit.to_string()]);
        if let Some(hit) = self.cached_members(&key) {
            return hit;
        }

        match api.export_contacts(field, limit).await {
            Ok(data) => {
                // The Portal already filters on `fields`; drop blanks regardless.
                let members = data
                    .contacts
                    .into_iter()
                    .filter(|c| c.has_field(field))
                    .map(Member::from)
                    .collect();
                let response = ApiResponse::ok(members);
                self.remember(key, CachedResponse::Members(response.clone()));
                response
            }
            Err(err) => degrade(op, &err, sample),
        }
    }

    /// Resolve T-numbers into a recipient list for SMS or email.
    ///
    /// Blank and unknown T-numbers are skipped. With a configured Portal,
    /// members that only came back as sample data are skipped too.
    pub async fn select_recipients<I, S>(&self, t_numbers: I) -> RecipientSelection
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = RecipientSelection::new();
        for t_number in t_numbers {
            let t_number = t_number.as_ref().trim();
            if t_number.is_empty() || selection.contains(t_number) {
                continue;
            }

            let response = self.get_member_by_t_number(t_number).await;
            if self.is_configured() && response.is_fallback() {
                warn!(t_number, "Portal unavailable; recipient not added");
                continue;
            }
            match response.data.flatten() {
                Some(member) => {
                    selection.add(member);
                }
                None => debug!(t_number, "no member for recipient T-number"),
            }
        }
        selection
    }

    fn cache_get(&self, key: &CacheKey) -> Option<CachedResponse> {
        let hit = self.cache.as_ref()?.get(key);
        if hit.is_some() {
            debug!(?key, "directory cache hit");
        }
        hit
    }

    fn cached_members(&self, key: &CacheKey) -> Option<ApiResponse<Vec<Member>>> {
        match self.cache_get(key)? {
            CachedResponse::Members(response) => Some(response),
            CachedResponse::Member(_) => None,
        }
    }

    fn remember(&self, key: CacheKey, value: CachedResponse) {
        if let Some(cache) = &self.cache {
            cache.insert(key, value);
            debug!(entries = cache.len(), "directory cache updated");
        }
    }
}

fn normalize(data: PortalContactsData) -> Vec<Member> {
    data.contacts.into_iter().map(Member::from).collect()
}

fn sample_response(members: Vec<Member>) -> ApiResponse<Vec<Member>> {
    ApiResponse::ok(members).with_meta(ResponseMeta::mock_data())
}

fn log_failure(op: DirectoryOperation, err: &PortalApiError) {
    match err {
        PortalApiError::Request(_) => {
            error!(operation = op.name(), error = %err, "Portal request failed");
        }
        _ => warn!(operation = op.name(), error = %err, "Portal returned an error"),
    }
}

/// Resolve a failed call according to the operation's policy.
fn degrade<F>(op: DirectoryOperation, err: &PortalApiError, sample: F) -> ApiResponse<Vec<Member>>
where
    F: FnOnce() -> ApiResponse<Vec<Member>>,
{
    log_failure(op, err);
    match op.failure_policy() {
        FailurePolicy::MockData => sample(),
        FailurePolicy::HardFail => ApiResponse::failure(op.failure_message()),
    }
}
