//! Community Portal member directory.
//!
//! Looks up band members in the external Portal API and degrades to a
//! small built-in dataset when the Portal is unconfigured or failing.
//!
//! # Architecture
//!
//! - [`PortalApi`] - Trait defining the Portal's `/contacts` and `/bulletin` operations
//! - [`HttpPortalClient`] - Real HTTP implementation using reqwest
//! - [`MemberDirectory`] - Fallback orchestration, optional response cache
//! - [`fallback`] - The sample dataset and its query predicates
//! - [`BulletinSync`] - Validates bulletins and posts them to the Portal
//! - [`RecipientSelection`] - T-number-deduplicated recipient lists
//! - [`mock::MockPortalClient`] - Mock for unit tests (behind `test-utils` feature)
//!
//! # Testing Patterns
//!
//! Use `MockPortalClient` to drive `MemberDirectory` without HTTP:
//!
//! ```ignore
//! use std::sync::Arc;
//! use tcn_directory_api::portal::{mock::{MockPortalClient, Scripted}, MemberDirectory};
//!
//! let mock = Arc::new(MockPortalClient::new());
//! mock.set_list_result(Scripted::ApiError(503));
//!
//! let directory = MemberDirectory::with_api(mock.clone());
//! let response = directory.search_members("flett", 50).await;
//! assert!(response.is_fallback());
//! ```
//!
//! Use `MockHttpServer` (tests/common/http_mock.rs) to test
//! `HttpPortalClient` against stubbed HTTP.

mod bulletin;
mod cache;
mod client;
mod directory;
pub mod fallback;
mod recipients;
mod types;

pub use bulletin::{
    resolve_poster_url, BulletinSync, BulletinSyncError, BulletinSyncRequest,
    BulletinSyncResponse, PortalBulletin,
};
pub use cache::{CacheKey, CachedResponse, ResponseCache};
pub use client::{HttpPortalClient, PortalApi, PortalApiError, COMMUNITY_PAGE_SIZE};
pub use directory::{
    DirectoryOperation, FailurePolicy, MemberDirectory, DEFAULT_EXPORT_LIMIT, DEFAULT_LIST_LIMIT,
    DEFAULT_SEARCH_LIMIT, FALLBACK_LIST_LIMIT,
};
pub use recipients::RecipientSelection;
pub use types::{
    ApiResponse, ContactField, ContactInfo, FallbackKind, Member, MemberQuery, PersonalInfo,
    PortalContact, PortalContactResponse, PortalContactsData, PortalContactsResponse,
    PortalPagination, ResponseMeta,
};

#[cfg(any(test, feature = "test-utils"))]
pub use client::mock;
