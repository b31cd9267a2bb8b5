//! Portal API client for member contact data and bulletin posts.
//!
//! [`PortalApi`] is the seam between the directory and the network:
//! [`HttpPortalClient`] talks to the real `/contacts` and `/bulletin`
//! endpoints, and
//! [`mock::MockPortalClient`] stands in for it in unit tests.
//!
//! # Example
//!
//! ```ignore
//! use tcn_directory_api::portal::{HttpPortalClient, PortalApi};
//!
//! let client = HttpPortalClient::new("https://portal.example.org/api/sync", "my-api-key");
//! let contacts = client.search_contacts("flett", 50).await?;
//! println!("Found {} contacts", contacts.count);
//! ```

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use super::bulletin::PortalBulletin;
use super::types::{
    ContactField, MemberQuery, PortalContact, PortalContactResponse, PortalContactsData,
    PortalContactsResponse,
};

/// Page size used for community listings.
pub const COMMUNITY_PAGE_SIZE: u32 = 500;

const API_KEY_HEADER: &str = "X-API-Key";

/// Errors that can occur when calling the Portal API.
#[derive(Debug, Error)]
pub enum PortalApiError {
    /// Transport failure (DNS, connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body did not match the expected payload
    #[error("Malformed Portal response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Portal returned a non-success status
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Portal answered 2xx but reported `success: false`
    #[error("Portal reported an unsuccessful query")]
    Unsuccessful,
}

/// Operations offered by the Portal's `/contacts` and `/bulletin` endpoints.
///
/// Every method issues exactly one request; there is no retry.
#[async_trait]
pub trait PortalApi: Send + Sync {
    /// Free-text search over names and T-numbers.
    async fn search_contacts(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<PortalContactsData, PortalApiError>;

    /// Filtered listing.
    async fn list_contacts(&self, query: &MemberQuery)
        -> Result<PortalContactsData, PortalApiError>;

    /// Exact lookup by T-number. `Ok(None)` when the Portal has no such member.
    async fn get_contact(&self, t_number: &str) -> Result<Option<PortalContact>, PortalApiError>;

    /// All activated contacts in a community.
    async fn contacts_by_community(
        &self,
        community: &str,
    ) -> Result<PortalContactsData, PortalApiError>;

    /// Contacts that have the given contact method.
    async fn export_contacts(
        &self,
        field: ContactField,
        limit: u32,
    ) -> Result<PortalContactsData, PortalApiError>;

    /// Minimal query used to check reachability.
    async fn ping(&self) -> Result<bool, PortalApiError>;

    /// Publish a bulletin. Returns the Portal's JSON response body.
    async fn sync_bulletin(&self, bulletin: &PortalBulletin) -> Result<Value, PortalApiError>;
}

/// HTTP-based implementation of `PortalApi`.
pub struct HttpPortalClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpPortalClient {
    /// Create a new client with the given base URL and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    /// Create a client with a custom `reqwest::Client` (e.g., with a timeout).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn contacts_url(&self) -> String {
        format!("{}/contacts", self.base_url)
    }

    fn bulletin_url(&self) -> String {
        format!("{}/bulletin", self.base_url)
    }

    async fn fetch_contacts(
        &self,
        params: &[(&str, String)],
    ) -> Result<PortalContactsData, PortalApiError> {
        let response = self
            .client
            .get(self.contacts_url())
            .header(API_KEY_HEADER, &self.api_key)
            .query(params)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PortalApiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        let payload: PortalContactsResponse = serde_json::from_slice(&body)?;

        match payload {
            PortalContactsResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            _ => Err(PortalApiError::Unsuccessful),
        }
    }
}

fn activated_params() -> Vec<(&'static str, String)> {
    vec![("activated", "true".into()), ("fields", "both".into())]
}

#[async_trait]
impl PortalApi for HttpPortalClient {
    async fn search_contacts(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<PortalContactsData, PortalApiError> {
        let mut params = vec![("search", term.to_string()), ("limit", limit.to_string())];
        params.extend(activated_params());
        self.fetch_contacts(&params).await
    }

    async fn list_contacts(
        &self,
        query: &MemberQuery,
    ) -> Result<PortalContactsData, PortalApiError> {
        let mut params = Vec::new();
        if let Some(limit) = query.requested_limit() {
            params.push(("limit", limit.to_string()));
        }
        if let Some(community) = query.community.as_deref().filter(|c| !c.is_empty()) {
            params.push(("community", community.to_string()));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if query.include_deceased {
            params.push(("includeDeceased", "true".into()));
        }
        params.extend(activated_params());
        self.fetch_contacts(&params).await
    }

    async fn get_contact(&self, t_number: &str) -> Result<Option<PortalContact>, PortalApiError> {
        let response = self
            .client
            .post(self.contacts_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "t_number": t_number }))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PortalApiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        let payload: PortalContactResponse = serde_json::from_slice(&body)?;

        // An unsuccessful lookup body means "not found" for this endpoint.
        Ok(payload.data.filter(|_| payload.success))
    }

    async fn contacts_by_community(
        &self,
        community: &str,
    ) -> Result<PortalContactsData, PortalApiError> {
        let mut params = vec![("community", community.to_string())];
        params.extend(activated_params());
        params.push(("limit", COMMUNITY_PAGE_SIZE.to_string()));
        self.fetch_contacts(&params).await
    }

    async fn export_contacts(
        &self,
        field: ContactField,
        limit: u32,
    ) -> Result<PortalContactsData, PortalApiError> {
        let params = vec![
            ("activated", "true".to_string()),
            ("fields", field.as_query_value().to_string()),
            ("limit", limit.to_string()),
        ];
        self.fetch_contacts(&params).await
    }

    async fn ping(&self) -> Result<bool, PortalApiError> {
        let response = self
            .client
            .get(self.contacts_url())
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("limit", "1")])
            .send()
            .await?;

        Ok(response.status().is_success())
    }

    async fn sync_bulletin(&self, bulletin: &PortalBulletin) -> Result<Value, PortalApiError> {
        let response = self
            .client
            .post(self.bulletin_url())
            .header(API_KEY_HEADER, &self.api_key)
            .json(bulletin)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PortalApiError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::missing_const_for_fn,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Mock implementation for unit testing.

    use super::{
        ContactField, MemberQuery, PortalApi, PortalApiError, PortalBulletin, PortalContact,
        PortalContactsData, Value,
    };
    use serde_json::json;
    use crate::portal::types::PortalPagination;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted outcome for list-style calls.
    pub enum Scripted {
        Contacts(Vec<PortalContact>),
        ApiError(u16),
        Unsuccessful,
    }

    impl Scripted {
        fn into_result(self) -> Result<PortalContactsData, PortalApiError> {
            match self {
                Self::Contacts(contacts) => Ok(contacts_data(contacts)),
                Self::ApiError(status) => Err(PortalApiError::ApiError {
                    status,
                    message: String::new(),
                }),
                Self::Unsuccessful => Err(PortalApiError::Unsuccessful),
            }
        }
    }

    /// Wrap contacts in a Portal data block with a single page.
    pub fn contacts_data(contacts: Vec<PortalContact>) -> PortalContactsData {
        PortalContactsData {
            count: contacts.len() as u64,
            pagination: PortalPagination {
                has_more: false,
                next_cursor: None,
                limit: u32::try_from(contacts.len()).unwrap_or(u32::MAX),
            },
            contacts,
            query: None,
        }
    }

    /// Mock implementation of `PortalApi` for unit tests.
    ///
    /// List-style calls all share one scripted result; lookups have their
    /// own. Every call is recorded as `"<operation>:<argument>"`.
    pub struct MockPortalClient {
        list_result: Mutex<Option<Scripted>>,
        lookup_result: Mutex<Option<Result<Option<PortalContact>, PortalApiError>>>,
        ping_result: Mutex<Option<bool>>,
        bulletin_result: Mutex<Option<Result<Value, PortalApiError>>>,
        last_bulletin: Mutex<Option<PortalBulletin>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockPortalClient {
        pub fn new() -> Self {
            Self {
                list_result: Mutex::new(None),
                lookup_result: Mutex::new(None),
                ping_result: Mutex::new(None),
                bulletin_result: Mutex::new(None),
                last_bulletin: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Set the result for the next list-style call.
        pub fn set_list_result(&self, result: Scripted) {
            *self.list_result.lock().expect("lock poisoned") = Some(result);
        }

        /// Set the result for the next `get_contact` call.
        pub fn set_lookup_result(&self, result: Result<Option<PortalContact>, PortalApiError>) {
            *self.lookup_result.lock().expect("lock poisoned") = Some(result);
        }

        pub fn set_ping_result(&self, reachable: bool) {
            *self.ping_result.lock().expect("lock poisoned") = Some(reachable);
        }

        /// Set the result for the next `sync_bulletin` call.
        pub fn set_bulletin_result(&self, result: Result<Value, PortalApiError>) {
            *self.bulletin_result.lock().expect("lock poisoned") = Some(result);
        }

        /// The most recent bulletin passed to `sync_bulletin`.
        pub fn last_bulletin(&self) -> Option<PortalBulletin> {
            self.last_bulletin.lock().expect("lock poisoned").clone()
        }

        /// All calls made so far.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock poisoned").clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().expect("lock poisoned").push(call);
        }

        fn next_list(&self) -> Result<PortalContactsData, PortalApiError> {
            self.list_result
                .lock()
                .expect("lock poisoned")
                .take()
                .map_or_else(|| Ok(contacts_data(Vec::new())), Scripted::into_result)
        }
    }

    impl Default for MockPortalClient {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PortalApi for MockPortalClient {
        async fn search_contacts(
            &self,
            term: &str,
            limit: u32,
        ) -> Result<PortalContactsData, PortalApiError> {
            self.record(format!("search:{term}:{limit}"));
            self.next_list()
        }

        async fn list_contacts(
            &self,
            query: &MemberQuery,
        ) -> Result<PortalContactsData, PortalApiError> {
            self.record(format!("list:{query:?}"));
            self.next_list()
        }

        async fn get_contact(
            &self,
            t_number: &str,
        ) -> Result<Option<PortalContact>, PortalApiError> {
            self.record(format!("lookup:{t_number}"));
            self.lookup_result.lock().expect("lock poisoned").take().unwrap_or(Ok(None))
        }

        async fn contacts_by_community(
            &self,
            community: &str,
        ) -> Result<PortalContactsData, PortalApiError> {
            self.record(format!("community:{community}"));
            self.next_list()
        }

        async fn export_contacts(
            &self,
            field: ContactField,
            limit: u32,
        ) -> Result<PortalContactsData, PortalApiError> {
            self.record(format!("export:{}:{limit}", field.as_query_value()));
            self.next_list()
        }

        async fn ping(&self) -> Result<bool, PortalApiError> {
            self.record("ping".to_string());
            Ok(self.ping_result.lock().expect("lock poisoned").take().unwrap_or(true))
        }

        async fn sync_bulletin(&self, bulletin: &PortalBulletin) -> Result<Value, PortalApiError> {
            self.record(format!("bulletin:{}", bulletin.source_id));
            *self.last_bulletin.lock().expect("lock poisoned") = Some(bulletin.clone());
            self.bulletin_result
                .lock()
                .expect("lock poisoned")
                .take()
                .unwrap_or_else(|| Ok(json!({ "success": true })))
        }
    }
}
