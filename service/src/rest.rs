//! REST API handlers and `OpenAPI` documentation.
//!
//! Directory endpoints always answer 200 with the [`ApiResponse`] envelope;
//! callers check `success` and `meta.fallback` in the body. Only malformed
//! requests are rejected with RFC 7807 problem details.

// The OpenApi derive macro generates code that triggers this lint
#![allow(clippy::needless_for_each)]

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::build_info::BuildInfo;
use crate::portal::{
    ApiResponse, BulletinSync, BulletinSyncError, BulletinSyncRequest, BulletinSyncResponse,
    ContactInfo, FallbackKind, Member, MemberDirectory, MemberQuery, PersonalInfo, ResponseMeta,
    DEFAULT_EXPORT_LIMIT, DEFAULT_SEARCH_LIMIT,
};

/// Shortest search term the search endpoint forwards to the directory.
pub const MIN_SEARCH_TERM_LEN: usize = 3;

/// Serialize a `StatusCode` as its `u16` representation.
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires `&T` signature
fn serialize_status_code<S: Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

/// RFC 7807 Problem Details error response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// URI reference identifying the problem type
    #[serde(rename = "type")]
    pub problem_type: String,
    /// Short human-readable summary
    pub title: String,
    /// HTTP status code
    #[serde(serialize_with = "serialize_status_code")]
    #[schema(value_type = u16)]
    pub status: StatusCode,
    /// Human-readable explanation specific to this occurrence
    pub detail: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ProblemExtensions>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProblemExtensions {
    /// Machine-readable error code
    pub code: String,
    /// Field that caused the error (for validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ProblemDetails {
    /// A validation failure on a single request field.
    #[must_use]
    pub fn bad_request(detail: &str, field: &str) -> Self {
        Self {
            problem_type: "about:blank#validation".to_string(),
            title: "Bad Request".to_string(),
            status: StatusCode::BAD_REQUEST,
            detail: detail.to_string(),
            extensions: Some(ProblemExtensions {
                code: "VALIDATION_ERROR".to_string(),
                field: Some(field.to_string()),
            }),
        }
    }

    /// Create an internal server error response.
    #[must_use]
    pub fn internal_error(detail: &str) -> Self {
        Self {
            problem_type: "about:blank#internal".to_string(),
            title: "Internal Server Error".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: detail.to_string(),
            extensions: Some(ProblemExtensions {
                code: "INTERNAL_ERROR".to_string(),
                field: None,
            }),
        }
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Name or T-number fragment, at least 3 characters
    pub q: Option<String>,
    /// Maximum results (default 50)
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub community: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_deceased: bool,
}

impl From<ListParams> for MemberQuery {
    fn from(params: ListParams) -> Self {
        Self {
            page: params.page,
            limit: params.limit,
            community: params.community,
            search: params.search,
            include_deceased: params.include_deceased,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    /// Maximum results (default 500)
    pub limit: Option<u32>,
}

/// Portal reachability as seen by this service.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PortalStatus {
    /// Portal URL and API key are both configured
    pub configured: bool,
    /// The Portal answered a minimal query (always true when unconfigured)
    pub connected: bool,
    /// Directory responses are currently expected to be sample data
    pub fallback: bool,
}

/// `OpenAPI` documentation for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "TCN Member Directory API",
        version = "1.0.0",
        description = "Member lookups for the staff portal, backed by the community Portal API",
        license(name = "MIT")
    ),
    servers(
        (url = "/api/v1", description = "REST API v1")
    ),
    paths(
        get_build_info,
        search_members,
        list_members,
        get_member,
        community_members,
        email_contacts,
        phone_contacts,
        portal_status,
        sync_bulletin
    ),
    components(schemas(
        BuildInfo,
        ProblemDetails,
        ProblemExtensions,
        Member,
        PersonalInfo,
        ContactInfo,
        ResponseMeta,
        FallbackKind,
        PortalStatus,
        BulletinSyncRequest,
        BulletinSyncResponse
    ))
)]
pub struct ApiDoc;

/// Get build information
///
/// Returns metadata about the running service including version, git SHA, and build time.
///
/// # Errors
///
/// Returns `ProblemDetails` on internal server errors.
#[utoipa::path(
    get,
    path = "/build-info",
    tag = "System",
    responses(
        (status = 200, description = "Build information retrieved successfully", body = BuildInfo),
        (status = 500, description = "Internal server error", body = ProblemDetails)
    )
)]
#[allow(clippy::unused_async)] // Required for Axum handler signature
pub async fn get_build_info(
    Extension(build_info): Extension<BuildInfo>,
) -> Result<Json<BuildInfo>, ProblemDetails> {
    Ok(Json(build_info))
}

/// Search members
///
/// Free-text search over first name, last name and T-number.
///
/// # Errors
///
/// Returns `ProblemDetails` when `q` is missing or shorter than 3 characters.
#[utoipa::path(
    get,
    path = "/members/search",
    tag = "Members",
    params(SearchParams),
    responses(
        (status = 200, description = "Search envelope", body = ApiResponse<Vec<Member>>),
        (status = 400, description = "Search term too short", body = ProblemDetails)
    )
)]
pub async fn search_members(
    Extension(directory): Extension<Arc<MemberDirectory>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<Member>>>, ProblemDetails> {
    let term = params.q.as_deref().map_or("", str::trim);
    if term.chars().count() < MIN_SEARCH_TERM_LEN {
        return Err(ProblemDetails::bad_request(
            "Search term must be at least 3 characters",
            "q",
        ));
    }

    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    Ok(Json(directory.search_members(term, limit).await))
}

/// List members
#[utoipa::path(
    get,
    path = "/members",
    tag = "Members",
    params(ListParams),
    responses(
        (status = 200, description = "Listing envelope", body = ApiResponse<Vec<Member>>)
    )
)]
pub async fn list_members(
    Extension(directory): Extension<Arc<MemberDirectory>>,
    Query(params): Query<ListParams>,
) -> Json<ApiResponse<Vec<Member>>> {
    let query = MemberQuery::from(params);
    Json(directory.get_members(&query).await)
}

/// Look up a member by T-number
///
/// A member that does not exist yields `success: true` without `data`.
#[utoipa::path(
    get,
    path = "/members/{t_number}",
    tag = "Members",
    params(("t_number" = String, Path, description = "Band member number, e.g. TCN-12345")),
    responses(
        (status = 200, description = "Lookup envelope", body = ApiResponse<Member>)
    )
)]
pub async fn get_member(
    Extension(directory): Extension<Arc<MemberDirectory>>,
    Path(t_number): Path<String>,
) -> Json<ApiResponse<Option<Member>>> {
    Json(directory.get_member_by_t_number(&t_number).await)
}

/// List members of a community
#[utoipa::path(
    get,
    path = "/communities/{community}/members",
    tag = "Members",
    params(("community" = String, Path, description = "Community name, e.g. Split Lake")),
    responses(
        (status = 200, description = "Listing envelope; success is false if the Portal failed", body = ApiResponse<Vec<Member>>)
    )
)]
pub async fn community_members(
    Extension(directory): Extension<Arc<MemberDirectory>>,
    Path(community): Path<String>,
) -> Json<ApiResponse<Vec<Member>>> {
    Json(directory.get_members_by_community(&community).await)
}

/// Members with an email address
#[utoipa::path(
    get,
    path = "/contacts/emails",
    tag = "Contacts",
    params(LimitParams),
    responses(
        (status = 200, description = "Export envelope; success is false if the Portal failed", body = ApiResponse<Vec<Member>>)
    )
)]
pub async fn email_contacts(
    Extension(directory): Extension<Arc<MemberDirectory>>,
    Query(params): Query<LimitParams>,
) -> Json<ApiResponse<Vec<Member>>> {
    let limit = params.limit.unwrap_or(DEFAULT_EXPORT_LIMIT);
    Json(directory.get_all_emails(limit).await)
}

/// Members with a phone number
#[utoipa::path(
    get,
    path = "/contacts/phones",
    tag = "Contacts",
    params(LimitParams),
    responses(
        (status = 200, description = "Export envelope; success is false if the Portal failed", body = ApiResponse<Vec<Member>>)
    )
)]
pub async fn phone_contacts(
    Extension(directory): Extension<Arc<MemberDirectory>>,
    Query(params): Query<LimitParams>,
) -> Json<ApiResponse<Vec<Member>>> {
    let limit = params.limit.unwrap_or(DEFAULT_EXPORT_LIMIT);
    Json(directory.get_all_phone_numbers(limit).await)
}

/// Portal connection status
#[utoipa::path(
    get,
    path = "/portal/status",
    tag = "System",
    responses(
        (status = 200, description = "Portal status", body = PortalStatus)
    )
)]
pub async fn portal_status(
    Extension(directory): Extension<Arc<MemberDirectory>>,
) -> Json<PortalStatus> {
    let configured = directory.is_configured();
    let connected = directory.test_connection().await;
    Json(PortalStatus {
        configured,
        connected,
        fallback: !configured || !connected,
    })
}

/// Sync a bulletin to the Portal
///
/// Posts the bulletin to the Portal's bulletin board. A Portal error
/// status still answers 200, with `portalSynced: false`.
///
/// # Errors
///
/// Returns `ProblemDetails` when required fields are missing, the poster
/// URL cannot be resolved, the Portal is not configured, or the Portal
/// cannot be reached.
#[utoipa::path(
    post,
    path = "/bulletins/sync",
    tag = "Bulletins",
    request_body = BulletinSyncRequest,
    responses(
        (status = 200, description = "Sync outcome", body = BulletinSyncResponse),
        (status = 400, description = "Invalid bulletin", body = ProblemDetails),
        (status = 500, description = "Portal not configured or unreachable", body = ProblemDetails)
    )
)]
pub async fn sync_bulletin(
    Extension(bulletins): Extension<Arc<BulletinSync>>,
    Json(request): Json<BulletinSyncRequest>,
) -> Result<Json<BulletinSyncResponse>, ProblemDetails> {
    match bulletins.sync(&request).await {
        Ok(response) => Ok(Json(response)),
        Err(BulletinSyncError::MissingFields(fields)) => Err(ProblemDetails::bad_request(
            "Missing required fields",
            &fields.join(", "),
        )),
        Err(err @ BulletinSyncError::InvalidPosterUrl(_)) => {
            Err(ProblemDetails::bad_request(&err.to_string(), "poster_url"))
        }
        Err(err @ BulletinSyncError::NotConfigured) => {
            Err(ProblemDetails::internal_error(&err.to_string()))
        }
        Err(BulletinSyncError::Portal(_)) => {
            Err(ProblemDetails::internal_error("Failed to sync bulletin"))
        }
    }
}
