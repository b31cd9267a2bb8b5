//! Member records, the response envelope, and Portal API payloads.

use serde::{Deserialize, Serialize};
use serde_aux::prelude::deserialize_default_from_null;
use utoipa::ToSchema;

/// Identity fields nested under a [`Member`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    /// Always equal to the enclosing member's `t_number`.
    pub t_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

/// Contact methods nested under a [`Member`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A band member as consumed by the staff dashboards.
///
/// Phone and email are deliberately duplicated across `contact_number`,
/// `phone`, `email` and `contact_info` for older consumers; every
/// constructor in this crate keeps the copies equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Member {
    /// Stable Portal identifier
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    /// Band member number (e.g., "TCN-12345")
    pub t_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub personal_info: PersonalInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub contact_info: ContactInfo,
    /// Community name (e.g., "Split Lake")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
    /// Residency flag (e.g., "On-Reserve")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Membership flag (e.g., "ACTIVATED")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
}

impl Member {
    /// Whether the member has a non-empty email address.
    #[must_use]
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Whether the member has a non-empty phone number.
    #[must_use]
    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Which degradation path produced a response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    /// Served from the built-in sample dataset.
    MockData,
}

/// Paging and provenance details attached to an [`ApiResponse`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ResponseMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackKind>,
}

impl ResponseMeta {
    #[must_use]
    pub fn mock_data() -> Self {
        Self {
            fallback: Some(FallbackKind::MockData),
            ..Self::default()
        }
    }
}

/// Envelope returned by every directory operation.
///
/// Check `success` before reading `data`, and `meta.fallback` before
/// presenting results as live data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: None,
        }
    }

    /// A failed response; never carries data.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            meta: None,
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Whether the response was served from the sample dataset.
    pub fn is_fallback(&self) -> bool {
        self.meta
            .as_ref()
            .is_some_and(|meta| meta.fallback.is_some())
    }
}

/// Filters accepted by the paged member listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub community: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_deceased: bool,
}

impl MemberQuery {
    /// Requested page; a missing or zero page means the first one.
    #[must_use]
    pub fn page_or_first(&self) -> u32 {
        self.page.filter(|&page| page > 0).unwrap_or(1)
    }

    /// Requested page size; zero counts as not given.
    #[must_use]
    pub fn requested_limit(&self) -> Option<u32> {
        self.limit.filter(|&limit| limit > 0)
    }
}

/// Contact method requested by the bulk export endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Email,
    Phone,
}

impl ContactField {
    /// Value of the Portal's `fields` query parameter.
    #[must_use]
    pub const fn as_query_value(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }
}

// ---------------------------------------------------------------------------
// Portal API payloads
// ---------------------------------------------------------------------------

/// A contact as returned by the Portal.
///
/// Identity fields are required: a payload missing any of them fails to
/// decode and is treated as an upstream failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PortalContact {
    pub member_id: String,
    #[serde(rename = "t_number")]
    pub t_number: String,
    #[serde(default)]
    pub name: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub community: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub activated: Option<String>,
    #[serde(default)]
    pub birthdate: Option<String>,
}

impl PortalContact {
    fn has(value: Option<&str>) -> bool {
        value.is_some_and(|v| !v.is_empty())
    }

    /// Whether the contact carries the requested contact method.
    #[must_use]
    pub fn has_field(&self, field: ContactField) -> bool {
        match field {
            ContactField::Email => Self::has(self.email.as_deref()),
            ContactField::Phone => Self::has(self.phone.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalPagination {
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalContactsData {
    pub contacts: Vec<PortalContact>,
    pub count: u64,
    pub pagination: PortalPagination,
    #[serde(default)]
    pub query: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Response from `GET /contacts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalContactsResponse {
    pub success: bool,
    /// Absent when the Portal reports `success: false`.
    #[serde(default)]
    pub data: Option<PortalContactsData>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Response from `POST /contacts` (single lookup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalContactResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<PortalContact>,
}

impl From<PortalContact> for Member {
    fn from(contact: PortalContact) -> Self {
        Self {
            id: contact.member_id.clone(),
            member_id: Some(contact.member_id),
            t_number: contact.t_number.clone(),
            name: contact.name,
            personal_info: PersonalInfo {
                first_name: contact.first_name,
                last_name: contact.last_name,
                t_number: contact.t_number,
                date_of_birth: contact.birthdate.clone(),
            },
            contact_number: contact.phone.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            contact_info: ContactInfo {
                email: contact.email,
                phone: contact.phone,
            },
            community: contact.community,
            status: contact.status,
            activated: contact.activated,
            birthdate: contact.birthdate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn contact(phone: Option<&str>, email: Option<&str>) -> PortalContact {
        PortalContact {
            member_id: "m-1".into(),
            t_number: "TCN-1".into(),
            name: Some("Ada Flett".into()),
            first_name: "Ada".into(),
            last_name: "Flett".into(),
            phone: phone.map(String::from),
            email: email.map(String::from),
            community: Some("Split Lake".into()),
            status: None,
            activated: Some("ACTIVATED".into()),
            birthdate: Some("1980-02-03".into()),
        }
    }

    #[test]
    fn normalizer_duplicates_contact_fields() {
        let member = Member::from(contact(Some("555-1111"), Some("a@b.com")));

        assert_eq!(member.contact_number.as_deref(), Some("555-1111"));
        assert_eq!(member.phone.as_deref(), Some("555-1111"));
        assert_eq!(member.contact_info.phone.as_deref(), Some("555-1111"));
        assert_eq!(member.email.as_deref(), Some("a@b.com"));
        assert_eq!(member.contact_info.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn normalizer_fills_identity() {
        let member = Member::from(contact(None, None));

        assert_eq!(member.id, "m-1");
        assert_eq!(member.member_id.as_deref(), Some("m-1"));
        assert_eq!(member.t_number, "TCN-1");
        assert_eq!(member.personal_info.t_number, member.t_number);
        assert_eq!(member.personal_info.first_name, "Ada");
        assert_eq!(member.personal_info.last_name, "Flett");
        assert_eq!(
            member.personal_info.date_of_birth.as_deref(),
            Some("1980-02-03")
        );
        assert!(!member.has_phone());
        assert!(!member.has_email());
    }

    #[test]
    fn portal_contact_decodes_camel_case() {
        let json = r#"{
            "memberId": "abc",
            "t_number": "TCN-9",
            "name": "Bo Ross",
            "firstName": "Bo",
            "lastName": "Ross",
            "phone": "204-555-0000"
        }"#;
        let contact: PortalContact = serde_json::from_str(json).expect("should parse");
        assert_eq!(contact.member_id, "abc");
        assert_eq!(contact.t_number, "TCN-9");
        assert_eq!(contact.phone.as_deref(), Some("204-555-0000"));
        assert!(contact.email.is_none());
    }

    #[test]
    fn portal_contact_accepts_null_optional_fields() {
        let json = r#"{
            "memberId": "abc",
            "t_number": "TCN-9",
            "name": null,
            "firstName": "Bo",
            "lastName": "Ross",
            "phone": null,
            "email": null,
            "community": null,
            "status": null,
            "activated": null,
            "birthdate": null
        }"#;
        let contact: PortalContact = serde_json::from_str(json).expect("should parse");
        let member = Member::from(contact);
        assert!(member.name.is_none());
        assert!(!member.has_phone());
        assert_eq!(member.personal_info.first_name, "Bo");
    }

    #[test]
    fn pagination_tolerates_null_has_more() {
        let json = r#"{"hasMore": null, "nextCursor": null, "limit": 50}"#;
        let pagination: PortalPagination = serde_json::from_str(json).expect("should parse");
        assert!(!pagination.has_more);
    }

    #[test]
    fn portal_contact_without_identity_is_rejected() {
        let json = r#"{"memberId": "abc", "name": "Bo Ross"}"#;
        assert!(serde_json::from_str::<PortalContact>(json).is_err());
    }

    #[test]
    fn failure_envelope_omits_data() {
        let response: ApiResponse<Vec<Member>> = ApiResponse::failure("Failed to fetch members");
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"], "Failed to fetch members");
    }

    #[test]
    fn fallback_marker_serializes_as_mock_data() {
        let response = ApiResponse::ok(Vec::<Member>::new()).with_meta(ResponseMeta::mock_data());
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["meta"]["fallback"], "mock_data");
        assert!(response.is_fallback());
    }

    #[test]
    fn has_field_ignores_empty_values() {
        let c = contact(Some(""), Some("x@y.z"));
        assert!(!c.has_field(ContactField::Phone));
        assert!(c.has_field(ContactField::Email));
    }

    proptest! {
        #[test]
        fn normalized_copies_always_agree(
            phone in proptest::option::of("[0-9() -]{0,16}"),
            email in proptest::option::of("[a-z]{1,8}@[a-z]{1,8}\\.com"),
            t_number in "TCN-[0-9]{1,6}",
        ) {
            let mut c = contact(phone.as_deref(), email.as_deref());
            c.t_number = t_number;
            let member = Member::from(c);

            prop_assert_eq!(&member.contact_number, &member.phone);
            prop_assert_eq!(&member.phone, &member.contact_info.phone);
            prop_assert_eq!(&member.email, &member.contact_info.email);
            prop_assert_eq!(&member.personal_info.t_number, &member.t_number);
        }
    }
}
