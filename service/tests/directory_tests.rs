//! End-to-end fallback behavior of `MemberDirectory` over real HTTP.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::http_mock::MockHttpServer;
use common::{contacts_body, portal_contact, TEST_API_KEY};
use serde_json::json;
use tcn_directory_api::config::{PortalCacheConfig, PortalConfig};
use tcn_directory_api::portal::{
    fallback, FallbackKind, HttpPortalClient, Member, MemberDirectory, MemberQuery,
    DEFAULT_EXPORT_LIMIT, DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT,
};

/// Nothing listens on port 1, so every request fails at connect time.
const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

fn directory_for(url: &str) -> MemberDirectory {
    MemberDirectory::with_api(Arc::new(HttpPortalClient::new(url, TEST_API_KEY)))
}

fn t_numbers(members: Option<&Vec<Member>>) -> Vec<&str> {
    members
        .map(|m| m.iter().map(|m| m.t_number.as_str()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn unconfigured_search_matches_sample_data_case_insensitively() {
    let directory = MemberDirectory::from_config(&PortalConfig::default());

    for term in ["FLETT", "jo", "tcn-6", "zzz", ""] {
        let response = directory.search_members(term, DEFAULT_SEARCH_LIMIT).await;
        let expected: Vec<Member> = fallback::sample_members()
            .iter()
            .filter(|m| {
                let term = term.to_lowercase();
                m.personal_info.first_name.to_lowercase().contains(&term)
                    || m.personal_info.last_name.to_lowercase().contains(&term)
                    || m.t_number.to_lowercase().contains(&term)
            })
            .cloned()
            .collect();

        assert!(response.success, "term '{term}'");
        assert_eq!(response.data, Some(expected), "term '{term}'");
        assert_eq!(
            response.meta.and_then(|m| m.fallback),
            Some(FallbackKind::MockData),
            "term '{term}'"
        );
    }
}

#[tokio::test]
async fn unconfigured_lookup_by_t_number() {
    let directory = MemberDirectory::from_config(&PortalConfig::default());

    let found = directory.get_member_by_t_number("TCN-12345").await;
    assert!(found.success);
    assert_eq!(
        found.data.flatten().map(|m| m.personal_info.first_name),
        Some("John".to_string())
    );

    let missing = directory.get_member_by_t_number("NO-SUCH-ID").await;
    assert!(missing.success);
    assert_eq!(missing.data, Some(None));
    assert!(missing.error.is_none());
}

#[tokio::test]
async fn upstream_404_lookup_is_empty_not_fallback() {
    let server = MockHttpServer::start().await;
    server
        .expect_post("/contacts")
        .respond_with_status(404)
        .mount()
        .await;

    // TCN-12345 exists in the sample data; a fallback would return it.
    let response = directory_for(&server.url())
        .get_member_by_t_number("TCN-12345")
        .await;

    assert!(response.success);
    assert_eq!(response.data, Some(None));
    assert!(!response.is_fallback());
}

#[tokio::test]
async fn upstream_500_lookup_falls_back() {
    let server = MockHttpServer::start().await;
    server
        .expect_post("/contacts")
        .respond_with_status(500)
        .mount()
        .await;

    let response = directory_for(&server.url())
        .get_member_by_t_number("TCN-11111")
        .await;

    assert!(response.success);
    assert!(response.is_fallback());
    assert_eq!(
        response.data.flatten().map(|m| m.t_number),
        Some("TCN-11111".to_string())
    );
}

#[tokio::test]
async fn network_failure_during_search_falls_back() {
    let response = directory_for(UNREACHABLE_URL)
        .search_members("flett", DEFAULT_SEARCH_LIMIT)
        .await;

    assert!(response.success);
    assert!(response.is_fallback());
    assert_eq!(
        t_numbers(response.data.as_ref()),
        vec!["TCN-12345", "TCN-67890"]
    );
}

#[tokio::test]
async fn network_failure_during_export_is_a_hard_failure() {
    let directory = directory_for(UNREACHABLE_URL);

    let emails = directory.get_all_emails(DEFAULT_EXPORT_LIMIT).await;
    assert!(!emails.success);
    assert!(emails.data.is_none());
    assert_eq!(emails.error.as_deref(), Some("Failed to fetch emails"));

    let community = directory.get_members_by_community("Split Lake").await;
    assert!(!community.success);
    assert_eq!(community.error.as_deref(), Some("Failed to fetch members"));
}

#[tokio::test]
async fn malformed_payload_falls_back() {
    let server = MockHttpServer::start().await;
    server
        .expect_get("/contacts")
        .respond_with_json(json!({ "success": true, "data": { "contacts": "nope" } }))
        .mount()
        .await;

    let response = directory_for(&server.url())
        .search_members("bob", DEFAULT_SEARCH_LIMIT)
        .await;

    assert!(response.success);
    assert!(response.is_fallback());
    assert_eq!(t_numbers(response.data.as_ref()), vec!["TCN-11111"]);
}

#[tokio::test]
async fn live_search_normalizes_contacts() {
    let server = MockHttpServer::start().await;
    server
        .expect_get("/contacts")
        .respond_with_json(contacts_body(vec![portal_contact("TCN-7", "Mary", "Keeper")]))
        .mount()
        .await;

    let response = directory_for(&server.url())
        .search_members("keeper", DEFAULT_SEARCH_LIMIT)
        .await;

    assert!(response.success);
    assert!(!response.is_fallback());
    let meta = response.meta.clone().expect("meta");
    assert_eq!(meta.total, Some(1));
    assert_eq!(meta.limit, Some(50));

    let member = &response.data.expect("data")[0];
    assert_eq!(member.id, "pm-TCN-7");
    assert_eq!(member.personal_info.t_number, "TCN-7");
    assert_eq!(member.contact_number, member.phone);
    assert_eq!(member.contact_info.phone, member.phone);
    assert_eq!(member.contact_info.email.as_deref(), Some("mary@example.org"));
}

#[tokio::test]
async fn exports_never_return_blank_contacts() {
    let server = MockHttpServer::start().await;

    let mut no_email = portal_contact("TCN-2", "No", "Email");
    no_email["email"] = json!("");
    let mut null_email = portal_contact("TCN-3", "Null", "Email");
    null_email["email"] = json!(null);
    let mut no_phone = portal_contact("TCN-4", "No", "Phone");
    if let Some(fields) = no_phone.as_object_mut() {
        fields.remove("phone");
    }

    server
        .expect_get("/contacts")
        .with_query("fields", "email")
        .respond_with_json(contacts_body(vec![
            portal_contact("TCN-1", "Has", "Both"),
            no_email.clone(),
            null_email,
            no_phone.clone(),
        ]))
        .mount()
        .await;
    server
        .expect_get("/contacts")
        .with_query("fields", "phone")
        .respond_with_json(contacts_body(vec![
            portal_contact("TCN-1", "Has", "Both"),
            no_email,
            no_phone,
        ]))
        .mount()
        .await;

    let directory = directory_for(&server.url());

    let emails = directory.get_all_emails(DEFAULT_EXPORT_LIMIT).await;
    assert_eq!(t_numbers(emails.data.as_ref()), vec!["TCN-1", "TCN-4"]);
    assert!(emails
        .data
        .iter()
        .flatten()
        .all(|m| m.email.as_deref().is_some_and(|e| !e.is_empty())));

    let phones = directory.get_all_phone_numbers(DEFAULT_EXPORT_LIMIT).await;
    assert_eq!(t_numbers(phones.data.as_ref()), vec!["TCN-1", "TCN-2"]);
    assert!(phones
        .data
        .iter()
        .flatten()
        .all(|m| m.phone.as_deref().is_some_and(|p| !p.is_empty())));
}

#[tokio::test]
async fn identical_calls_return_identical_data() {
    let server = MockHttpServer::start().await;
    server
        .expect_get("/contacts")
        .respond_with_json(contacts_body(vec![
            portal_contact("TCN-1", "Ada", "Flett"),
            portal_contact("TCN-2", "Sam", "Flett"),
        ]))
        .expect_times(2)
        .mount()
        .await;

    let directory = directory_for(&server.url());
    let first = directory.search_members("flett", 10).await;
    let second = directory.search_members("flett", 10).await;

    assert_eq!(first.data, second.data);
    server.verify().await;

    let offline = MemberDirectory::unconfigured();
    assert_eq!(
        offline.search_members("a", 10).await.data,
        offline.search_members("a", 10).await.data
    );
}

#[tokio::test]
async fn configured_cache_avoids_repeat_round_trips() {
    let server = MockHttpServer::start().await;
    server
        .expect_get("/contacts")
        .respond_with_json(contacts_body(vec![portal_contact("TCN-1", "Ada", "Flett")]))
        .expect_times(1)
        .mount()
        .await;

    let config = PortalConfig {
        base_url: server.url(),
        api_key: TEST_API_KEY.to_string(),
        cache: PortalCacheConfig {
            enabled: true,
            ttl_secs: 60,
            max_entries: 16,
        },
        ..PortalConfig::default()
    };
    let directory = MemberDirectory::from_config(&config);

    let first = directory.search_members("Flett", 10).await;
    let second = directory.search_members("flett", 10).await;

    assert_eq!(first, second);
    server.verify().await;
}

#[tokio::test]
async fn connection_test_reflects_upstream() {
    assert!(
        MemberDirectory::from_config(&PortalConfig::default())
            .test_connection()
            .await
    );
    assert!(!directory_for(UNREACHABLE_URL).test_connection().await);

    let server = MockHttpServer::start().await;
    server
        .expect_get("/contacts")
        .with_query("limit", "1")
        .respond_with_status(500)
        .mount()
        .await;
    assert!(!directory_for(&server.url()).test_connection().await);
}

#[tokio::test]
async fn slow_portal_with_client_timeout_falls_back() {
    let server = MockHttpServer::start().await;
    server
        .expect_get("/contacts")
        .respond_with_json(contacts_body(vec![]))
        .respond_with_delay(Duration::from_secs(5))
        .mount()
        .await;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .build()
        .expect("client build");
    let directory = MemberDirectory::with_api(Arc::new(HttpPortalClient::with_client(
        http_client,
        server.url(),
        TEST_API_KEY,
    )));

    let response = directory.search_members("jane", 10).await;
    assert!(response.is_fallback());
    assert_eq!(t_numbers(response.data.as_ref()), vec!["TCN-67890"]);
}

#[tokio::test]
async fn null_contact_name_keeps_live_results() {
    let server = MockHttpServer::start().await;
    let mut contact = portal_contact("TCN-8", "Abe", "Spence");
    contact["name"] = json!(null);
    server
        .expect_get("/contacts")
        .respond_with_json(contacts_body(vec![contact]))
        .mount()
        .await;

    let response = directory_for(&server.url())
        .search_members("abe", DEFAULT_SEARCH_LIMIT)
        .await;

    assert!(response.success);
    assert!(!response.is_fallback());
    let members = response.data.expect("data");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].t_number, "TCN-8");
    assert!(members[0].name.is_none());
}

#[tokio::test]
async fn zero_page_and_limit_report_defaults() {
    let server = MockHttpServer::start().await;
    server
        .expect_get("/contacts")
        .respond_with_json(contacts_body(vec![portal_contact("TCN-1", "Ada", "Flett")]))
        .mount()
        .await;

    let query = MemberQuery {
        page: Some(0),
        limit: Some(0),
        ..MemberQuery::default()
    };
    let response = directory_for(&server.url()).get_members(&query).await;

    let meta = response.meta.expect("meta");
    assert_eq!(meta.page, Some(1));
    assert_eq!(meta.limit, Some(DEFAULT_LIST_LIMIT));
    assert!(meta.fallback.is_none());
}

#[tokio::test]
async fn recipients_resolved_through_portal_lookups() {
    let server = MockHttpServer::start().await;
    server
        .expect_post("/contacts")
        .with_json_body(json!({ "t_number": "TCN-21" }))
        .respond_with_json(json!({
            "success": true,
            "data": portal_contact("TCN-21", "Rita", "Keeper")
        }))
        .expect_times(1)
        .mount()
        .await;
    server
        .expect_post("/contacts")
        .with_json_body(json!({ "t_number": "TCN-22" }))
        .respond_with_status(500)
        .mount()
        .await;

    let selection = directory_for(&server.url())
        .select_recipients(["TCN-21", "TCN-21", "TCN-22"])
        .await;

    assert_eq!(selection.len(), 1);
    assert_eq!(selection.emails(), vec!["rita@example.org"]);
    server.verify().await;
}
