//! Common test utilities for integration tests.
//!
//! - [`http_mock::MockHttpServer`] - wiremock wrapper for stubbing the Portal
//! - [`portal_contact`] / [`contacts_body`] - Portal payload fixtures
//! - [`test_router`] - the production router over a given directory
//! - [`bulletin_router`] - the production router over a given bulletin sync

#![allow(dead_code)]

pub mod http_mock;

use std::sync::Arc;

use axum::Router;
use serde_json::{json, Value};
use tcn_directory_api::{
    build_info::{BuildInfo, BuildInfoProvider},
    config::Config,
    http::build_router,
    portal::{BulletinSync, MemberDirectory},
};

pub const TEST_API_KEY: &str = "test-api-key";

/// A Portal contact in the Portal's own camelCase shape.
pub fn portal_contact(t_number: &str, first: &str, last: &str) -> Value {
    json!({
        "memberId": format!("pm-{t_number}"),
        "t_number": t_number,
        "name": format!("{first} {last}"),
        "firstName": first,
        "lastName": last,
        "phone": "204-555-0100",
        "email": format!("{}@example.org", first.to_lowercase()),
        "community": "Split Lake",
        "status": "On-Reserve",
        "activated": "ACTIVATED"
    })
}

/// A successful `GET /contacts` body wrapping `contacts`.
pub fn contacts_body(contacts: Vec<Value>) -> Value {
    let count = contacts.len();
    json!({
        "success": true,
        "data": {
            "contacts": contacts,
            "count": count,
            "pagination": { "hasMore": false, "nextCursor": null, "limit": 50 },
            "query": {}
        },
        "timestamp": "2026-01-01T00:00:00Z"
    })
}

/// The production router with default config and fixed build info.
pub fn test_router(directory: MemberDirectory) -> Router {
    test_router_with_config(directory, &Config::default())
}

pub fn test_router_with_config(directory: MemberDirectory, config: &Config) -> Router {
    build_router(
        Arc::new(directory),
        Arc::new(BulletinSync::unconfigured()),
        test_build_info(),
        config,
    )
}

/// The production router with an unconfigured directory and `bulletins`.
pub fn bulletin_router(bulletins: BulletinSync) -> Router {
    build_router(
        Arc::new(MemberDirectory::unconfigured()),
        Arc::new(bulletins),
        test_build_info(),
        &Config::default(),
    )
}

/// A complete bulletin as the staff dashboard submits it.
pub fn bulletin_request() -> Value {
    json!({
        "sourceId": "bul-100",
        "title": "Treaty Days",
        "subject": "Payments at the band office",
        "poster_url": "/bulletinboard/treaty-days.jpg",
        "category": "announcements",
        "userId": "local-7"
    })
}

fn test_build_info() -> BuildInfo {
    BuildInfoProvider::from_lookup(|key| match key {
        "GIT_SHA" => Some("test-sha".to_string()),
        _ => None,
    })
    .build_info()
}
