//! Built-in sample members served when the Portal cannot be used.

use std::sync::LazyLock;

use super::types::{ContactField, ContactInfo, Member, PersonalInfo};

static SAMPLE_MEMBERS: LazyLock<Vec<Member>> = LazyLock::new(|| {
    vec![
        sample(
            "mock-1",
            "TCN-12345",
            ("John", "Flett"),
            "(204) 555-1234",
            "john.flett@example.com",
            "Split Lake",
            "On-Reserve",
        ),
        sample(
            "mock-2",
            "TCN-67890",
            ("Jane", "Flett"),
            "(204) 555-5678",
            "jane.flett@example.com",
            "Split Lake",
            "Off-Reserve",
        ),
        sample(
            "mock-3",
            "TCN-11111",
            ("Bob", "Johnson"),
            "(204) 555-9012",
            "bob.johnson@example.com",
            "Tataskweyak",
            "On-Reserve",
        ),
    ]
});

fn sample(
    id: &str,
    t_number: &str,
    (first_name, last_name): (&str, &str),
    phone: &str,
    email: &str,
    community: &str,
    status: &str,
) -> Member {
    Member {
        id: id.to_string(),
        member_id: None,
        t_number: t_number.to_string(),
        name: None,
        personal_info: PersonalInfo {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            t_number: t_number.to_string(),
            date_of_birth: None,
        },
        contact_number: Some(phone.to_string()),
        phone: Some(phone.to_string()),
        email: Some(email.to_string()),
        contact_info: ContactInfo {
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
        },
        community: Some(community.to_string()),
        status: Some(status.to_string()),
        activated: Some("ACTIVATED".to_string()),
        birthdate: None,
    }
}

/// The full sample dataset, in a fixed order.
#[must_use]
pub fn sample_members() -> &'static [Member] {
    &SAMPLE_MEMBERS
}

/// Case-insensitive substring match on first name, last name or T-number.
#[must_use]
pub fn matches_search(member: &Member, term: &str) -> bool {
    let term = term.to_lowercase();
    member.personal_info.first_name.to_lowercase().contains(&term)
        || member.personal_info.last_name.to_lowercase().contains(&term)
        || member.t_number.to_lowercase().contains(&term)
}

/// Case-insensitive equality on community name.
#[must_use]
pub fn matches_community(member: &Member, community: &str) -> bool {
    member
        .community
        .as_deref()
        .is_some_and(|c| c.to_lowercase() == community.to_lowercase())
}

#[must_use]
pub fn search(term: &str) -> Vec<Member> {
    filter(|m| matches_search(m, term))
}

#[must_use]
pub fn by_community(community: &str) -> Vec<Member> {
    filter(|m| matches_community(m, community))
}

#[must_use]
pub fn by_t_number(t_number: &str) -> Option<Member> {
    sample_members()
        .iter()
        .find(|m| m.t_number == t_number)
        .cloned()
}

#[must_use]
pub fn with_contact(field: ContactField) -> Vec<Member> {
    filter(|m| match field {
        ContactField::Email => m.has_email(),
        ContactField::Phone => m.has_phone(),
    })
}

pub fn filter<P>(predicate: P) -> Vec<Member>
where
    P: Fn(&Member) -> bool,
{
    sample_members()
        .iter()
        .filter(|m| predicate(m))
        .cloned()
        .collect()
}
