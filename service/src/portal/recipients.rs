//! Recipient selection for SMS and email composition.
//!
//! Members are keyed by T-number: selecting the same member twice, even
//! from two different result sets, keeps a single entry.

use super::types::Member;

#[derive(Debug, Clone, Default)]
pub struct RecipientSelection {
    members: Vec<Member>,
}

impl RecipientSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. Returns `false` if the T-number is already selected.
    pub fn add(&mut self, member: Member) -> bool {
        if self.contains(&member.t_number) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// Add every member from a result set, skipping duplicates.
    /// Returns how many were added.
    pub fn extend<I>(&mut self, members: I) -> usize
    where
        I: IntoIterator<Item = Member>,
    {
        members.into_iter().filter(|m| self.add(m.clone())).count()
    }

    /// Remove a member by T-number. Returns `true` if one was removed.
    pub fn remove(&mut self, t_number: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.t_number != t_number);
        self.members.len() != before
    }

    /// Select the member if absent, deselect it otherwise.
    /// Returns whether the member is selected afterwards.
    pub fn toggle(&mut self, member: Member) -> bool {
        if self.remove(&member.t_number) {
            false
        } else {
            self.members.push(member);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, t_number: &str) -> bool {
        self.members.iter().any(|m| m.t_number == t_number)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Selected members in selection order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Non-empty phone numbers of the selection.
    #[must_use]
    pub fn phones(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter_map(|m| m.phone.as_deref())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Non-empty email addresses of the selection.
    #[must_use]
    pub fn emails(&self) -> Vec<&str> {
        self.members
            .iter()
            .filter_map(|m| m.email.as_deref())
            .filter(|e| !e.is_empty())
            .collect()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}
