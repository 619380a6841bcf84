//! Entry Translation
//!
//! Maps raw directory entries onto [`Person`] records and drops the ones
//! that live under an excluded container.

use ldap3::SearchEntry;
use serde::{Deserialize, Serialize};

use crate::config::ExclusionPolicy;
use crate::dn::ous_from_dn;

/// Person record sent to the consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Full distinguished name
    pub dn: String,
    /// Every identifier the entry carries, in directory order
    pub uid: Vec<String>,
    /// Given name
    pub first_name: String,
    /// Surname
    pub last_name: String,
    /// Organizational status
    pub org_status: String,
    /// Organizational units from the DN, most specific first
    pub ous: Vec<String>,
}

/// Entry translator
#[derive(Debug, Clone, Default)]
pub struct EntryTranslator {
    policy: ExclusionPolicy,
}

impl EntryTranslator {
    /// Create translator applying `policy`
    pub fn new(policy: ExclusionPolicy) -> Self {
        Self { policy }
    }

    /// Exclusion policy in force
    pub fn policy(&self) -> &ExclusionPolicy {
        &self.policy
    }

    /// Translate one entry, or `None` if it is out of scope
    pub fn translate(&self, entry: &SearchEntry) -> Option<Person> {
        let ous = ous_from_dn(&entry.dn, &self.policy.root_container);
        if self.policy.excludes(&ous) {
            tracing::debug!(dn = %entry.dn, "Skipping excluded entry");
            return None;
        }

        // Only one value is kept for the name fields; uid keeps all of them
        // since alumni carry their historical accounts.
        Some(Person {
            dn: entry.dn.clone(),
            uid: attribute_values(entry, "uid").to_vec(),
            first_name: first_value(entry, "givenName"),
            last_name: first_value(entry, "sn"),
            org_status: first_value(entry, "organizationalStatus"),
            ous,
        })
    }
}

fn attribute_values<'a>(entry: &'a SearchEntry, name: &str) -> &'a [String] {
    entry
        .attrs
        .get(name)
        .or_else(|| {
            entry
                .attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, values)| values)
        })
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn first_value(entry: &SearchEntry, name: &str) -> String {
    attribute_values(entry, name)
        .first()
        .cloned()
        .unwrap_or_default()
}
