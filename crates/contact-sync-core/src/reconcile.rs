//! Email-keyed matching of two contact lists.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::models::Contact;

/// Contact field that can differ between matched records.
///
/// Email is the match key and never appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictField {
    Name,
    Phone,
    Company,
}

impl ConflictField {
    pub const ALL: [Self; 3] = [Self::Name, Self::Phone, Self::Company];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Company => "company",
        }
    }

    fn value(self, contact: &Contact) -> &str {
        match self {
            Self::Name => contact.name(),
            Self::Phone => contact.phone(),
            Self::Company => contact.company(),
        }
    }
}

impl fmt::Display for ConflictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one contact (or pair) after matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    OnlyInA(Contact),
    OnlyInB(Contact),
    Matched {
        a: Contact,
        b: Contact,
        conflicts: BTreeSet<ConflictField>,
    },
}

impl MatchResult {
    pub fn has_conflicts(&self) -> bool {
        matches!(self, Self::Matched { conflicts, .. } if !conflicts.is_empty())
    }
}

/// Fields whose trimmed values differ between two contacts.
pub fn field_conflicts(a: &Contact, b: &Contact) -> BTreeSet<ConflictField> {
    ConflictField::ALL
        .into_iter()
        .filter(|field| field.value(a).trim() != field.value(b).trim())
        .collect()
}

/// Match `a` (primary) against `b` (secondary) by exact email.
///
/// Results keep list A's order, followed by the unmatched B records in B's
/// order. When B holds the same email more than once, the first record is
/// the match candidate and the rest are absorbed into that match.
pub fn reconcile(a: &[Contact], b: &[Contact]) -> Reconciliation {
    let mut index: HashMap<&str, &Contact> = HashMap::with_capacity(b.len());
    for contact in b {
        index.entry(contact.email()).or_insert(contact);
    }

    let mut probed: HashSet<&str> = HashSet::with_capacity(a.len());
    let mut results = Vec::with_capacity(a.len() + b.len());

    for contact in a {
        match index.get(contact.email()) {
            Some(other) => {
                probed.insert(contact.email());
                results.push(MatchResult::Matched {
                    a: contact.clone(),
                    b: (*other).clone(),
                    conflicts: field_conflicts(contact, other),
                });
            }
            None => results.push(MatchResult::OnlyInA(contact.clone())),
        }
    }

    results.extend(
        b.iter()
            .filter(|contact| !probed.contains(contact.email()))
            .cloned()
            .map(MatchResult::OnlyInB),
    );

    Reconciliation { results }
}

/// Full matching output plus summary counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    results: Vec<MatchResult>,
}

impl Reconciliation {
    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<MatchResult> {
        self.results
    }

    pub fn report(&self) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();
        for result in &self.results {
            match result {
                MatchResult::OnlyInA(_) => report.only_in_primary += 1,
                MatchResult::OnlyInB(_) => report.only_in_sink += 1,
                MatchResult::Matched { conflicts, .. } => {
                    report.matched += 1;
                    if !conflicts.is_empty() {
                        report.conflicts += 1;
                    }
                }
            }
        }
        report
    }
}

/// Counts of each match outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub only_in_primary: u32,
    pub only_in_sink: u32,
    pub matched: u32,
    /// Matched pairs with at least one differing field
    pub conflicts: u32,
}
