use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::RawRecord;

/// Group name -> number of persons in that group. Never holds an empty key.
pub type GroupTally = BTreeMap<String, usize>;

/// An enrolled person reduced to the fields the dashboard needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPerson {
    /// Natural identifier, or an `UNKNOWN-xxxxxxxx` placeholder. Never empty.
    pub identity: String,
    pub display_name: Option<String>,
    pub contact: Option<String>,
    /// Trimmed group/class name; `None` when absent or blank.
    pub group: Option<String>,
}

impl NormalizedPerson {
    pub fn name_or_dash(&self) -> &str {
        self.display_name.as_deref().unwrap_or("-")
    }

    pub fn group_or_dash(&self) -> &str {
        self.group.as_deref().unwrap_or("-")
    }

    /// True when the identity was synthesized rather than read from the record.
    pub fn has_placeholder_identity(&self) -> bool {
        self.identity.starts_with(PLACEHOLDER_PREFIX)
    }
}

/// Prefix of synthesized identities.
pub const PLACEHOLDER_PREFIX: &str = "UNKNOWN-";

/// A required field missing from a person record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    MissingName,
    MissingContact,
    NoGroupAssigned,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueKind::MissingName => write!(f, "Missing name"),
            IssueKind::MissingContact => write!(f, "Missing contact"),
            IssueKind::NoGroupAssigned => write!(f, "No class assigned"),
        }
    }
}

/// One data-quality problem on one person. A person missing several fields
/// appears once per missing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataIssue {
    pub identity: String,
    pub display_name: Option<String>,
    pub problem: IssueKind,
    pub source_record: RawRecord,
}

/// Summary line for the issues panel, e.g. "17 issues across 9 students".
pub fn issue_summary(issues: &[DataIssue]) -> String {
    let people: std::collections::HashSet<&str> =
        issues.iter().map(|i| i.identity.as_str()).collect();
    let issue_word = if issues.len() == 1 { "issue" } else { "issues" };
    let person_word = if people.len() == 1 { "student" } else { "students" };
    format!(
        "{} {} across {} {}",
        issues.len(),
        issue_word,
        people.len(),
        person_word
    )
}
