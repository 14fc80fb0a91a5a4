//! Derive roster fields from heterogeneous person records and flag
//! data-quality gaps.

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::fields::first_text;
use crate::models::{DataIssue, GroupTally, IssueKind, NormalizedPerson, RawRecord, PLACEHOLDER_PREFIX};

const IDENTITY_KEYS: &[&str] = &["studentId", "student_id", "admissionNumber", "rollNumber"];

/// Internal identifiers that seed a placeholder identity, never shown as-is.
const INTERNAL_ID_KEYS: &[&str] = &["_id", "id", "uid"];

const NAME_KEYS: &[&str] = &["name", "fullName", "full_name", "studentName"];

const FIRST_NAME_KEYS: &[&str] = &["firstName", "first_name"];

const LAST_NAME_KEYS: &[&str] = &["lastName", "last_name"];

const CONTACT_KEYS: &[&str] = &["email", "phone", "contact", "mobile", "parentEmail", "parentPhone"];

const GROUP_KEYS: &[&str] = &["className", "class", "grade", "section", "group"];

/// Output of [`classify`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub normalized: Vec<NormalizedPerson>,
    pub tally: GroupTally,
    pub issues: Vec<DataIssue>,
}

/// Normalize every person record, tally groups, and collect one issue per
/// missing required field per person.
pub fn classify(persons: &[RawRecord]) -> Classification {
    let mut result = Classification::default();

    for record in persons {
        let person = normalize_person(record);

        if let Some(group) = &person.group {
            *result.tally.entry(group.clone()).or_insert(0) += 1;
        }

        let missing = [
            (person.display_name.is_none(), IssueKind::MissingName),
            (person.contact.is_none(), IssueKind::MissingContact),
            (person.group.is_none(), IssueKind::NoGroupAssigned),
        ];
        for (is_missing, problem) in missing {
            if is_missing {
                result.issues.push(DataIssue {
                    identity: person.identity.clone(),
                    display_name: person.display_name.clone(),
                    problem,
                    source_record: record.clone(),
                });
            }
        }

        result.normalized.push(person);
    }

    result
}

pub fn normalize_person(record: &Value) -> NormalizedPerson {
    let display_name = display_name(record);
    let contact = first_text(record, CONTACT_KEYS);
    let group = first_text(record, GROUP_KEYS);
    let identity = first_text(record, IDENTITY_KEYS)
        .unwrap_or_else(|| placeholder_identity(record, display_name.as_deref(), contact.as_deref()));

    NormalizedPerson {
        identity,
        display_name,
        contact,
        group,
    }
}

fn display_name(record: &Value) -> Option<String> {
    if let Some(name) = first_text(record, NAME_KEYS) {
        return Some(name);
    }
    let parts: Vec<String> = [FIRST_NAME_KEYS, LAST_NAME_KEYS]
        .iter()
        .filter_map(|keys| first_text(record, keys))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// `UNKNOWN-<8 hex>` seeded by an internal id, else by name/contact, else random.
fn placeholder_identity(record: &Value, name: Option<&str>, contact: Option<&str>) -> String {
    let seed = first_text(record, INTERNAL_ID_KEYS).or_else(|| {
        let fragments: Vec<&str> = [name, contact].into_iter().flatten().collect();
        if fragments.is_empty() {
            None
        } else {
            Some(fragments.join("|"))
        }
    });

    let hex = match seed {
        Some(seed) => {
            let digest = Sha256::digest(seed.as_bytes());
            digest[..4].iter().map(|b| format!("{:02x}", b)).collect::<String>()
        }
        None => format!("{:08x}", rand::random::<u32>()),
    };
    format!("{}{}", PLACEHOLDER_PREFIX, hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn problems(issues: &[DataIssue]) -> Vec<IssueKind> {
        issues.iter().map(|i| i.problem).collect()
    }

    #[test]
    fn test_complete_record_has_no_issues() {
        let result = classify(&[json!({
            "studentId": "S-1",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "className": "7A"
        })]);
        assert!(result.issues.is_empty());
        assert_eq!(result.normalized[0].identity, "S-1");
        assert_eq!(result.tally.get("7A"), Some(&1));
    }

    #[test]
    fn test_one_issue_per_missing_field_in_every_combination() {
        for mask in 0u8..8 {
            let mut record = serde_json::Map::new();
            record.insert("studentId".into(), json!(format!("S{}", mask)));
            if mask & 1 == 0 {
                record.insert("name".into(), json!("Grace"));
            }
            if mask & 2 == 0 {
                record.insert("phone".into(), json!("555-0100"));
            }
            if mask & 4 == 0 {
                record.insert("class".into(), json!("8B"));
            }

            let result = classify(&[Value::Object(record)]);
            let mut expected = Vec::new();
            if mask & 1 != 0 {
                expected.push(IssueKind::MissingName);
            }
            if mask & 2 != 0 {
                expected.push(IssueKind::MissingContact);
            }
            if mask & 4 != 0 {
                expected.push(IssueKind::NoGroupAssigned);
            }
            assert_eq!(result.issues.len(), mask.count_ones() as usize);
            assert_eq!(problems(&result.issues), expected, "mask {:03b}", mask);
        }
    }

    #[test]
    fn test_group_is_trimmed_and_blank_means_none() {
        let result = classify(&[
            json!({"studentId": "1", "className": "  7A "}),
            json!({"studentId": "2", "className": "7A"}),
            json!({"studentId": "3", "className": "   "}),
            json!({"studentId": "4", "grade": 9}),
            json!({"studentId": "5"}),
        ]);

        assert_eq!(result.tally.len(), 2);
        assert_eq!(result.tally.get("7A"), Some(&2));
        assert_eq!(result.tally.get("9"), Some(&1));
        assert!(!result.tally.contains_key(""));

        let grouped = result.normalized.iter().filter(|p| p.group.is_some()).count();
        assert_eq!(result.tally.values().sum::<usize>(), grouped);

        let no_group = result
            .issues
            .iter()
            .filter(|i| i.problem == IssueKind::NoGroupAssigned)
            .count();
        assert_eq!(no_group, 2);
    }

    #[test]
    fn test_identity_fallback_chain() {
        let person = normalize_person(&json!({"rollNumber": 12, "admissionNumber": "A-9"}));
        assert_eq!(person.identity, "A-9");

        let person = normalize_person(&json!({"student_id": " ", "rollNumber": 12}));
        assert_eq!(person.identity, "12");
    }

    #[test]
    fn test_placeholder_identity_is_deterministic() {
        let record = json!({"_id": "64f0c2a9e1", "name": "No Id"});
        let a = normalize_person(&record);
        let b = normalize_person(&record);
        assert_eq!(a.identity, b.identity);
        assert!(a.identity.starts_with("UNKNOWN-"));
        assert_eq!(a.identity.len(), "UNKNOWN-".len() + 8);
        assert!(a.identity["UNKNOWN-".len()..].chars().all(|c| c.is_ascii_hexdigit()));

        let by_name = normalize_person(&json!({"name": "Only A Name"}));
        assert_eq!(by_name.identity, normalize_person(&json!({"name": "Only A Name"})).identity);
    }

    #[test]
    fn test_empty_record_still_gets_identity() {
        let person = normalize_person(&json!({}));
        assert!(person.has_placeholder_identity());
        assert_eq!(person.identity.len(), "UNKNOWN-".len() + 8);

        let result = classify(&[json!("not even an object")]);
        assert_eq!(result.issues.len(), 3);
        assert!(!result.normalized[0].identity.is_empty());
    }

    #[test]
    fn test_name_from_parts() {
        let person = normalize_person(&json!({"firstName": "Alan", "last_name": "Turing"}));
        assert_eq!(person.display_name.as_deref(), Some("Alan Turing"));
    }
}
