use serde::{Deserialize, Serialize};

/// One of the backend collections read by a sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    Events,
    Staff,
    Persons,
    Notifications,
    Results,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Events,
        Source::Staff,
        Source::Persons,
        Source::Notifications,
        Source::Results,
    ];

    /// Path segment of the collection endpoint, relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Source::Events => "events",
            Source::Staff => "teachers",
            Source::Persons => "students",
            Source::Notifications => "notifications",
            Source::Results => "results",
        }
    }

    /// Domain-specific envelope keys, checked before the generic ones.
    pub fn collection_keys(&self) -> &'static [&'static str] {
        match self {
            Source::Events => &["events"],
            Source::Staff => &["teachers", "staff"],
            Source::Persons => &["students", "persons"],
            Source::Notifications => &["notifications"],
            Source::Results => &["results"],
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Events => write!(f, "Events"),
            Source::Staff => write!(f, "Staff"),
            Source::Persons => write!(f, "Students"),
            Source::Notifications => write!(f, "Notifications"),
            Source::Results => write!(f, "Results"),
        }
    }
}
