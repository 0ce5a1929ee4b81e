//! Notification topics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Application-defined notification category, e.g. `announcements`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Create a topic from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Topic name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Topic {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Build a topic set from names, dropping blanks and duplicates.
pub fn topic_set<I, S>(names: I) -> BTreeSet<Topic>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .map(Topic)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_set_normalizes() {
        let topics = topic_set(["exams", " announcements ", "", "exams"]);
        let names: Vec<&str> = topics.iter().map(Topic::as_str).collect();
        assert_eq!(names, vec!["announcements", "exams"]);
    }
}
