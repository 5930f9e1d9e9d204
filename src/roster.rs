//! Closed roster of pre-registered participant names
//!
//! The roster is fixed for the lifetime of the process. Groups only matter for
//! presentation; membership is the case-sensitive union of all names.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterGroup {
    pub label: String,
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    groups: Vec<RosterGroup>,
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Failed to read roster file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse roster file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Roster group {0:?} contains an empty name")]
    EmptyName(String),

    #[error("Roster contains no names")]
    Empty,
}

#[derive(Debug, Clone, Serialize)]
pub struct Roster {
    groups: Vec<RosterGroup>,
    #[serde(skip)]
    names: HashSet<String>,
}

impl Roster {
    /// Build a roster from groups, trimming names and dropping duplicates
    pub fn new(groups: Vec<RosterGroup>) -> Result<Self, RosterError> {
        let mut names = HashSet::new();
        let mut cleaned = Vec::with_capacity(groups.len());

        for group in groups {
            let mut group_names = Vec::with_capacity(group.names.len());
            for name in group.names {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(RosterError::EmptyName(group.label));
                }
                if names.insert(name.clone()) {
                    group_names.push(name);
                } else {
                    tracing::warn!("Duplicate roster name {:?} ignored", name);
                }
            }
            cleaned.push(RosterGroup {
                label: group.label,
                names: group_names,
            });
        }

        if names.is_empty() {
            return Err(RosterError::Empty);
        }

        Ok(Self {
            groups: cleaned,
            names,
        })
    }

    /// Single unlabeled group, mostly useful for tests and tooling
    pub fn from_names<I, S>(names: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(vec![RosterGroup {
            label: "all".to_string(),
            names: names.into_iter().map(Into::into).collect(),
        }])
    }

    pub fn from_json(json: &str) -> Result<Self, RosterError> {
        let file: RosterFile = serde_json::from_str(json)?;
        Self::new(file.groups)
    }

    pub fn from_file(path: &Path) -> Result<Self, RosterError> {
        let json = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Exact, case-sensitive membership check
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn groups(&self) -> &[RosterGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_membership_is_case_sensitive() {
        let roster = Roster::from_names(["Alice", "Bob"]).unwrap();
        assert!(roster.contains("Alice"));
        assert!(!roster.contains("alice"));
        assert!(!roster.contains("Carol"));
    }

    #[test]
    fn test_names_are_trimmed_and_deduplicated() {
        let roster = Roster::new(vec![
            RosterGroup {
                label: "a".to_string(),
                names: vec!["  Alice ".to_string(), "Bob".to_string()],
            },
            RosterGroup {
                label: "b".to_string(),
                names: vec!["Bob".to_string()],
            },
        ])
        .unwrap();

        assert_eq!(roster.len(), 2);
        assert!(roster.contains("Alice"));
        assert!(roster.groups()[1].names.is_empty());
    }

    #[test]
    fn test_empty_roster_is_rejected() {
        assert!(matches!(
            Roster::from_names(Vec::<String>::new()),
            Err(RosterError::Empty)
        ));
        assert!(matches!(
            Roster::from_names(["Alice", "   "]),
            Err(RosterError::EmptyName(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"groups":[{{"label":"groom","names":["Taro"]}},{{"label":"bride","names":["Hanako"]}}]}}"#
        )
        .unwrap();

        let roster = Roster::from_file(file.path()).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.groups()[0].label, "groom");
        assert!(roster.contains("Hanako"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = Roster::from_file(Path::new("/nonexistent/roster.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/roster.json"));
    }
}
