//! Exempted path sets shared by the security filters.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// An immutable set of request paths that bypass a filter.
///
/// Matching is exact on the request path; no prefixes or patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "PathList", into = "Vec<String>")]
pub struct ExemptedPaths {
    paths: HashSet<String>,
}

/// Config-file representation: either a TOML array or one comma-delimited
/// string.
#[derive(Deserialize)]
#[serde(untagged)]
enum PathList {
    List(Vec<String>),
    Delimited(String),
}

impl From<PathList> for ExemptedPaths {
    fn from(list: PathList) -> Self {
        match list {
            PathList::List(items) => items.into_iter().collect(),
            PathList::Delimited(s) => Self::parse_delimited(&s),
        }
    }
}

impl From<ExemptedPaths> for Vec<String> {
    fn from(paths: ExemptedPaths) -> Self {
        let mut v: Vec<String> = paths.paths.into_iter().collect();
        v.sort();
        v
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExemptedPaths {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let paths = iter
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { paths }
    }
}

impl ExemptedPaths {
    /// Parse "a, b,c" into a set. Entries are trimmed; blanks are dropped.
    pub fn parse_delimited(s: &str) -> Self {
        s.split(',').collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}
