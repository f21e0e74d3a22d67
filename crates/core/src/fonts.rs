//! Font inventory and downloaded font packages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The distinct font family names referenced by one deck.
///
/// Names are kept sorted so responses and logs are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontSet {
    names: BTreeSet<String>,
}

impl FontSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a family name. Empty names are ignored.
    ///
    /// Returns `true` if the name was not already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if name.is_empty() || self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

impl<'a> FromIterator<&'a str> for FontSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = FontSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl IntoIterator for FontSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

/// A downloaded package for one font family.
///
/// The payload is whatever the catalog returned; it is not checked to be a
/// real ZIP archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontArchive {
    pub family: String,
    pub bytes: Vec<u8>,
}

impl FontArchive {
    pub fn new(family: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            family: family.into(),
            bytes,
        }
    }

    /// File name the archive is stored under: `<family>.zip`, with path
    /// separators replaced and leading dots stripped so the name stays
    /// inside the directory it is written to.
    pub fn file_name(&self) -> String {
        let name = format!("{}.zip", self.family).replace(['/', '\\'], "_");
        name.trim_start_matches('.').to_string()
    }
}
