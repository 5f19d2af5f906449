// 🚫 Ban List - Case-insensitive set of banned country names
//
// Insertion order is kept so the ban list round-trips through
// banned-countries.txt unchanged.

use serde::{Deserialize, Serialize};

/// Case-insensitive country name comparison
pub fn same_country(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BanList {
    names: Vec<String>,
}

impl BanList {
    pub fn new() -> Self {
        BanList { names: Vec::new() }
    }

    /// Build from persisted names, dropping blanks and case-insensitive repeats
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = BanList::new();
        for name in names {
            list.insert(name.as_ref());
        }
        list
    }

    pub fn contains(&self, country: &str) -> bool {
        self.names.iter().any(|n| same_country(n, country))
    }

    /// Add a country. Returns false when it was blank or already present.
    pub fn insert(&mut self, country: &str) -> bool {
        let name = country.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Remove a country, returning the stored spelling if it was present
    pub fn remove(&mut self, country: &str) -> Option<String> {
        let index = self.names.iter().position(|n| same_country(n, country))?;
        Some(self.names.remove(index))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
