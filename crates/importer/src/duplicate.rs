use chrono::NaiveDate;
use std::collections::HashMap;

use crate::normalize::normalize_text;

/// Identity of an athlete for duplicate detection: (name, date of birth, dojo).
///
/// Name and dojo are compared lower-cased with whitespace collapsed. Gender and
/// competition day are not part of the key, so re-entering an athlete
/// with a different day is reported as a duplicate rather than registered twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateKey {
    name: String,
    dob: NaiveDate,
    dojo: String,
}

impl DuplicateKey {
    pub fn new(name: &str, dob: NaiveDate, dojo: &str) -> Self {
        Self {
            name: normalize_text(name),
            dob,
            dojo: normalize_text(dojo),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dob(&self) -> NaiveDate {
        self.dob
    }

    pub fn dojo(&self) -> &str {
        &self.dojo
    }
}

/// Lookup into already-persisted athletes, supplied by the caller.
pub trait DuplicateLookup {
    /// Returns the `unique_id` of the persisted athlete with this key, if any.
    fn find(&self, key: &DuplicateKey) -> Option<i32>;

    fn exists(&self, key: &DuplicateKey) -> bool {
        self.find(key).is_some()
    }
}

impl<F> DuplicateLookup for F
where
    F: Fn(&DuplicateKey) -> Option<i32>,
{
    fn find(&self, key: &DuplicateKey) -> Option<i32> {
        self(key)
    }
}

/// Lookup for validation without a database: nothing is persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersisted;

impl DuplicateLookup for NoPersisted {
    fn find(&self, _key: &DuplicateKey) -> Option<i32> {
        None
    }
}

/// Snapshot of persisted keys, loaded once before a batch runs.
#[derive(Debug, Clone, Default)]
pub struct PersistedKeys {
    keys: HashMap<DuplicateKey, i32>,
}

impl PersistedKeys {
    pub fn insert(&mut self, key: DuplicateKey, unique_id: i32) {
        self.keys.entry(key).or_insert(unique_id);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl DuplicateLookup for PersistedKeys {
    fn find(&self, key: &DuplicateKey) -> Option<i32> {
        self.keys.get(key).copied()
    }
}

impl FromIterator<(DuplicateKey, i32)> for PersistedKeys {
    fn from_iter<I: IntoIterator<Item = (DuplicateKey, i32)>>(iter: I) -> Self {
        let mut keys = Self::default();
        for (key, unique_id) in iter {
            keys.insert(key, unique_id);
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dob() -> NaiveDate {
        NaiveDate::from_ymd_opt(2010, 5, 15).unwrap()
    }

    #[test]
    fn test_key_ignores_case_and_spacing() {
        let a = DuplicateKey::new("John  Doe", dob(), "Dragon Dojo");
        let b = DuplicateKey::new(" john doe ", dob(), "DRAGON   dojo");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_distinguishes_dob_and_dojo() {
        let a = DuplicateKey::new("John Doe", dob(), "Dragon Dojo");
        let other_day = NaiveDate::from_ymd_opt(2010, 5, 16).unwrap();
        assert_ne!(a, DuplicateKey::new("John Doe", other_day, "Dragon Dojo"));
        assert_ne!(a, DuplicateKey::new("John Doe", dob(), "Phoenix"));
    }

    #[test]
    fn test_persisted_keys_lookup() {
        let keys: PersistedKeys = [(DuplicateKey::new("Jane Smith", dob(), "Phoenix"), 7)]
            .into_iter()
            .collect();
        assert_eq!(keys.find(&DuplicateKey::new("JANE SMITH", dob(), "phoenix")), Some(7));
        assert!(!keys.exists(&DuplicateKey::new("Jane Smyth", dob(), "Phoenix")));
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_closure_lookup() {
        let lookup = |key: &DuplicateKey| (key.name() == "john doe").then_some(3);
        assert!(lookup.exists(&DuplicateKey::new("John Doe", dob(), "X")));
        assert!(!NoPersisted.exists(&DuplicateKey::new("John Doe", dob(), "X")));
    }
}
