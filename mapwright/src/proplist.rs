//! Ordered string-to-string property list for block-state properties
//! (spec.md §4.1/§4.3).
//!
//! The teacher's version (`PropList<const N: usize>`) inlines small keys and
//! values to avoid allocating for the common case of one or two short
//! properties per block state, backed by a shared byte pool. That SSO
//! machinery isn't needed at this crate's scope, so this keeps the same
//! public surface — insertion order preserved, `Display` renders
//! `key=value,...` — over a plain `Vec<(String, String)>`.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Kept as a type alias so callers that referred to `DefaultPropList` still
/// resolve; there is no inline-capacity parameter to choose anymore.
pub type DefaultPropList = PropList;

#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct PropList {
    entries: Vec<(String, String)>,
}

impl PropList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Alias kept for call sites that check membership by key alone.
    pub fn contains(&self, key: &str) -> bool {
        self.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_key_value(&self, key: &str) -> Option<(&str, &str)> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert or overwrite `key`; preserves the original position on overwrite.
    pub fn insert<K: AsRef<str>, V: AsRef<str>>(&mut self, key: K, value: V) {
        let key = key.as_ref();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value.as_ref().to_string();
        } else {
            self.entries.push((key.to_string(), value.as_ref().to_string()));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn retain<F: FnMut(&str, &str) -> bool>(&mut self, mut f: F) {
        self.entries.retain(|(k, v)| f(k, v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }
}

impl PartialOrd for PropList {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PropList {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.entries.cmp(&other.entries)
    }
}

impl FromIterator<(String, String)> for PropList {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut list = PropList::new();
        for (k, v) in iter {
            list.insert(k, v);
        }
        list
    }
}

impl fmt::Display for PropList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

struct PropListVisitor;

impl<'de> Visitor<'de> for PropListVisitor {
    type Value = PropList;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of string properties")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut list = PropList::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, String>()? {
            list.insert(key, value);
        }
        Ok(list)
    }
}

impl<'de> Deserialize<'de> for PropList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PropListVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_overwrite_preserves_position() {
        let mut list = PropList::new();
        list.insert("a", "1");
        list.insert("b", "2");
        list.insert("a", "3");
        assert_eq!(list.get("a"), Some("3"));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn display_renders_key_value_pairs() {
        let mut list = PropList::new();
        list.insert("waterlogged", "true");
        list.insert("facing", "north");
        assert_eq!(list.to_string(), "waterlogged=true,facing=north");
    }

    #[test]
    fn remove_and_retain() {
        let mut list: PropList = [("a", "1"), ("b", "2"), ("c", "3")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(list.remove("b"), Some("2".to_string()));
        assert_eq!(list.len(), 2);
        list.retain(|k, _| k != "c");
        assert_eq!(list.keys().collect::<Vec<_>>(), vec!["a"]);
    }
}
