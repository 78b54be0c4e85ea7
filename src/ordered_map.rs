//! Insertion-ordered, unique-keyed map used for converted YAML mappings.

use ahash::AHashMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

#[derive(Clone, Debug)]
struct Entry {
    key: String,
    value: Value,
    /// Entry was supplied by a `<<` merge and may still be overridden by a later merge.
    merged: bool,
}

/// Ordered sequence of `(String, Value)` pairs with unique keys.
///
/// Keys come out in the order they were first introduced. Besides plain insertion the
/// map knows how to fold in the entries of a `<<` merge source: merged entries never
/// displace explicitly inserted ones.
///
/// ```rust
/// use saphyr_json::{OrderedMap, Value};
///
/// let mut base = OrderedMap::new();
/// base.insert("a", Value::from(1i64));
/// base.insert("b", Value::from(2i64));
///
/// let mut map = OrderedMap::new();
/// map.insert("b", Value::from(20i64));
/// map.merge(base);
///
/// let keys: Vec<&str> = map.keys().collect();
/// assert_eq!(keys, ["b", "a"]);
/// assert_eq!(map.get("b"), Some(&Value::from(20i64)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct OrderedMap {
    entries: Vec<Entry>,
    index: AHashMap<String, usize>,
}

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: AHashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// True if `key` is present and was inserted explicitly rather than by a merge.
    pub(crate) fn contains_explicit(&self, key: &str) -> bool {
        self.index.get(key).is_some_and(|&i| !self.entries[i].merged)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|e| &e.value)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Insert an explicit entry.
    ///
    /// A new key is appended. An existing key keeps its position and gets the new value;
    /// the previous value is returned. Once inserted explicitly an entry is immune to
    /// later merges.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if let Some(&i) = self.index.get(&key) {
            let entry = &mut self.entries[i];
            entry.merged = false;
            return Some(std::mem::replace(&mut entry.value, value));
        }
        self.push(key, value, false);
        None
    }

    /// Fold the entries of `source` into this map as merge-supplied entries.
    ///
    /// Keys absent here are appended in `source` order. Keys that an earlier merge
    /// supplied take the value from `source`. Explicit keys are left alone.
    pub fn merge(&mut self, source: OrderedMap) {
        self.entries.reserve(source.len());
        for Entry { key, value, .. } in source.entries {
            match self.index.get(&key) {
                Some(&i) => {
                    let entry = &mut self.entries[i];
                    if entry.merged {
                        entry.value = value;
                    }
                }
                None => self.push(key, value, true),
            }
        }
    }

    fn push(&mut self, key: String, value: Value, merged: bool) {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(Entry { key, value, merged });
    }
}

/// Maps are equal when they hold the same pairs in the same order. How an entry got
/// there (explicit or merged) does not matter.
impl PartialEq for OrderedMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.key == b.key && a.value == b.value)
    }
}

/// Borrowing iterator over `(key, value)` pairs in map order.
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (e.key.as_str(), &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a OrderedMap {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over `(key, value)` pairs in map order.
pub struct IntoIter {
    inner: std::vec::IntoIter<Entry>,
}

impl Iterator for IntoIter {
    type Item = (String, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (e.key, e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl IntoIterator for OrderedMap {
    type Item = (String, Value);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.entries.into_iter(),
        }
    }
}

/// Collects explicit entries; a repeated key keeps its first position and last value.
impl<K: Into<String>> FromIterator<(K, Value)> for OrderedMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for OrderedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::from(i)
    }

    fn pairs(map: &OrderedMap) -> Vec<(String, Value)> {
        map.clone().into_iter().collect()
    }

    #[test]
    fn insert_keeps_first_position() {
        let mut map = OrderedMap::new();
        assert!(map.insert("x", int(1)).is_none());
        map.insert("y", int(2));
        assert_eq!(map.insert("x", int(3)), Some(int(1)));
        assert_eq!(
            pairs(&map),
            vec![("x".to_owned(), int(3)), ("y".to_owned(), int(2))]
        );
    }

    #[test]
    fn merge_never_overrides_explicit_keys() {
        let mut map = OrderedMap::new();
        map.insert("a", int(1));
        map.merge([("a", int(10)), ("b", int(20))].into_iter().collect());
        assert_eq!(map.get("a"), Some(&int(1)));
        assert_eq!(map.get("b"), Some(&int(20)));
        assert_eq!(map.keys().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn later_merge_overrides_earlier_merge() {
        let mut map = OrderedMap::new();
        map.merge([("k", int(1)), ("m", int(2))].into_iter().collect());
        map.merge([("k", int(3))].into_iter().collect());
        assert_eq!(map.get("k"), Some(&int(3)));
        assert_eq!(map.keys().collect::<Vec<_>>(), ["k", "m"]);
    }

    #[test]
    fn explicit_insert_pins_merged_key() {
        let mut map = OrderedMap::new();
        map.merge([("k", int(1))].into_iter().collect());
        map.insert("k", int(2));
        map.merge([("k", int(3))].into_iter().collect());
        assert_eq!(map.get("k"), Some(&int(2)));
    }

    #[test]
    fn equality_ignores_provenance() {
        let mut merged = OrderedMap::new();
        merged.merge([("a", int(1))].into_iter().collect());
        let explicit: OrderedMap = [("a", int(1))].into_iter().collect();
        assert_eq!(merged, explicit);

        let reversed: OrderedMap = [("b", int(2)), ("a", int(1))].into_iter().collect();
        let ordered: OrderedMap = [("a", int(1)), ("b", int(2))].into_iter().collect();
        assert_ne!(reversed, ordered);
    }
}
