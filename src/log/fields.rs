//! Ordered key/value fields attached to log lines.
//!
//! A [`FieldSet`] keeps insertion order and unique keys. Re-inserting a key
//! replaces its value in place, so the key keeps its original position.
//!
//! Fields are usually built with the [`fields!`](crate::fields) macro, whose
//! keys are typed strings and therefore cannot be malformed. The alternating
//! form accepted by [`FieldSet::from_pairs`] mirrors the `key, value, key,
//! value` style of variadic logging APIs and is validated up front.

use {
    serde_json::Value,
    std::fmt,
    thiserror::Error,
};

/// Rejection raised by [`FieldSet::from_pairs`] for malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The alternating list does not end on a value.
    #[error("odd number of items passed as key/value pairs ({len} items)")]
    OddLength { len: usize },

    /// An item in key position is not a string.
    #[error("item {index} is used as a key but is not a string: {key}")]
    NonStringKey { index: usize, key: Value },
}

/// An ordered set of structured log fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    entries: Vec<(String, Value)>,
}

impl FieldSet {
    /// Creates an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Builds a field set from an alternating `key, value, key, value` list.
    ///
    /// Even-indexed items are keys and must be JSON strings, odd-indexed items
    /// are their values. Nothing is returned for malformed input; the error
    /// names the first offending item.
    ///
    /// ```
    /// use serde_json::json;
    /// use webframe::{FieldError, FieldSet};
    ///
    /// let set = FieldSet::from_pairs([json!("user"), json!("ann"), json!("tries"), json!(3)])?;
    /// assert_eq!(set.to_string(), "user=ann tries=3");
    ///
    /// let err = FieldSet::from_pairs([json!("user")]).unwrap_err();
    /// assert_eq!(err, FieldError::OddLength { len: 1 });
    /// # Ok::<(), FieldError>(())
    /// ```
    pub fn from_pairs<I>(items: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = Value>,
    {
        let items: Vec<Value> = items.into_iter().collect();
        if items.len() % 2 != 0 {
            return Err(FieldError::OddLength { len: items.len() });
        }

        let mut set = Self::with_capacity(items.len() / 2);
        let mut items = items.into_iter().enumerate();
        while let (Some((index, key)), Some((_, value))) = (items.next(), items.next()) {
            match key {
                Value::String(key) => set.insert(key, value),
                key => return Err(FieldError::NonStringKey { index, key }),
            }
        }
        Ok(set)
    }

    /// Inserts a field; an existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns `self ∪ other` where the fields of `other` win on conflicts.
    pub fn merge(&self, other: &FieldSet) -> FieldSet {
        let mut merged = self.clone();
        merged.extend(other.entries.iter().cloned());
        merged
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Renders `key=value` pairs separated by spaces. String values are written
/// without quotes, everything else as compact JSON.
impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, (key, value)) in self.entries.iter().enumerate() {
            if position > 0 {
                f.write_str(" ")?;
            }
            match value {
                Value::String(text) => write!(f, "{key}={text}")?,
                other => write!(f, "{key}={other}")?,
            }
        }
        Ok(())
    }
}

impl<K, V> Extend<(K, V)> for FieldSet
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FieldSet
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut set = FieldSet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for FieldSet {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Builds a [`FieldSet`](crate::FieldSet) from `key => value` pairs.
///
/// ```
/// use webframe::fields;
///
/// let set = fields!("path" => "/users", "status" => 200);
/// assert_eq!(set.to_string(), "path=/users status=200");
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::FieldSet::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut set = $crate::FieldSet::new();
        $( set.insert($key, $value); )+
        set
    }};
}
