//! Query-string values, normalization and form encoding.
//!
//! [`QueryValues`] is the decoded, string-keyed view of a URI's query string.
//! Values are [`QueryValue`]s, so nested structures can be described directly:
//!
//! ```
//! use springboard::query::QueryValues;
//!
//! let values = QueryValues::new()
//!     .with("page", 2)
//!     .with("ids", vec![1, 2])
//!     .with("active", true);
//!
//! assert_eq!(
//!     values.normalize().encode_www_form(),
//!     "page=2&ids[]=1&ids[]=2&active=true"
//! );
//! ```

use indexmap::map::{Entry, IndexMap};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt;

/// Bytes left untouched by form encoding. `[` and `]` stay literal so array and
/// nested keys read as `ids[]=1` and `filter[name]=x`.
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'[')
    .remove(b']');

/// A single value in a query mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// A boolean; normalized to the text `"true"` or `"false"`.
    Bool(bool),
    /// A scalar, already in its string form.
    Text(String),
    /// A repeated value, encoded as one `key[]=item` pair per item.
    Array(Vec<QueryValue>),
    /// A nested mapping, encoded with `key[sub]` keys.
    Map(QueryValues),
}

impl QueryValue {
    /// Returns the text of a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the items of an `Array` value.
    pub fn as_array(&self) -> Option<&[QueryValue]> {
        match self {
            QueryValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping of a `Map` value.
    pub fn as_map(&self) -> Option<&QueryValues> {
        match self {
            QueryValue::Map(map) => Some(map),
            _ => None,
        }
    }

    fn normalize(self) -> QueryValue {
        match self {
            QueryValue::Bool(flag) => QueryValue::Text(flag.to_string()),
            QueryValue::Text(text) => QueryValue::Text(text),
            QueryValue::Array(items) => {
                QueryValue::Array(items.into_iter().map(QueryValue::normalize).collect())
            }
            QueryValue::Map(map) => QueryValue::Map(map.normalize()),
        }
    }

    fn encode_into(&self, key: &str, pairs: &mut Vec<String>) {
        match self {
            QueryValue::Bool(flag) => pairs.push(encode_pair(key, &flag.to_string())),
            QueryValue::Text(text) => pairs.push(encode_pair(key, text)),
            QueryValue::Array(items) => {
                for item in items {
                    item.encode_into(key, pairs);
                }
            }
            QueryValue::Map(map) => {
                for (sub_key, value) in map {
                    value.encode_into(&nested_key(key, sub_key), pairs);
                }
            }
        }
    }
}

impl From<bool> for QueryValue {
    fn from(flag: bool) -> Self {
        QueryValue::Bool(flag)
    }
}

impl From<String> for QueryValue {
    fn from(text: String) -> Self {
        QueryValue::Text(text)
    }
}

impl From<&str> for QueryValue {
    fn from(text: &str) -> Self {
        QueryValue::Text(text.to_owned())
    }
}

impl From<&String> for QueryValue {
    fn from(text: &String) -> Self {
        QueryValue::Text(text.clone())
    }
}

macro_rules! query_value_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    QueryValue::Text(value.to_string())
                }
            }
        )*
    };
}

query_value_from_display!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char,
);

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(items: Vec<T>) -> Self {
        QueryValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<QueryValue>, const N: usize> From<[T; N]> for QueryValue {
    fn from(items: [T; N]) -> Self {
        QueryValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<QueryValue>> From<&[T]> for QueryValue {
    fn from(items: &[T]) -> Self {
        QueryValue::Array(items.iter().cloned().map(Into::into).collect())
    }
}

impl From<QueryValues> for QueryValue {
    fn from(map: QueryValues) -> Self {
        QueryValue::Map(map)
    }
}

/// An ordered, string-keyed query mapping.
///
/// Inserting a key that is already present replaces its value but keeps its
/// position; new keys are appended. Equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryValues {
    entries: IndexMap<String, QueryValue>,
}

impl QueryValues {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    ///
    /// # Examples
    ///
    /// ```
    /// use springboard::query::{QueryValue, QueryValues};
    ///
    /// let values = QueryValues::new()
    ///     .with("q", "rust")
    ///     .with("filter", QueryValues::new().with("lang", "en"));
    ///
    /// assert_eq!(values.get("q"), Some(&QueryValue::Text("rust".to_string())));
    /// assert_eq!(values.len(), 2);
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts a value, returning the previous value for the key.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<QueryValue>,
    ) -> Option<QueryValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.get(key)
    }

    /// Removes `key`, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, QueryValue> {
        self.entries.iter()
    }

    /// Iterates over the keys in order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, QueryValue> {
        self.entries.keys()
    }

    /// Shallow merge: every entry of `other` is inserted, replacing values of
    /// keys that already exist.
    pub fn merge(&mut self, other: QueryValues) {
        self.entries.extend(other.entries);
    }

    /// Rewrites the mapping into a directly encodable form.
    ///
    /// Array-valued keys get a `[]` suffix unless they already carry one,
    /// booleans become `"true"`/`"false"`, and nested mappings are normalized
    /// recursively.
    ///
    /// # Examples
    ///
    /// ```
    /// use springboard::query::{QueryValue, QueryValues};
    ///
    /// let values = QueryValues::new()
    ///     .with("tags", vec!["x", "y"])
    ///     .with("active", false)
    ///     .normalize();
    ///
    /// assert!(values.contains_key("tags[]"));
    /// assert_eq!(values.get("active"), Some(&QueryValue::Text("false".to_string())));
    /// ```
    pub fn normalize(self) -> QueryValues {
        self.entries
            .into_iter()
            .map(|(key, value)| {
                let key = match value {
                    QueryValue::Array(_) if !key.ends_with("[]") => format!("{key}[]"),
                    _ => key,
                };
                (key, value.normalize())
            })
            .collect()
    }

    /// Form-encodes the mapping as a query string.
    ///
    /// Arrays emit one pair per item under the same key; nested mappings emit
    /// `key[sub]` pairs, and `key[sub][]` when the nested key holds an array.
    /// Keys are encoded as given, so call [`normalize`](Self::normalize) first
    /// to get the `[]` suffixes.
    pub fn encode_www_form(&self) -> String {
        let mut pairs = Vec::new();
        for (key, value) in &self.entries {
            value.encode_into(key, &mut pairs);
        }
        pairs.join("&")
    }

    /// Decodes a form-encoded query string.
    ///
    /// Keys keep their literal decoded form. Keys ending in `[]` collect every
    /// occurrence into a [`QueryValue::Array`]; any other repeated key keeps its
    /// last value.
    ///
    /// # Examples
    ///
    /// ```
    /// use springboard::query::{QueryValue, QueryValues};
    ///
    /// let values = QueryValues::decode_www_form("tags[]=x&tags[]=y&q=a+b");
    ///
    /// assert_eq!(
    ///     values.get("tags[]"),
    ///     Some(&QueryValue::from(vec!["x", "y"]))
    /// );
    /// assert_eq!(values.get("q").and_then(QueryValue::as_str), Some("a b"));
    /// ```
    pub fn decode_www_form(query: &str) -> QueryValues {
        let mut values = QueryValues::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = QueryValue::Text(value.into_owned());
            if key.ends_with("[]") {
                let slot = match values.entries.entry(key.into_owned()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(QueryValue::Array(Vec::new())),
                };
                if let QueryValue::Array(items) = slot {
                    items.push(value);
                }
            } else {
                values.entries.insert(key.into_owned(), value);
            }
        }
        values
    }
}

impl fmt::Display for QueryValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode_www_form())
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = QueryValues::new();
        values.extend(iter);
        values
    }
}

impl<K: Into<String>, V: Into<QueryValue>> Extend<(K, V)> for QueryValues {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl IntoIterator for QueryValues {
    type Item = (String, QueryValue);
    type IntoIter = indexmap::map::IntoIter<String, QueryValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryValues {
    type Item = (&'a String, &'a QueryValue);
    type IntoIter = indexmap::map::Iter<'a, String, QueryValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn nested_key(outer: &str, inner: &str) -> String {
    match inner.strip_suffix("[]") {
        Some(base) => format!("{outer}[{base}][]"),
        None => format!("{outer}[{inner}]"),
    }
}

fn encode_pair(key: &str, value: &str) -> String {
    format!("{}={}", encode_component(key), encode_component(value))
}

fn encode_component(input: &str) -> String {
    // Each escaped byte arrives as its own "%XX" chunk.
    utf8_percent_encode(input, FORM_ENCODE_SET)
        .map(|chunk| if chunk == "%20" { "+" } else { chunk })
        .collect()
}
