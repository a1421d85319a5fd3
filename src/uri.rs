//! The [`Uri`] value type.
//!
//! `Uri` owns a [`url::Url`] and layers request-target building on top of it:
//! slash-safe subpath joining and nested query merging. Anything the `url`
//! parser hands back is re-wrapped, so callers only ever see `Uri`.

use crate::query::QueryValues;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// An absolute URI with composable path and query operations.
///
/// `Uri` has plain value semantics: [`Clone`] produces a fully independent
/// copy, and equality compares the underlying parsed URIs.
///
/// # Examples
///
/// ```
/// use springboard::{query::QueryValues, Uri};
///
/// # fn main() -> Result<(), springboard::Error> {
/// let mut uri = Uri::parse("http://api.test/v1")?.subpath("users")?;
/// uri.merge_query_values(QueryValues::new().with("page", 2).with("ids", vec![1, 2]));
///
/// assert_eq!(uri.to_string(), "http://api.test/v1/users?page=2&ids[]=1&ids[]=2");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri {
    inner: Url,
}

/// Conversion into a [`Uri`], used by [`Uri::parse`] and [`Uri::join`].
///
/// Strings are parsed; `Uri` and `Url` values are taken (or copied) as they are.
pub trait IntoUri {
    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`] if a string cannot be parsed.
    fn into_uri(self) -> Result<Uri>;
}

impl IntoUri for Uri {
    fn into_uri(self) -> Result<Uri> {
        Ok(self)
    }
}

impl IntoUri for &Uri {
    fn into_uri(self) -> Result<Uri> {
        Ok(self.clone())
    }
}

impl IntoUri for Url {
    fn into_uri(self) -> Result<Uri> {
        Ok(Uri::from(self))
    }
}

impl IntoUri for &Url {
    fn into_uri(self) -> Result<Uri> {
        Ok(Uri::from(self.clone()))
    }
}

impl IntoUri for &str {
    fn into_uri(self) -> Result<Uri> {
        Url::parse(self)
            .map(Uri::from)
            .map_err(|e| Error::invalid_uri(self, e))
    }
}

impl IntoUri for &String {
    fn into_uri(self) -> Result<Uri> {
        self.as_str().into_uri()
    }
}

impl IntoUri for String {
    fn into_uri(self) -> Result<Uri> {
        self.as_str().into_uri()
    }
}

impl Uri {
    /// Parses a string into a `Uri`, or copies an existing one.
    ///
    /// Relative references such as `/users` have no base to resolve against
    /// and are rejected; pass them to [`join`](Self::join) or
    /// [`subpath`](Self::subpath) instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`] if the input cannot be parsed.
    ///
    /// # Examples
    ///
    /// ```
    /// use springboard::Uri;
    ///
    /// let uri = Uri::parse("https://api.example.com/v1").unwrap();
    /// let copy = Uri::parse(&uri).unwrap();
    /// assert_eq!(uri, copy);
    ///
    /// assert!(Uri::parse("::nope").is_err());
    /// ```
    pub fn parse(input: impl IntoUri) -> Result<Uri> {
        let uri = input.into_uri()?;
        tracing::trace!(uri = %uri, "Parsed URI");
        Ok(uri)
    }

    /// Resolves each of `parts` against `base`, left to right.
    ///
    /// Resolution follows RFC 3986 reference resolution, so an absolute part
    /// replaces everything before it and a relative part replaces the last
    /// path segment unless the path ends in `/`. With no parts, this is
    /// [`parse`](Self::parse) of `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`] if `base` cannot be parsed or a part cannot
    /// be resolved.
    ///
    /// # Examples
    ///
    /// ```
    /// use springboard::Uri;
    ///
    /// let uri = Uri::join("http://a/b/c", ["d/", "e"]).unwrap();
    /// assert_eq!(uri.as_str(), "http://a/b/d/e");
    ///
    /// let uri = Uri::join("http://a/b", ["http://other/x"]).unwrap();
    /// assert_eq!(uri.as_str(), "http://other/x");
    /// ```
    pub fn join<B, I>(base: B, parts: I) -> Result<Uri>
    where
        B: IntoUri,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        parts
            .into_iter()
            .try_fold(base.into_uri()?, |uri, part| uri.resolve(part.as_ref()))
    }

    /// Resolves a single reference against this URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`] if the reference cannot be resolved.
    pub fn resolve(&self, reference: &str) -> Result<Uri> {
        self.inner
            .join(reference)
            .map(Uri::from)
            .map_err(|e| Error::invalid_uri(reference, e))
    }

    /// Returns a new `Uri` with `segment` appended to the path.
    ///
    /// Exactly one `/` separates the existing path from the segment, whether or
    /// not the path ends with one or the segment starts with one. As with any
    /// reference resolution, the receiver's query and fragment are not carried
    /// over. The receiver is left untouched. A `:` in the first segment stays
    /// part of the path rather than being read as a scheme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`] if this URI cannot act as a base (for
    /// example `mailto:` URIs) or the segment is not a valid reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use springboard::Uri;
    ///
    /// let base = Uri::parse("http://api.test/v1").unwrap();
    /// assert_eq!(base.subpath("users").unwrap().as_str(), "http://api.test/v1/users");
    /// assert_eq!(base.subpath("/users").unwrap().as_str(), "http://api.test/v1/users");
    ///
    /// let base = Uri::parse("http://api.test/v1/").unwrap();
    /// assert_eq!(base.subpath("/users/").unwrap().as_str(), "http://api.test/v1/users/");
    /// ```
    pub fn subpath(&self, segment: impl AsRef<str>) -> Result<Uri> {
        let mut base = self.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let segment = segment.as_ref().trim_start_matches('/');
        // "./" keeps `items:batchGet` from parsing as a scheme
        let uri = Uri::join(base, [format!("./{segment}")])?;

        tracing::debug!(base = %self, segment, uri = %uri, "Joined subpath");
        Ok(uri)
    }

    /// Merges `values` into the existing query parameters.
    ///
    /// `values` is normalized first (see [`QueryValues::normalize`]); on key
    /// conflicts the incoming value wins. Existing keys keep their position and
    /// new keys are appended.
    ///
    /// # Examples
    ///
    /// ```
    /// use springboard::{query::QueryValues, Uri};
    ///
    /// let mut uri = Uri::parse("http://a/search?q=rust&page=1").unwrap();
    /// uri.merge_query_values(QueryValues::new().with("page", 2).with("exact", true));
    ///
    /// assert_eq!(uri.query(), Some("q=rust&page=2&exact=true"));
    /// ```
    pub fn merge_query_values(&mut self, values: QueryValues) {
        let mut merged = self.query_values().unwrap_or_default();
        merged.merge(values.normalize());

        tracing::trace!(uri = %self, query = %merged, "Merging query values");
        self.set_query_values(merged);
    }

    /// Returns the decoded query parameters, or `None` if there is no query.
    ///
    /// See [`QueryValues::decode_www_form`] for how keys are decoded.
    pub fn query_values(&self) -> Option<QueryValues> {
        self.query().map(QueryValues::decode_www_form)
    }

    /// Replaces the whole query with the normalized, form-encoded `values`.
    ///
    /// # Examples
    ///
    /// ```
    /// use springboard::{query::QueryValues, Uri};
    ///
    /// let mut uri = Uri::parse("http://a/?old=1").unwrap();
    /// uri.set_query_values(QueryValues::new().with("tags", vec!["x", "y"]));
    ///
    /// assert_eq!(uri.as_str(), "http://a/?tags[]=x&tags[]=y");
    /// ```
    pub fn set_query_values(&mut self, values: QueryValues) {
        let encoded = Uri::form_encode(values);
        self.inner.set_query(Some(&encoded));
    }

    /// Normalizes and form-encodes `values` without touching any URI.
    pub fn form_encode(values: QueryValues) -> String {
        values.normalize().encode_www_form()
    }

    /// The path, always starting with `/` for URIs with an authority.
    pub fn path(&self) -> &str {
        self.inner.path()
    }

    /// Replaces the path; the `url` parser percent-encodes as needed.
    pub fn set_path(&mut self, path: &str) {
        self.inner.set_path(path);
    }

    /// The raw (still encoded) query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.inner.query()
    }

    /// Replaces the raw query string, or removes it with `None`.
    pub fn set_query(&mut self, query: Option<&str>) {
        self.inner.set_query(query);
    }

    /// The fragment, without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.inner.fragment()
    }

    /// Replaces the fragment, or removes it with `None`.
    pub fn set_fragment(&mut self, fragment: Option<&str>) {
        self.inner.set_fragment(fragment);
    }

    /// The scheme, lowercased.
    pub fn scheme(&self) -> &str {
        self.inner.scheme()
    }

    /// The host as text, if the URI has one.
    pub fn host_str(&self) -> Option<&str> {
        self.inner.host_str()
    }

    /// The port, or the scheme's default port when none is given.
    pub fn port(&self) -> Option<u16> {
        self.inner.port_or_known_default()
    }

    /// The serialized URI.
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// Borrows the underlying [`Url`], e.g. to hand it to an HTTP client.
    pub fn as_url(&self) -> &Url {
        &self.inner
    }

    /// Unwraps the underlying [`Url`].
    pub fn into_url(self) -> Url {
        self.inner
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uri::parse(s)
    }
}

impl TryFrom<&str> for Uri {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Uri::parse(value)
    }
}

impl TryFrom<String> for Uri {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Uri::parse(value)
    }
}

impl From<Url> for Uri {
    fn from(inner: Url) -> Self {
        Self { inner }
    }
}

impl From<Uri> for Url {
    fn from(uri: Uri) -> Self {
        uri.inner
    }
}

impl AsRef<str> for Uri {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<Url> for Uri {
    fn as_ref(&self) -> &Url {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        Uri::parse(s).unwrap()
    }

    #[test]
    fn test_parse_copy_is_independent() {
        let original = uri("http://a/b?x=1");
        let mut copy = Uri::parse(&original).unwrap();
        copy.set_path("/changed");
        copy.merge_query_values(QueryValues::new().with("y", 2));

        assert_eq!(original.as_str(), "http://a/b?x=1");
        assert_eq!(copy.as_str(), "http://a/changed?x=1&y=2");
    }

    #[test]
    fn test_parse_rejects_relative_reference() {
        let err = Uri::parse("/users").unwrap_err();
        match err {
            Error::InvalidUri { input, source } => {
                assert_eq!(input, "/users");
                assert_eq!(source, url::ParseError::RelativeUrlWithoutBase);
            }
            other => panic!("Expected InvalidUri, got {:?}", other),
        }
    }

    #[test]
    fn test_join_without_parts_is_parse() {
        let joined = Uri::join("http://a/b", std::iter::empty::<&str>()).unwrap();
        assert_eq!(joined, uri("http://a/b"));
    }

    #[test]
    fn test_join_accepts_uris_as_parts() {
        let other = uri("https://b/c");
        let joined = Uri::join("http://a/b", [&other]).unwrap();
        assert_eq!(joined, other);
    }

    #[test]
    fn test_join_reports_failing_part() {
        let err = Uri::join("http://a/", ["http://[::1"]).unwrap_err();
        match err {
            Error::InvalidUri { input, .. } => assert_eq!(input, "http://[::1"),
            other => panic!("Expected InvalidUri, got {:?}", other),
        }
    }

    #[test]
    fn test_subpath_single_slash_for_all_combinations() {
        for base in ["http://a/v1", "http://a/v1/"] {
            for segment in ["users", "/users", "//users"] {
                let joined = uri(base).subpath(segment).unwrap();
                assert_eq!(joined.path(), "/v1/users", "base {base}, segment {segment}");
            }
        }
    }

    #[test]
    fn test_subpath_on_root_and_nested_segments() {
        assert_eq!(uri("http://a").subpath("b/c").unwrap().as_str(), "http://a/b/c");
        assert_eq!(
            uri("http://a/x").subpath("b/").unwrap().as_str(),
            "http://a/x/b/"
        );
    }

    #[test]
    fn test_subpath_does_not_mutate_receiver() {
        let base = uri("http://a/v1?token=t");
        let joined = base.subpath("users").unwrap();

        assert_eq!(base.as_str(), "http://a/v1?token=t");
        assert_eq!(joined.as_str(), "http://a/v1/users");
    }

    #[test]
    fn test_subpath_fails_on_cannot_be_a_base() {
        let err = uri("mailto:someone@example.com").subpath("x").unwrap_err();
        assert!(err.is_invalid_uri());
    }

    #[test]
    fn test_query_values_none_without_query() {
        assert_eq!(uri("http://a/b").query_values(), None);
        assert_eq!(uri("http://a/b?").query_values(), Some(QueryValues::new()));
    }

    #[test]
    fn test_merge_query_values_is_idempotent() {
        let values = QueryValues::new().with("a", 1).with("ids", vec![1, 2]);

        let mut once = uri("http://a/b");
        once.merge_query_values(values.clone());

        let mut twice = once.clone();
        twice.merge_query_values(values);

        assert_eq!(once, twice);
        assert_eq!(twice.query(), Some("a=1&ids[]=1&ids[]=2"));
    }

    #[test]
    fn test_merge_replaces_existing_array() {
        let mut target = uri("http://a/b?ids[]=1&ids[]=2&q=x");
        target.merge_query_values(QueryValues::new().with("ids", vec![3]));

        assert_eq!(target.query(), Some("ids[]=3&q=x"));
    }

    #[test]
    fn test_set_query_values_replaces_query() {
        let mut target = uri("http://a/b?old=1#frag");
        target.set_query_values(QueryValues::new().with("new", 2));

        assert_eq!(target.as_str(), "http://a/b?new=2#frag");
    }

    #[test]
    fn test_round_trip_after_query_write() {
        let mut target = uri("http://a/b");
        target.set_query_values(
            QueryValues::new()
                .with("q", "a b")
                .with("f", QueryValues::new().with("ids", vec![1])),
        );

        assert_eq!(uri(&target.to_string()), target);
    }

    #[test]
    fn test_serde_as_string() {
        let target = uri("http://a/b?c=d");
        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(json, "\"http://a/b?c=d\"");

        let back: Uri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, target);
    }
}
