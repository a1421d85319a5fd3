//! Response wrapper that keeps the raw body and parses JSON on demand.
//!
//! The [`Response`] type owns the status, headers and body text of a transport
//! response. The body is parsed as JSON the first time it is asked for and
//! cached from then on.

use crate::{Error, Result};
use http::{HeaderMap, StatusCode, Version};
use once_cell::unsync::OnceCell;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ops::{Deref, Index};
use url::Url;

/// A read-only view of a parsed JSON body.
///
/// Indexing a missing key yields `Value::Null`, as it does for
/// [`serde_json::Value`].
#[derive(Debug, Clone, PartialEq)]
pub struct Body(Value);

impl Body {
    /// Returns the value at `index` (an object key or an array position).
    pub fn get<I: serde_json::value::Index>(&self, index: I) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl Deref for Body {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<I: serde_json::value::Index> Index<I> for Body {
    type Output = Value;

    fn index(&self, index: I) -> &Value {
        &self.0[index]
    }
}

/// A wrapper around a transport-layer HTTP response.
///
/// Status, headers, version and URL are forwarded from the transport
/// response; the body is kept as text and parsed lazily.
///
/// # Examples
///
/// ```
/// use springboard::Response;
///
/// # fn main() -> Result<(), springboard::Error> {
/// let response = Response::from(
///     http::Response::builder()
///         .status(200)
///         .body(r#"{"user": {"name": "Alice"}}"#)
///         .unwrap(),
/// );
///
/// assert!(response.is_success());
/// assert_eq!(response.body()?["user"]["name"], "Alice");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    url: Option<Url>,
    raw_body: String,
    body: OnceCell<Body>,
}

impl Response {
    /// Wraps a `reqwest` response, reading its body as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the body cannot be read.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use springboard::{Response, Uri};
    ///
    /// # async fn example() -> Result<(), springboard::Error> {
    /// let uri = Uri::parse("https://api.example.com")?.subpath("users/123")?;
    /// let response = Response::from_reqwest(reqwest::get(uri.into_url()).await?).await?;
    ///
    /// if response.is_success() {
    ///     println!("Name: {}", response.body()?["name"]);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let url = response.url().clone();

        let raw_body = response.text().await?;

        tracing::debug!(
            status = status.as_u16(),
            url = %url,
            body_len = raw_body.len(),
            "Received HTTP response"
        );

        Ok(Self {
            status,
            version,
            headers,
            url: Some(url),
            raw_body,
            body: OnceCell::new(),
        })
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value by name, if present and valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// The final URL of the request, when the transport reports one.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// The unparsed body text.
    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    pub fn into_raw_body(self) -> String {
        self.raw_body
    }

    /// Returns `true` when the status code is below 400.
    ///
    /// Unlike [`StatusCode::is_success`], informational and redirect statuses
    /// count as successful.
    pub fn is_success(&self) -> bool {
        self.status.as_u16() < 400
    }

    /// The body parsed as JSON. Parsing happens on first access only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] if the body is not valid JSON.
    /// A failed parse is not cached, so the next call parses again.
    pub fn body(&self) -> Result<&Body> {
        self.body.get_or_try_init(|| {
            serde_json::from_str(&self.raw_body)
                .map(Body)
                .map_err(|e| self.deserialization_failed(e))
        })
    }

    /// Indexes into the parsed body.
    ///
    /// # Examples
    ///
    /// ```
    /// use springboard::Response;
    ///
    /// let response = Response::from(
    ///     http::Response::builder().status(200).body(r#"{"id": 7}"#).unwrap(),
    /// );
    ///
    /// assert_eq!(response.get("id").unwrap(), Some(&serde_json::json!(7)));
    /// assert_eq!(response.get("missing").unwrap(), None);
    /// ```
    pub fn get<I: serde_json::value::Index>(&self, index: I) -> Result<Option<&Value>> {
        Ok(self.body()?.get(index))
    }

    /// Deserializes the raw body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.raw_body).map_err(|e| self.deserialization_failed(e))
    }

    fn deserialization_failed(&self, error: serde_json::Error) -> Error {
        tracing::error!(
            error = %error,
            status = self.status.as_u16(),
            raw_response = %self.raw_body,
            "Failed to deserialize response"
        );

        Error::DeserializationFailed {
            raw_response: self.raw_body.clone(),
            serde_error: error.to_string(),
            status: self.status,
        }
    }
}

impl<T: Into<String>> From<http::Response<T>> for Response {
    fn from(response: http::Response<T>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers,
            url: None,
            raw_body: body.into(),
            body: OnceCell::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde::Deserialize;

    fn response(status: u16, body: &str) -> Response {
        Response::from(http::Response::builder().status(status).body(body).unwrap())
    }

    #[test]
    fn test_is_success_boundary() {
        assert!(response(200, "").is_success());
        assert!(response(302, "").is_success());
        assert!(response(399, "").is_success());
        assert!(!response(400, "").is_success());
        assert!(!response(503, "").is_success());
    }

    #[test]
    fn test_body_is_parsed_once() {
        let response = response(200, r#"{"a": [1, 2]}"#);

        let first = response.body().unwrap() as *const Body;
        let second = response.body().unwrap() as *const Body;

        assert_eq!(first, second);
        assert_eq!(response.body().unwrap()["a"][1], 2);
    }

    #[test]
    fn test_invalid_json_keeps_raw_body() {
        let response = response(502, "<html>bad gateway</html>");

        match response.body() {
            Err(Error::DeserializationFailed {
                raw_response,
                status,
                ..
            }) => {
                assert_eq!(raw_response, "<html>bad gateway</html>");
                assert_eq!(status, StatusCode::BAD_GATEWAY);
            }
            other => panic!("Expected DeserializationFailed, got {:?}", other),
        }
        assert_eq!(response.raw_body(), "<html>bad gateway</html>");
    }

    #[test]
    fn test_missing_key_indexes_to_null() {
        let response = response(200, r#"{"a": 1}"#);
        let body = response.body().unwrap();

        assert_eq!(body["missing"], Value::Null);
        assert_eq!(body.get("missing"), None);
    }

    #[test]
    fn test_typed_json() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: u32,
        }

        let response = response(200, r#"{"id": 3}"#);
        assert_eq!(response.json::<User>().unwrap(), User { id: 3 });

        let err = response.json::<Vec<User>>().unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::OK));
        assert_eq!(err.raw_response(), Some(r#"{"id": 3}"#));
    }

    #[test]
    fn test_forwarded_headers() {
        let mut raw = http::Response::new("{}".to_string());
        raw.headers_mut()
            .insert("x-request-id", HeaderValue::from_static("abc"));

        let response = Response::from(raw);
        assert_eq!(response.header("x-request-id"), Some("abc"));
        assert_eq!(response.header("missing"), None);
        assert_eq!(response.url(), None);
    }
}
