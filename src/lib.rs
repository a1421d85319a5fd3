//! # Springboard - request-target building for HTTP API clients
//!
//! Springboard provides a [`Uri`] value type for building request targets and a
//! [`Response`] wrapper for reading JSON replies. It does not send requests;
//! hand the finished [`Uri`] to your HTTP client (for example `reqwest`) and wrap
//! what comes back.
//!
//! ## Quick Start
//!
//! ```
//! use springboard::{query::QueryValues, Uri};
//!
//! # fn main() -> Result<(), springboard::Error> {
//! let base = Uri::parse("https://api.example.com/v1/")?;
//!
//! // Exactly one slash between base path and segment, however they are written
//! let mut uri = base.subpath("/users")?;
//!
//! // Arrays get a `[]` suffix, booleans become "true"/"false"
//! uri.merge_query_values(
//!     QueryValues::new()
//!         .with("ids", vec![1, 2])
//!         .with("active", true),
//! );
//!
//! assert_eq!(
//!     uri.as_str(),
//!     "https://api.example.com/v1/users?ids[]=1&ids[]=2&active=true"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Slash-safe joining** - [`Uri::subpath`] never doubles or drops the separating slash
//! - **Nested query merging** - Arrays, booleans and nested maps via [`query::QueryValue`]
//! - **Reference resolution** - [`Uri::join`] follows RFC 3986
//! - **Lazy JSON bodies** - [`Response::body`] parses once, on first access
//! - **Raw data preserved** - Failed parses keep the raw body and status for debugging
//! - **Structured logging** - Uses `tracing`; install any subscriber to see it
//!
//! ## Working with responses
//!
//! ```no_run
//! use springboard::{Error, Response, Uri};
//!
//! # async fn example() -> Result<(), Error> {
//! let uri = Uri::parse("https://api.example.com")?.subpath("status")?;
//! let response = Response::from_reqwest(reqwest::get(uri.into_url()).await?).await?;
//!
//! match response.get("healthy") {
//!     Ok(Some(healthy)) => println!("Healthy: {}", healthy),
//!     Ok(None) => println!("No health field"),
//!     Err(Error::DeserializationFailed { raw_response, .. }) => {
//!         eprintln!("Not JSON: {}", raw_response);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod query;
mod response;
mod uri;

pub use error::{Error, Result};
pub use query::{QueryValue, QueryValues};
pub use response::{Body, Response};
pub use uri::{IntoUri, Uri};
