//! Convenience wrappers around Elasticsearch query responses.
//!
//! [`SearchResults`] wraps a search response and exposes its hits,
//! identifiers, scores and `_source` fields; [`ExplainResult`] wraps an
//! explain response and flattens its scoring explanation tree into
//! depth-annotated rows. Both can render their content as a polars
//! `DataFrame`.
//!
//! Neither type issues requests: they consume a response some HTTP client
//! already obtained, through the [`RawResponse`] seam.

pub mod error;
pub mod explain;
pub mod response;
pub mod results;

pub use crate::error::Error;
pub use crate::explain::{BreakdownRow, ExplainResult, Explanation};
pub use crate::response::{BufferedResponse, RawResponse};
pub use crate::results::SearchResults;
