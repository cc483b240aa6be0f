use std::borrow::Cow;
use std::io::Cursor;

use lazy_static::lazy_static;
use polars::prelude::{DataFrame, JsonReader, SerReader};
use serde_json::{Map, Value};
use snafu::ResultExt;
use tracing::trace;

use crate::error::{ColumnNotFound, Dataframe, Error, MalformedResponse};
use crate::response::RawResponse;

lazy_static! {
    static ref EMPTY_OBJECT: Map<String, Value> = Map::new();
}

/// Wrapper around an Elasticsearch search response.
///
/// Parses the response body once at construction and exposes the hits, their
/// identifiers, scores and `_source` fields, either as JSON views or as a
/// polars [`DataFrame`]. Absent fields default to empty containers or zero,
/// partial responses are not an error.
#[derive(Debug)]
pub struct SearchResults<R> {
    response: R,
    json: Value,
}

impl<R: RawResponse> SearchResults<R> {
    /// Wraps a search response, parsing its body as JSON.
    pub fn new(response: R) -> Result<Self, Error> {
        let json = serde_json::from_slice(response.body()).context(MalformedResponse)?;
        trace!("parsed search response body");
        Ok(SearchResults { response, json })
    }

    /// Status code of the underlying transport response.
    pub fn status_code(&self) -> u16 {
        self.response.status_code()
    }

    /// The wrapped response, unmodified.
    pub fn raw(&self) -> &R {
        &self.response
    }

    /// The `hits.hits` array, empty if the response has no hits section.
    pub fn hits(&self) -> &[Value] {
        self.json
            .get("hits")
            .and_then(|hits| hits.get("hits"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total hit count (`hits.total.value`), 0 if absent at any level.
    pub fn total(&self) -> u64 {
        self.json
            .get("hits")
            .and_then(|hits| hits.get("total"))
            .and_then(|total| total.get("value"))
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Document `_id`s in hit order. A hit without a string `_id` yields an
    /// empty identifier.
    pub fn get_ids(&self) -> Vec<&str> {
        self.hits()
            .iter()
            .map(|hit| hit.get("_id").and_then(Value::as_str).unwrap_or_default())
            .collect()
    }

    /// The `_source` object of every hit, in hit order.
    ///
    /// With both flags off the source objects are borrowed from the response.
    /// Turning `include_id` or `include_score` on copies each source and
    /// merges the hit's `_id` / `_score` in under those keys, overwriting any
    /// pre-existing field of the same name. A hit without a `_source` object
    /// contributes an empty map.
    pub fn get_sources(
        &self,
        include_id: bool,
        include_score: bool,
    ) -> Vec<Cow<'_, Map<String, Value>>> {
        self.hits()
            .iter()
            .map(|hit| {
                let source = hit
                    .get("_source")
                    .and_then(Value::as_object)
                    .unwrap_or(&EMPTY_OBJECT);

                if !include_id && !include_score {
                    return Cow::Borrowed(source);
                }

                let mut item = source.clone();
                if include_id {
                    let id = hit.get("_id").cloned().unwrap_or(Value::Null);
                    item.insert(String::from("_id"), id);
                }
                if include_score {
                    let score = hit.get("_score").cloned().unwrap_or(Value::Null);
                    item.insert(String::from("_score"), score);
                }
                Cow::Owned(item)
            })
            .collect()
    }

    /// Builds a dataframe from the hit sources, one row per hit.
    ///
    /// With `columns`, the frame is projected to exactly those columns in
    /// that order; requesting a column absent from every row is an
    /// [`Error::ColumnNotFound`].
    pub fn to_dataframe(
        &self,
        columns: Option<&[&str]>,
        include_id: bool,
        include_score: bool,
    ) -> Result<DataFrame, Error> {
        let sources = self.get_sources(include_id, include_score);

        let mut df = if sources.is_empty() {
            DataFrame::empty()
        } else {
            let buffer = serde_json::to_vec(&sources).context(MalformedResponse)?;
            JsonReader::new(Cursor::new(buffer))
                .finish()
                .context(Dataframe)?
        };

        if let Some(columns) = columns {
            for &column in columns {
                if df.column(column).is_err() {
                    return ColumnNotFound { column }.fail();
                }
            }
            df = df.select(columns.iter().copied()).context(Dataframe)?;
        }

        trace!("built dataframe from {} hits", self.hits().len());
        Ok(df)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use crate::response::BufferedResponse;
    use serde_json::json;

    fn results(body: Value) -> SearchResults<BufferedResponse> {
        let body = serde_json::to_vec(&body).expect("valid JSON body");
        SearchResults::new(BufferedResponse::new(200, body)).expect("valid search response")
    }

    #[test]
    fn should_fail_on_malformed_body() {
        let response = BufferedResponse::new(200, b"not json".to_vec());
        let err = SearchResults::new(response).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn should_default_on_missing_hits_section() {
        let results = results(json!({ "took": 2 }));
        assert_eq!(results.total(), 0);
        assert!(results.hits().is_empty());
        assert!(results.get_ids().is_empty());
    }

    #[test]
    fn should_default_to_empty_source() {
        let results = results(json!({
            "hits": { "hits": [ { "_id": "1", "_score": 0.5 } ] }
        }));
        let sources = results.get_sources(false, false);
        assert_eq!(sources.len(), 1);
        assert!(sources[0].is_empty());
    }
}
