use lazy_static::lazy_static;
use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use snafu::ResultExt;
use tracing::trace;

use crate::error::{Dataframe, Error, MalformedExplanation, MalformedResponse};
use crate::response::RawResponse;

lazy_static! {
    static ref EMPTY_OBJECT: Map<String, Value> = Map::new();
}

/// One node of a scoring explanation tree.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Explanation {
    /// score assigned by elasticsearch for that item
    pub value: f64,
    /// description of the operation used to obtain `value` from each `details` values.
    pub description: String,
    /// contributing sub-scores, empty for leaf nodes
    #[serde(default)]
    pub details: Vec<Explanation>,
}

/// One flattened explanation node: depth in the tree, score contribution,
/// and the operation description.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRow {
    pub depth: u32,
    pub value: f64,
    pub description: String,
}

/// Wrapper around an Elasticsearch explain response.
///
/// Exposes the scoring explanation as a raw JSON object, as a typed
/// [`Explanation`] tree, and flattened into depth-annotated rows suitable for
/// tabular display.
#[derive(Debug)]
pub struct ExplainResult<R> {
    response: R,
    json: Value,
}

impl<R: RawResponse> ExplainResult<R> {
    /// Wraps an explain response, parsing its body as JSON.
    pub fn new(response: R) -> Result<Self, Error> {
        let json = serde_json::from_slice(response.body()).context(MalformedResponse)?;
        trace!("parsed explain response body");
        Ok(ExplainResult { response, json })
    }

    /// Status code of the underlying transport response.
    pub fn status_code(&self) -> u16 {
        self.response.status_code()
    }

    /// The wrapped response, unmodified.
    pub fn raw(&self) -> &R {
        &self.response
    }

    /// The root explanation object, empty if the response has none.
    pub fn explanation(&self) -> &Map<String, Value> {
        self.json
            .get("explanation")
            .and_then(Value::as_object)
            .unwrap_or(&EMPTY_OBJECT)
    }

    /// The root node's score, `None` if missing.
    pub fn score(&self) -> Option<f64> {
        self.explanation().get("value").and_then(Value::as_f64)
    }

    /// Typed view of the explanation tree.
    pub fn parsed(&self) -> Result<Explanation, Error> {
        serde_json::from_value(Value::Object(self.explanation().clone()))
            .context(MalformedExplanation)
    }

    /// Flattens the explanation tree into rows, pre-order, root at depth 0,
    /// children in source order at their parent's depth plus one.
    ///
    /// Each call walks the tree again and returns a fresh vector. The walk
    /// carries an explicit stack, so arbitrarily deep explanations do not
    /// exhaust the call stack.
    pub fn get_breakdown(&self) -> Vec<BreakdownRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<(&Map<String, Value>, u32)> = vec![(self.explanation(), 0)];

        while let Some((node, depth)) = stack.pop() {
            rows.push(BreakdownRow {
                depth,
                value: node.get("value").and_then(Value::as_f64).unwrap_or(0.0),
                description: node
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });

            if let Some(details) = node.get("details").and_then(Value::as_array) {
                // reversed so the leftmost child is popped first
                for detail in details.iter().rev() {
                    if let Some(child) = detail.as_object() {
                        stack.push((child, depth + 1));
                    }
                }
            }
        }

        rows
    }

    /// Builds a three column dataframe (`depth`, `score`, `description`),
    /// one row per flattened explanation node, in traversal order.
    pub fn to_dataframe(&self) -> Result<DataFrame, Error> {
        let rows = self.get_breakdown();

        let depth = Series::new(
            "depth",
            rows.iter().map(|row| row.depth).collect::<Vec<_>>(),
        );
        let score = Series::new(
            "score",
            rows.iter().map(|row| row.value).collect::<Vec<_>>(),
        );
        let description = Series::new(
            "description",
            rows.iter()
                .map(|row| row.description.as_str())
                .collect::<Vec<_>>(),
        );

        DataFrame::new(vec![depth, score, description]).context(Dataframe)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    use crate::response::BufferedResponse;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn explain(body: Value) -> ExplainResult<BufferedResponse> {
        let body = serde_json::to_vec(&body).expect("valid JSON body");
        ExplainResult::new(BufferedResponse::new(200, body)).expect("valid explain response")
    }

    #[test]
    fn should_fail_on_malformed_body() {
        let response = BufferedResponse::new(200, b"<html>".to_vec());
        let err = ExplainResult::new(response).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn should_default_on_missing_explanation() {
        let explain = explain(json!({ "matched": false }));
        assert!(explain.explanation().is_empty());
        assert!(explain.score().is_none());

        // walking an empty explanation still yields the root row
        let rows = explain.get_breakdown();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].depth, 0);
        assert_eq!(rows[0].description, "");
    }

    #[test]
    fn should_expose_root_score() {
        let explain = explain(json!({
            "explanation": { "value": 1.5, "description": "sum of:" }
        }));
        assert_relative_eq!(explain.score().expect("root score"), 1.5);
    }

    #[test]
    fn should_parse_typed_explanation() {
        let explain = explain(json!({
            "explanation": {
                "value": 2.0,
                "description": "sum of:",
                "details": [
                    { "value": 2.0, "description": "weight(label:gare)" }
                ]
            }
        }));

        let explanation = explain.parsed().expect("typed explanation");
        assert_eq!(explanation.description, "sum of:");
        assert_eq!(explanation.details.len(), 1);
        // leaf nodes omit `details`
        assert!(explanation.details[0].details.is_empty());
    }

    #[test]
    fn should_reject_untyped_explanation() {
        let explain = explain(json!({
            "explanation": { "description": "no value here" }
        }));
        let err = explain.parsed().unwrap_err();
        assert!(matches!(err, Error::MalformedExplanation { .. }));
    }
}
