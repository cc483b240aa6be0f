use polars::prelude::PolarsError;
use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The response body could not be parsed as JSON.
    #[snafu(display("malformed response body: {}", source))]
    MalformedResponse { source: serde_json::Error },

    /// The explanation tree does not match the typed explanation model.
    #[snafu(display("malformed explanation: {}", source))]
    MalformedExplanation { source: serde_json::Error },

    /// A projected column is absent from every row.
    #[snafu(display("column not found: `{}`", column))]
    ColumnNotFound { column: String },

    #[snafu(display("dataframe error: {}", source))]
    Dataframe { source: PolarsError },
}
