use crate::placeholder::PlaceholderError;
use crate::query::QueryError;

/// Errors raised while loading values or rendering the chart
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("values are not a well-formed YAML: `{0}`")]
    ValuesYaml(#[source] serde_yaml::Error),

    #[error("values must be a mapping but found [{found}]")]
    ValuesNotAMapping { found: String },

    #[error("values at [{path}] are invalid: `{source}`")]
    InvalidValues {
        path: String,
        source: serde_json::Error,
    },

    #[error("chart metadata is not a well-formed YAML: `{0}`")]
    ChartMetadata(#[source] serde_yaml::Error),

    #[error("could not find template [{0}] in chart")]
    TemplateNotFound(String),

    #[error("template [{template}] failed: {source}")]
    Placeholder {
        template: String,
        source: PlaceholderError,
    },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("manifest [{source_path}] could not be encoded: `{error}`")]
    ManifestEncoding {
        source_path: String,
        error: String,
    },

    #[error("rendered output is not a well-formed YAML stream: `{0}`")]
    ManifestStream(#[source] serde_yaml::Error),

    #[error("manifest is not a valid {kind}: `{error}`")]
    InvalidManifest { kind: String, error: serde_json::Error },
}

pub type Result<T> = std::result::Result<T, Error>;
