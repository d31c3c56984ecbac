use std::io;

use thiserror::Error;

/// Pipeline stage names carried by [`SurveyError::Stage`].
pub const STAGE_NORMALIZE: &str = "normalize";
pub const STAGE_REGION: &str = "region";
pub const STAGE_SENTIMENT: &str = "sentiment";
pub const STAGE_CLUSTER: &str = "cluster";

/// Fatal errors. Any of these aborts the run; there is no partial output.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("schema error: missing column '{0}'")]
    MissingColumn(String),
    #[error("schema error: column '{0}' appears twice after header normalization")]
    DuplicateColumn(String),
    #[error("schema error: row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("normalization error: column '{column}' row {row}: cannot parse '{value}' as a number")]
    Numeric {
        column: String,
        row: usize,
        value: String,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<SurveyError>,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SurveyError {
    /// Attach the name of the stage that failed.
    pub fn at(self, stage: &'static str) -> Self {
        match self {
            already @ SurveyError::Stage { .. } => already,
            other => SurveyError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}

/// Per-record oracle failures. Recovered by the scorer, never fatal.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle i/o failure: {0}")]
    Io(#[from] io::Error),
    #[error("oracle closed its output stream")]
    Closed,
    #[error("oracle returned an undecodable response: {0}")]
    Protocol(String),
    #[error("oracle label '{0}' does not start with a star digit")]
    MalformedLabel(String),
    #[error("oracle failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, SurveyError>;
