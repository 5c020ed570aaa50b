use thiserror::Error;

/// Fatal failures of an analysis request.
///
/// Parse-time errors are not represented here: the trace parser records
/// them as ordinary derivation steps and recovers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("invalid or empty grammar")]
    EmptyGrammar,

    #[error("line {line}: empty left side")]
    MissingHead { line: usize },

    #[error("line {line}: left side contains whitespace")]
    HeadContainsWhitespace { line: usize },

    #[error("line {line}: too many arrows")]
    TooManyArrows { line: usize },

    #[error("line {line}: reserved symbol \"{name}\" cannot be a left side")]
    ReservedHead { line: usize, name: String },

    /// The input text holds a fragment that is neither a terminal nor a
    /// prefix of one.
    #[error("input contains errors: unrecognized token \"{fragment}\"")]
    InputContainsErrors { fragment: String },

    #[error("input contains errors: no tokens")]
    EmptyInput,

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::Serialization(e.to_string())
    }
}
