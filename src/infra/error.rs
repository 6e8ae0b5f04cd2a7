use std::fmt;

/// Why a search endpoint was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointIssue {
    OutOfBounds,
    Blocked,
}

impl fmt::Display for EndpointIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EndpointIssue::OutOfBounds => write!(formatter, "outside the grid"),
            EndpointIssue::Blocked => write!(formatter, "blocked"),
        }
    }
}

/// Errors for grid construction, grid queries and searches.
///
/// A search that finds no route is not an error: `PathFinder::find_path`
/// reports it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PathError {
    #[error("cell ({x},{y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },

    #[error("endpoint ({x},{y}) is {reason}")]
    InvalidEndpoint { x: i32, y: i32, reason: EndpointIssue },

    #[error("search aborted after {expansions} expansions")]
    SearchAborted { expansions: usize },

    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("invalid map at line {line}: {reason}")]
    InvalidMap { line: usize, reason: String },

    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: String, value: String },
}

pub type PathResult<T> = Result<T, PathError>;
