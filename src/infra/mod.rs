mod config;
mod error;
mod pathfinding;
mod types;

pub use config::{HEURISTIC_KEY, Heuristic, MAX_EXPANSIONS_KEY, SearchConfig};
pub use error::{EndpointIssue, PathError, PathResult};
pub use pathfinding::{Path, PathFinder};
pub use types::Position;
