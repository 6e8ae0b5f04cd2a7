pub mod infra;
pub mod state;

// Re-export commonly used types for convenience
pub use infra::{Heuristic, Path, PathError, PathFinder, Position, SearchConfig};
pub use state::{Cell, Grid};
