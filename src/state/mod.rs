mod grid;

pub use grid::{Cell, Grid};
