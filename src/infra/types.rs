use std::f64::consts::SQRT_2;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance.
    pub fn distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Cost of the cheapest 8-directional route on an empty grid.
    pub fn octile_distance(&self, other: &Position) -> f64 {
        let dx = (self.x - other.x).abs() as f64;
        let dy = (self.y - other.y).abs() as f64;
        dx.max(dy) + (SQRT_2 - 1.0) * dx.min(dy)
    }

    /// Euclidean distance between cell centers: 1 for orthogonal steps, √2 for diagonal ones.
    pub fn step_cost(&self, other: &Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }

    /// Orthogonal neighbors first (North, East, South, West), then the diagonals
    /// (NE, SE, SW, NW). North is `y - 1`.
    pub fn neighbors(&self) -> [Position; 8] {
        [
            Position::new(self.x, self.y - 1),
            Position::new(self.x + 1, self.y),
            Position::new(self.x, self.y + 1),
            Position::new(self.x - 1, self.y),
            Position::new(self.x + 1, self.y - 1),
            Position::new(self.x + 1, self.y + 1),
            Position::new(self.x - 1, self.y + 1),
            Position::new(self.x - 1, self.y - 1),
        ]
    }

    pub fn is_diagonal_to(&self, other: &Position) -> bool {
        (self.x - other.x).abs() == 1 && (self.y - other.y).abs() == 1
    }

    /// True for any of the 8 surrounding positions.
    pub fn is_adjacent(&self, other: &Position) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}
