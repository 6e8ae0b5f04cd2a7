use std::str::FromStr;

use crate::infra::{Path, PathError, PathFinder, PathResult, Position};

/// One addressable grid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pos: Position,
    blocked: bool,
}

impl Cell {
    fn new(pos: Position) -> Self {
        Self { pos, blocked: false }
    }

    pub fn pos(&self) -> Position {
        self.pos
    }

    pub fn x(&self) -> i32 {
        self.pos.x
    }

    pub fn y(&self) -> i32 {
        self.pos.y
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }
}

/// Fixed-size rectangular map. Owns every cell; cells are stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    pub const MAX_CELLS: usize = 1 << 20;

    pub fn new(width: i32, height: i32) -> PathResult<Self> {
        let side_ok = |side: i32| side >= 0 && side as usize <= Self::MAX_CELLS;
        let count_ok = |w: i32, h: i32| {
            (w as usize)
                .checked_mul(h as usize)
                .is_some_and(|count| count <= Self::MAX_CELLS)
        };
        if !side_ok(width) || !side_ok(height) || !count_ok(width, height) {
            return Err(PathError::InvalidDimensions { width, height });
        }

        let mut cells = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(Cell::new(Position::new(x, y)));
            }
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, pos: &Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    fn index(&self, pos: &Position) -> Option<usize> {
        self.contains(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    fn get(&self, pos: &Position) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn cell_at(&self, x: i32, y: i32) -> PathResult<&Cell> {
        self.get(&Position::new(x, y))
            .ok_or(PathError::OutOfBounds { x, y })
    }

    pub fn set_blocked(&mut self, x: i32, y: i32, value: bool) -> PathResult<()> {
        let index = self
            .index(&Position::new(x, y))
            .ok_or(PathError::OutOfBounds { x, y })?;
        self.cells[index].blocked = value;
        Ok(())
    }

    /// Out-of-bounds positions count as blocked.
    pub fn is_blocked(&self, pos: &Position) -> bool {
        self.get(pos).is_none_or(Cell::is_blocked)
    }

    fn is_open(&self, pos: &Position) -> bool {
        !self.is_blocked(pos)
    }

    /// Passable cells reachable from `cell` in one step.
    ///
    /// A diagonal step is only allowed when both orthogonal cells it passes
    /// between are open, so paths never squeeze through a wall corner.
    pub fn neighbors(&self, cell: &Cell) -> Vec<&Cell> {
        let from = cell.pos;
        from.neighbors()
            .iter()
            .filter(|to| self.is_open(to))
            .filter(|to| {
                !from.is_diagonal_to(to)
                    || (self.is_open(&Position::new(to.x, from.y))
                        && self.is_open(&Position::new(from.x, to.y)))
            })
            .filter_map(|to| self.get(to))
            .collect()
    }

    /// True when a single step from `a` to `b` is legal.
    pub fn is_neighbor(&self, a: &Position, b: &Position) -> bool {
        match self.get(a) {
            Some(cell) => self.neighbors(cell).iter().any(|n| n.pos == *b),
            None => false,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn blocked_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.blocked)
    }

    /// Search with a default `PathFinder`.
    pub fn find_path(&self, start: Position, goal: Position) -> PathResult<Option<Path>> {
        PathFinder::default().find_path(self, start, goal)
    }
}

impl FromStr for Grid {
    type Err = PathError;

    /// Parse a text map: `#` is a wall, `.` is open, line `y` holds row `y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows: Vec<(usize, &str)> = s
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end()))
            .skip_while(|(_, line)| line.is_empty())
            .collect();
        let rows = match rows.iter().rposition(|(_, line)| !line.is_empty()) {
            Some(last) => &rows[..=last],
            None => &[][..],
        };

        let width = rows.first().map_or(0, |(_, line)| line.chars().count());
        let mut grid = Grid::new(width as i32, rows.len() as i32)?;

        for (y, (line_no, line)) in rows.iter().enumerate() {
            if line.chars().count() != width {
                return Err(PathError::InvalidMap {
                    line: *line_no,
                    reason: format!("expected {} columns, found {}", width, line.chars().count()),
                });
            }
            for (x, c) in line.chars().enumerate() {
                match c {
                    '#' => grid.set_blocked(x as i32, y as i32, true)?,
                    '.' => {}
                    other => {
                        return Err(PathError::InvalidMap {
                            line: *line_no,
                            reason: format!("unexpected character {:?}", other),
                        });
                    }
                }
            }
        }

        Ok(grid)
    }
}
