use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::infra::{EndpointIssue, PathError, PathResult, Position, SearchConfig};
use crate::state::Grid;

/// Per-search bookkeeping for one discovered cell.
#[derive(Debug, Clone)]
struct SearchNode {
    pos: Position,
    g: f64,
    h: f64,
    parent: Option<usize>, // Index into the search's node table
    queued: u64,           // Sequence number of the newest heap entry for this node
}

impl SearchNode {
    fn f(&self) -> f64 {
        self.g + self.h
    }
}

/// Frontier entry. Entries whose `seq` no longer matches their node's `queued`
/// were superseded by a cheaper update and are skipped on pop.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    h: f64,
    seq: u64,
    node: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f, then h, then insertion order
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

/// A route from start to goal, both inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub cells: Vec<Position>,
    pub cost: f64,
    /// Nodes moved to the closed set while searching.
    pub expansions: usize,
}

impl Path {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn start(&self) -> Option<Position> {
        self.cells.first().copied()
    }

    pub fn goal(&self) -> Option<Position> {
        self.cells.last().copied()
    }

    pub fn contains(&self, pos: &Position) -> bool {
        self.cells.contains(pos)
    }
}

/// A* over a `Grid` with 8-directional movement and Euclidean step cost.
#[derive(Debug, Clone, Default)]
pub struct PathFinder {
    config: SearchConfig,
}

impl PathFinder {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Find the cheapest path from `start` to `goal`.
    ///
    /// Returns `Ok(None)` when the goal is unreachable. Endpoints that are
    /// blocked or outside the grid fail with `InvalidEndpoint`; exceeding the
    /// configured expansion budget fails with `SearchAborted`.
    #[tracing::instrument(level = "trace", skip(self, grid), fields(start_x = start.x, start_y = start.y, goal_x = goal.x, goal_y = goal.y))]
    pub fn find_path(
        &self,
        grid: &Grid,
        start: Position,
        goal: Position,
    ) -> PathResult<Option<Path>> {
        check_endpoint(grid, start)?;
        check_endpoint(grid, goal)?;

        let heuristic = self.config.heuristic;
        let mut nodes: Vec<SearchNode> = Vec::new();
        let mut open_index: HashMap<Position, usize> = HashMap::new();
        let mut open_set = BinaryHeap::new();
        let mut closed_set: HashSet<Position> = HashSet::new();
        let mut seq: u64 = 0;

        nodes.push(SearchNode {
            pos: start,
            g: 0.0,
            h: heuristic.estimate(start, goal),
            parent: None,
            queued: seq,
        });
        open_index.insert(start, 0);
        open_set.push(OpenEntry {
            f: nodes[0].f(),
            h: nodes[0].h,
            seq,
            node: 0,
        });

        let mut expansions = 0;

        while let Some(entry) = open_set.pop() {
            let current = entry.node;
            if nodes[current].queued != entry.seq {
                continue;
            }

            if let Some(max) = self.config.max_expansions
                && expansions >= max
            {
                tracing::warn!(expansions, "Max expansions reached, search aborted");
                return Err(PathError::SearchAborted { expansions });
            }

            let current_pos = nodes[current].pos;
            open_index.remove(&current_pos);
            closed_set.insert(current_pos);
            expansions += 1;

            if current_pos == goal {
                tracing::trace!(expansions, "Path found");
                return Ok(Some(reconstruct_path(&nodes, current, expansions)));
            }

            let current_cell = grid.cell_at(current_pos.x, current_pos.y)?;
            let current_g = nodes[current].g;

            for neighbor in grid.neighbors(current_cell) {
                let neighbor_pos = neighbor.pos();
                if closed_set.contains(&neighbor_pos) {
                    continue;
                }

                let tentative_g = current_g + current_pos.step_cost(&neighbor_pos);

                let index = match open_index.get(&neighbor_pos) {
                    Some(&existing) => {
                        if tentative_g >= nodes[existing].g {
                            continue;
                        }
                        existing
                    }
                    None => {
                        nodes.push(SearchNode {
                            pos: neighbor_pos,
                            g: f64::INFINITY,
                            h: heuristic.estimate(neighbor_pos, goal),
                            parent: None,
                            queued: 0,
                        });
                        let index = nodes.len() - 1;
                        open_index.insert(neighbor_pos, index);
                        index
                    }
                };

                seq += 1;
                let node = &mut nodes[index];
                node.parent = Some(current);
                node.g = tentative_g;
                node.queued = seq;
                open_set.push(OpenEntry {
                    f: node.f(),
                    h: node.h,
                    seq,
                    node: index,
                });
            }
        }

        tracing::trace!(expansions, "No path found");
        Ok(None)
    }
}

fn check_endpoint(grid: &Grid, pos: Position) -> PathResult<()> {
    let cell = grid.cell_at(pos.x, pos.y).map_err(|_| PathError::InvalidEndpoint {
        x: pos.x,
        y: pos.y,
        reason: EndpointIssue::OutOfBounds,
    })?;

    if cell.is_blocked() {
        return Err(PathError::InvalidEndpoint {
            x: pos.x,
            y: pos.y,
            reason: EndpointIssue::Blocked,
        });
    }

    Ok(())
}

fn reconstruct_path(nodes: &[SearchNode], goal: usize, expansions: usize) -> Path {
    let mut cells = vec![nodes[goal].pos];
    let mut current = goal;
    while let Some(prev) = nodes[current].parent {
        cells.push(nodes[prev].pos);
        current = prev;
    }
    cells.reverse();

    Path {
        cells,
        cost: nodes[goal].g,
        expansions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::Heuristic;
    use approx::assert_relative_eq;
    use std::f64::consts::SQRT_2;

    fn open_grid(width: i32, height: i32) -> Grid {
        Grid::new(width, height).unwrap()
    }

    fn pos(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    /// Endpoints match, every step is legal, no wall is entered and the cost adds up.
    fn assert_valid_path(grid: &Grid, path: &Path, start: Position, goal: Position) {
        assert_eq!(path.start(), Some(start));
        assert_eq!(path.goal(), Some(goal));

        for cell in &path.cells {
            assert!(!grid.is_blocked(cell), "path enters wall at {}", cell);
        }

        let mut cost = 0.0;
        for step in path.cells.windows(2) {
            assert!(
                grid.is_neighbor(&step[0], &step[1]),
                "illegal step {} -> {}",
                step[0],
                step[1]
            );
            cost += step[0].step_cost(&step[1]);
        }
        assert_relative_eq!(path.cost, cost, epsilon = 1e-9);
    }

    #[test]
    fn test_diagonal_on_empty_grid() {
        let grid = open_grid(5, 5);
        let path = PathFinder::default()
            .find_path(&grid, pos(0, 0), pos(4, 4))
            .unwrap()
            .expect("path should exist");

        assert_eq!(path.len(), 5);
        assert_eq!(
            path.cells,
            vec![pos(0, 0), pos(1, 1), pos(2, 2), pos(3, 3), pos(4, 4)]
        );
        assert_relative_eq!(path.cost, 4.0 * SQRT_2, epsilon = 1e-9);
        assert_valid_path(&grid, &path, pos(0, 0), pos(4, 4));
    }

    #[test]
    fn test_routes_through_gap_in_wall() {
        let mut grid = open_grid(5, 5);
        for y in 0..4 {
            grid.set_blocked(2, y, true).unwrap();
        }

        for heuristic in [Heuristic::Manhattan, Heuristic::Octile] {
            let finder = PathFinder::new(SearchConfig::default().with_heuristic(heuristic));
            let path = finder
                .find_path(&grid, pos(0, 0), pos(4, 4))
                .unwrap()
                .expect("path should exist");

            assert!(path.contains(&pos(2, 4)), "{:?} missed the gap", heuristic);
            assert_valid_path(&grid, &path, pos(0, 0), pos(4, 4));
        }

        let optimal = PathFinder::new(SearchConfig::default().with_heuristic(Heuristic::Octile))
            .find_path(&grid, pos(0, 0), pos(4, 4))
            .unwrap()
            .unwrap();
        assert_relative_eq!(optimal.cost, 6.0 + SQRT_2, epsilon = 1e-9);
    }

    #[test]
    fn test_full_wall_has_no_path() {
        let mut grid = open_grid(5, 5);
        for y in 0..5 {
            grid.set_blocked(2, y, true).unwrap();
        }

        let result = PathFinder::default().find_path(&grid, pos(0, 0), pos(4, 4));
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_cannot_cut_between_blocked_corners() {
        let mut grid = open_grid(2, 2);
        grid.set_blocked(1, 0, true).unwrap();
        grid.set_blocked(0, 1, true).unwrap();

        let result = PathFinder::default().find_path(&grid, pos(0, 0), pos(1, 1));
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_single_blocked_corner_forces_detour() {
        let mut grid = open_grid(3, 3);
        grid.set_blocked(1, 0, true).unwrap();

        let path = grid.find_path(pos(0, 0), pos(1, 1)).unwrap().unwrap();
        assert_eq!(path.cells, vec![pos(0, 0), pos(0, 1), pos(1, 1)]);
        assert_relative_eq!(path.cost, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = open_grid(3, 3);
        let path = grid.find_path(pos(1, 1), pos(1, 1)).unwrap().unwrap();
        assert_eq!(path.cells, vec![pos(1, 1)]);
        assert_relative_eq!(path.cost, 0.0);
        assert_eq!(path.expansions, 1);
    }

    #[test]
    fn test_invalid_endpoints() {
        let mut grid = open_grid(3, 3);
        grid.set_blocked(2, 2, true).unwrap();
        let finder = PathFinder::default();

        assert_eq!(
            finder.find_path(&grid, pos(-1, 0), pos(1, 1)),
            Err(PathError::InvalidEndpoint {
                x: -1,
                y: 0,
                reason: EndpointIssue::OutOfBounds
            })
        );
        assert_eq!(
            finder.find_path(&grid, pos(0, 0), pos(2, 2)),
            Err(PathError::InvalidEndpoint {
                x: 2,
                y: 2,
                reason: EndpointIssue::Blocked
            })
        );
        assert_eq!(
            finder.find_path(&grid, pos(0, 0), pos(0, 3)),
            Err(PathError::InvalidEndpoint {
                x: 0,
                y: 3,
                reason: EndpointIssue::OutOfBounds
            })
        );
    }

    #[test]
    fn test_octile_is_optimal_on_empty_grid() {
        let grid = open_grid(6, 5);
        let finder = PathFinder::new(SearchConfig::default().with_heuristic(Heuristic::Octile));

        for start in grid.cells().map(|c| c.pos()) {
            for goal in grid.cells().map(|c| c.pos()) {
                let path = finder.find_path(&grid, start, goal).unwrap().unwrap();
                assert_relative_eq!(path.cost, start.octile_distance(&goal), epsilon = 1e-9);
                assert_valid_path(&grid, &path, start, goal);
            }
        }
    }

    #[test]
    fn test_default_heuristic_optimal_and_monotone_on_empty_grid() {
        let finder = PathFinder::default();

        for (width, height) in [(5, 5), (6, 5), (8, 8), (10, 3)] {
            let grid = open_grid(width, height);
            for start in grid.cells().map(|c| c.pos()) {
                for goal in grid.cells().map(|c| c.pos()) {
                    let path = finder.find_path(&grid, start, goal).unwrap().unwrap();
                    assert_relative_eq!(path.cost, start.octile_distance(&goal), epsilon = 1e-9);
                    for step in path.cells.windows(2) {
                        assert!(
                            step[1].distance(&goal) <= step[0].distance(&goal),
                            "{} -> {} moves away from {} on {}x{}",
                            step[0],
                            step[1],
                            goal,
                            width,
                            height
                        );
                    }
                    assert_valid_path(&grid, &path, start, goal);
                }
            }
        }
    }

    #[test]
    fn test_expansion_budget() {
        let grid = open_grid(10, 10);

        let tight = PathFinder::new(SearchConfig::default().with_max_expansions(3));
        assert_eq!(
            tight.find_path(&grid, pos(0, 0), pos(9, 0)),
            Err(PathError::SearchAborted { expansions: 3 })
        );

        let generous = PathFinder::new(SearchConfig::default().with_max_expansions(1_000));
        let path = generous
            .find_path(&grid, pos(0, 0), pos(9, 0))
            .unwrap()
            .unwrap();
        assert!(path.expansions <= 1_000);
        assert_relative_eq!(path.cost, 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_deterministic_results() {
        let grid: Grid = "\
........
..####..
..#..#..
..#.....
........"
            .parse()
            .unwrap();
        let finder = PathFinder::default();

        let first = finder.find_path(&grid, pos(0, 2), pos(4, 2)).unwrap().unwrap();
        for _ in 0..5 {
            let again = finder.find_path(&grid, pos(0, 2), pos(4, 2)).unwrap().unwrap();
            assert_eq!(again, first);
        }
        assert_valid_path(&grid, &first, pos(0, 2), pos(4, 2));
    }

    #[test]
    fn test_reference_scene() {
        let mut grid = open_grid(15, 15);
        for (x, y) in [(4, 2), (4, 3), (4, 4), (4, 5), (5, 6), (5, 3), (5, 2)] {
            grid.set_blocked(x, y, true).unwrap();
        }

        let path = grid.find_path(pos(2, 3), pos(6, 3)).unwrap().unwrap();
        assert_valid_path(&grid, &path, pos(2, 3), pos(6, 3));
        assert!(path.cells.iter().all(|p| p.x != 4 || !(2..=5).contains(&p.y)));
    }
}
