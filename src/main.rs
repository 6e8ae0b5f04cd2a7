use std::collections::HashSet;
use std::env;
use std::fs;
use std::str::FromStr;

use dotenv::dotenv;
use gridpath::{Grid, Path, PathError, PathFinder, Position, SearchConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const REFERENCE_SIZE: i32 = 15;
const REFERENCE_WALLS: [(i32, i32); 7] = [(4, 2), (4, 3), (4, 4), (4, 5), (5, 6), (5, 3), (5, 2)];
const DEFAULT_START: Position = Position { x: 2, y: 3 };
const DEFAULT_GOAL: Position = Position { x: 6, y: 3 };

fn get_env_var<T: FromStr>(key: &str) -> Result<Option<T>, PathError> {
    parse_setting(key, env::var(key).ok())
}

/// Unset settings are `None`; set but unparseable ones are an error.
fn parse_setting<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, PathError> {
    match value {
        None => Ok(None),
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(PathError::InvalidConfig {
                key: key.to_string(),
                value,
            }),
        },
    }
}

fn get_env_position(key: &str, default: Position) -> Result<Position, PathError> {
    let Ok(value) = env::var(key) else {
        return Ok(default);
    };

    let invalid = || PathError::InvalidConfig {
        key: key.to_string(),
        value: value.clone(),
    };
    let (x, y) = value.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<i32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<i32>().map_err(|_| invalid())?;
    Ok(Position::new(x, y))
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridpath=debug,info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn load_grid() -> Result<Grid, Box<dyn std::error::Error>> {
    match env::var("GRIDPATH_MAP") {
        Ok(file) => {
            tracing::info!("Loading map from {}", file);
            let text = fs::read_to_string(&file)?;
            Ok(text.parse::<Grid>()?)
        }
        Err(_) => Ok(reference_grid()?),
    }
}

fn reference_grid() -> Result<Grid, PathError> {
    let mut grid = Grid::new(REFERENCE_SIZE, REFERENCE_SIZE)?;
    for (x, y) in REFERENCE_WALLS {
        grid.set_blocked(x, y, true)?;
    }
    Ok(grid)
}

/// Block up to `count` random open cells, never touching `keep`.
fn scatter_walls<R: Rng>(grid: &mut Grid, count: usize, keep: &[Position], rng: &mut R) -> usize {
    if grid.width() == 0 || grid.height() == 0 {
        return 0;
    }

    let mut placed = 0;
    let mut attempts = 0;
    while placed < count && attempts < count * 10 {
        attempts += 1;
        let pos = Position::new(
            rng.random_range(0..grid.width()),
            rng.random_range(0..grid.height()),
        );
        if keep.contains(&pos) || grid.is_blocked(&pos) {
            continue;
        }
        if grid.set_blocked(pos.x, pos.y, true).is_ok() {
            placed += 1;
        }
    }
    placed
}

fn render(grid: &Grid, path: Option<&Path>, start: Position, goal: Position) -> Vec<String> {
    let on_path: HashSet<Position> = path
        .map(|p| p.cells.iter().copied().collect())
        .unwrap_or_default();

    (0..grid.height())
        .map(|y| {
            (0..grid.width())
                .map(|x| {
                    let pos = Position::new(x, y);
                    if pos == start {
                        'S'
                    } else if pos == goal {
                        'G'
                    } else if grid.is_blocked(&pos) {
                        '#'
                    } else if on_path.contains(&pos) {
                        '*'
                    } else {
                        '.'
                    }
                })
                .collect()
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_logging();

    let mut grid = load_grid()?;
    let start = get_env_position("GRIDPATH_START", DEFAULT_START)?;
    let goal = get_env_position("GRIDPATH_GOAL", DEFAULT_GOAL)?;

    let seed = get_env_var::<u64>("GRIDPATH_SEED")?;
    if let Some(count) = get_env_var::<usize>("GRIDPATH_RANDOM_WALLS")? {
        let keep = [start, goal];
        let placed = match seed {
            Some(seed) => {
                scatter_walls(&mut grid, count, &keep, &mut StdRng::seed_from_u64(seed))
            }
            None => scatter_walls(&mut grid, count, &keep, &mut rand::rng()),
        };
        tracing::debug!(placed, "Scattered random walls");
    }

    let config = SearchConfig::from_env()?;
    tracing::info!(
        heuristic = ?config.heuristic,
        max_expansions = ?config.max_expansions,
        "Searching {} -> {} on {}x{} grid",
        start,
        goal,
        grid.width(),
        grid.height()
    );

    let path = PathFinder::new(config).find_path(&grid, start, goal)?;
    match &path {
        Some(path) => {
            let cells: Vec<String> = path.cells.iter().map(Position::to_string).collect();
            tracing::info!(
                steps = path.len() - 1,
                expansions = path.expansions,
                "Path cost {:.3}: {}",
                path.cost,
                cells.join(" ")
            );
        }
        None => tracing::warn!("No path from {} to {}", start, goal),
    }

    for line in render(&grid, path.as_ref(), start, goal) {
        tracing::info!("{}", line);
    }

    Ok(())
}
