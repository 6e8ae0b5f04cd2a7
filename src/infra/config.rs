use std::env;
use std::str::FromStr;

use super::error::PathError;
use super::types::Position;

pub const HEURISTIC_KEY: &str = "GRIDPATH_HEURISTIC";
pub const MAX_EXPANSIONS_KEY: &str = "GRIDPATH_MAX_EXPANSIONS";

/// Estimate of the remaining cost from a cell to the goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Heuristic {
    /// `|dx| + |dy|`. Overestimates diagonal routes, so results are not always optimal.
    #[default]
    Manhattan,
    /// `max + (√2 - 1) * min`. Consistent for 8-directional movement.
    Octile,
}

impl Heuristic {
    pub fn estimate(&self, from: Position, goal: Position) -> f64 {
        match self {
            Heuristic::Manhattan => from.distance(&goal) as f64,
            Heuristic::Octile => from.octile_distance(&goal),
        }
    }
}

impl FromStr for Heuristic {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manhattan" => Ok(Heuristic::Manhattan),
            "octile" => Ok(Heuristic::Octile),
            _ => Err(PathError::InvalidConfig {
                key: HEURISTIC_KEY.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Tuning for a `PathFinder`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchConfig {
    pub heuristic: Heuristic,
    /// Maximum node expansions before the search gives up with `SearchAborted`.
    /// `None` searches exhaustively.
    pub max_expansions: Option<usize>,
}

impl SearchConfig {
    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = Some(max_expansions);
        self
    }

    /// Read `GRIDPATH_HEURISTIC` and `GRIDPATH_MAX_EXPANSIONS` from the process environment.
    pub fn from_env() -> Result<Self, PathError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PathError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SearchConfig::default();

        if let Some(value) = lookup(HEURISTIC_KEY) {
            config.heuristic = value.parse()?;
        }

        if let Some(value) = lookup(MAX_EXPANSIONS_KEY) {
            let max_expansions =
                value.trim().parse::<usize>().map_err(|_| PathError::InvalidConfig {
                    key: MAX_EXPANSIONS_KEY.to_string(),
                    value: value.clone(),
                })?;
            config.max_expansions = Some(max_expansions);
        }

        Ok(config)
    }
}
