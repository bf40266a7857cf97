//! Optimal A* solver for N×N sliding-tile puzzles.

pub mod board;
pub mod config;
pub mod error;
pub mod heuristic;
pub mod pattern_db;
pub mod search;
pub mod solvability;
pub mod trace;

pub use crate::board::{Board, Move, Position, StateKey};
pub use crate::config::{PatternDbConfig, SolverConfig};
pub use crate::error::{ConfigError, PatternDbError, SolveError, ValidationError};
pub use crate::heuristic::{manhattan_distance, HeuristicKind, HeuristicProvider};
pub use crate::pattern_db::{DisjointPatterns, PatternDatabase, PatternDbStatus};
pub use crate::search::Solver;
pub use crate::solvability::is_solvable;
pub use crate::trace::{DetailedSolution, Solution, Step, StepAction};
