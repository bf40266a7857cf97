use log::{debug, error, info, warn};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use crate::board::{Board, StateKey};
use crate::config::SolverConfig;
use crate::error::SolveError;
use crate::heuristic::HeuristicProvider;
use crate::pattern_db;
use crate::solvability::is_solvable;
use crate::trace::{DetailedSolution, Solution};

const PROGRESS_INTERVAL: u64 = 100_000;

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub board: Board,
    pub g: u32,
    pub h: u32,
    // Arena index of the node this one was expanded from.
    pub parent: Option<usize>,
    pub explored_at: u64,
}

pub(crate) struct SearchOutcome {
    pub arena: Vec<SearchNode>,
    pub goal: usize,
    pub nodes_explored: u64,
}

#[derive(Debug, Clone)]
pub struct Solver {
    time_limit: Duration,
    heuristic: HeuristicProvider,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(&SolverConfig::default())
    }
}

impl Solver {
    pub fn new(config: &SolverConfig) -> Self {
        let status = pattern_db::init(&config.pattern_databases);
        Self {
            time_limit: config.time_limit(),
            heuristic: HeuristicProvider::from_status(status),
        }
    }

    pub fn with_heuristic(heuristic: HeuristicProvider, time_limit: Duration) -> Self {
        Self {
            time_limit,
            heuristic,
        }
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    pub fn heuristic(&self) -> &HeuristicProvider {
        &self.heuristic
    }

    pub fn solve_rows(&self, rows: &[Vec<i64>]) -> Result<Solution, SolveError> {
        let board = Board::from_rows(rows)?;
        self.solve(&board)
    }

    /// Shortest sequence of boards from `board` to the goal.
    pub fn solve(&self, board: &Board) -> Result<Solution, SolveError> {
        let start = Instant::now();
        let outcome = self.search(board, start)?;
        let solution = Solution::from_outcome(&outcome, start.elapsed());
        info!(
            "Solution found in {}ms with {} steps and {} nodes explored",
            solution.elapsed.as_millis(),
            solution.moves,
            solution.nodes_explored
        );
        Ok(solution)
    }

    pub fn solve_detailed(&self, board: &Board) -> Result<DetailedSolution, SolveError> {
        let start = Instant::now();
        let outcome = self.search(board, start)?;
        let solution = DetailedSolution::from_outcome(&outcome, start.elapsed());
        info!(
            "Detailed solution found in {}ms with {} steps and {} nodes explored",
            solution.elapsed.as_millis(),
            solution.total_steps,
            solution.nodes_explored
        );
        Ok(solution)
    }

    fn search(&self, board: &Board, start: Instant) -> Result<SearchOutcome, SolveError> {
        if !is_solvable(board) {
            info!("Rejecting unsolvable board {:?}", board);
            return Err(SolveError::Unsolvable);
        }

        debug!(
            "Starting A* on {}x{} board using {:?}",
            board.size(),
            board.size(),
            self.heuristic.kind(board.size())
        );

        let h = self.heuristic.estimate(board);
        let mut arena = vec![SearchNode {
            board: board.clone(),
            g: 0,
            h,
            parent: None,
            explored_at: 0,
        }];
        // Equal f values pop in generation order.
        let mut frontier = BinaryHeap::from([Reverse((h, 0usize))]);
        let mut visited: HashMap<StateKey, u32> = HashMap::new();
        let mut nodes_explored: u64 = 0;

        while let Some(Reverse((_, index))) = frontier.pop() {
            let elapsed = start.elapsed();
            if elapsed >= self.time_limit {
                warn!(
                    "Time limit of {:?} exceeded after {} nodes",
                    self.time_limit, nodes_explored
                );
                return Err(SolveError::Timeout {
                    elapsed,
                    nodes_explored,
                });
            }
            nodes_explored += 1;

            let node = &arena[index];
            if node.board.is_goal() {
                return Ok(SearchOutcome {
                    arena,
                    goal: index,
                    nodes_explored,
                });
            }

            let g = node.g;
            let key = node.board.key();
            if visited.get(&key).is_some_and(|&depth| depth <= g) {
                continue;
            }
            visited.insert(key, g);

            let depth = g + 1;
            for (_, next) in node.board.neighbors() {
                if visited.get(&next.key()).is_some_and(|&seen| seen <= depth) {
                    continue;
                }
                let h = self.heuristic.estimate(&next);
                arena.push(SearchNode {
                    board: next,
                    g: depth,
                    h,
                    parent: Some(index),
                    explored_at: nodes_explored,
                });
                frontier.push(Reverse((depth + h, arena.len() - 1)));
            }

            if nodes_explored % PROGRESS_INTERVAL == 0 {
                debug!(
                    "{} nodes explored, frontier {}, visited {}, depth {}",
                    nodes_explored,
                    frontier.len(),
                    visited.len(),
                    g
                );
            }
        }

        error!(
            "Frontier exhausted after {} nodes on a board that passed the parity check",
            nodes_explored
        );
        Err(SolveError::SearchExhausted { nodes_explored })
    }
}
