//! Turning a finished search into a path or a step-by-step trace.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::board::{Board, Move, Position};
use crate::search::{SearchNode, SearchOutcome};

/// Boards from the start to the goal, inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    pub path: Vec<Board>,
    pub moves: usize,
    pub nodes_explored: u64,
    #[serde(rename = "solving_time_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

/// What happened between the previous step and this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
    Initial,
    Slide { tile: u8, direction: Move },
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::Initial => write!(f, "Initial state"),
            StepAction::Slide { tile, direction } => {
                write!(f, "Move tile {} {}", tile, direction.name())
            }
        }
    }
}

/// One board on the solution path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub step_number: usize,
    pub board: Board,
    pub tile_positions: BTreeMap<u8, Position>,
    pub nodes_explored_at_step: u64,
    pub heuristic_value: u32,
    pub action: StepAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedSolution {
    pub steps: Vec<Step>,
    pub total_steps: usize,
    pub nodes_explored: u64,
    #[serde(rename = "solving_time_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// Moves per tile; tiles that never moved are absent.
    pub tile_move_counts: BTreeMap<u8, u32>,
    /// Cell of each tile at every step.
    pub tile_paths: BTreeMap<u8, Vec<Position>>,
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// Nodes from the root to `goal`, following parent links.
pub(crate) fn path_nodes(arena: &[SearchNode], goal: usize) -> Vec<&SearchNode> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(index) = current {
        let node = &arena[index];
        path.push(node);
        current = node.parent;
    }
    path.reverse();
    path
}

impl Solution {
    pub(crate) fn from_outcome(outcome: &SearchOutcome, elapsed: Duration) -> Self {
        let path: Vec<Board> = path_nodes(&outcome.arena, outcome.goal)
            .into_iter()
            .map(|node| node.board.clone())
            .collect();

        Self {
            moves: path.len() - 1,
            path,
            nodes_explored: outcome.nodes_explored,
            elapsed,
        }
    }
}

impl DetailedSolution {
    pub(crate) fn from_outcome(outcome: &SearchOutcome, elapsed: Duration) -> Self {
        let steps = build_steps(&path_nodes(&outcome.arena, outcome.goal));

        Self {
            total_steps: steps.len() - 1,
            tile_move_counts: tile_move_counts(&steps),
            tile_paths: tile_paths(&steps),
            steps,
            nodes_explored: outcome.nodes_explored,
            elapsed,
        }
    }
}

fn build_steps(nodes: &[&SearchNode]) -> Vec<Step> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| Step {
            step_number: i,
            board: node.board.clone(),
            tile_positions: node.board.tile_positions(),
            nodes_explored_at_step: node.explored_at,
            heuristic_value: node.h,
            action: if i == 0 {
                StepAction::Initial
            } else {
                describe_move(&nodes[i - 1].board, &node.board)
            },
        })
        .collect()
}

/// The tile that slid into `prev`'s blank cell and the way it went.
pub fn describe_move(prev: &Board, next: &Board) -> StepAction {
    let to = prev.blank();
    let from = next.blank();
    let tile = next.get(to);

    let direction = if to.row < from.row {
        Move::Up
    } else if to.row > from.row {
        Move::Down
    } else if to.col < from.col {
        Move::Left
    } else {
        Move::Right
    };

    StepAction::Slide { tile, direction }
}

pub fn tile_move_counts(steps: &[Step]) -> BTreeMap<u8, u32> {
    let mut counts = BTreeMap::new();
    for pair in steps.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        for (tile, pos) in &prev.tile_positions {
            if curr.tile_positions.get(tile) != Some(pos) {
                *counts.entry(*tile).or_insert(0) += 1;
            }
        }
    }
    counts
}

pub fn tile_paths(steps: &[Step]) -> BTreeMap<u8, Vec<Position>> {
    let mut paths: BTreeMap<u8, Vec<Position>> = BTreeMap::new();
    for step in steps {
        for (tile, pos) in &step.tile_positions {
            paths.entry(*tile).or_default().push(*pos);
        }
    }
    paths
}
