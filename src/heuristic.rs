use serde::Serialize;
use std::sync::Arc;

use crate::board::Board;
use crate::pattern_db::{DisjointPatterns, PatternDbStatus, SIDE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    Manhattan,
    PatternDatabases,
}

/// Sum over nonzero tiles of the grid distance to their goal cell.
pub fn manhattan_distance(board: &Board) -> u32 {
    let size = board.size();
    board
        .tiles()
        .iter()
        .enumerate()
        .filter(|&(_, &value)| value != 0)
        .map(|(index, &value)| {
            let (row, col) = (index / size, index % size);
            let target_row = (value as usize - 1) / size;
            let target_col = (value as usize - 1) % size;
            (row.abs_diff(target_row) + col.abs_diff(target_col)) as u32
        })
        .sum()
}

/// Summed pattern databases on 4×4 when available, Manhattan distance
/// otherwise. The two are never combined.
#[derive(Debug, Clone, Default)]
pub struct HeuristicProvider {
    patterns: Option<Arc<DisjointPatterns>>,
}

impl HeuristicProvider {
    pub fn manhattan() -> Self {
        Self { patterns: None }
    }

    pub fn with_patterns(patterns: Arc<DisjointPatterns>) -> Self {
        Self {
            patterns: Some(patterns),
        }
    }

    pub fn from_status(status: &PatternDbStatus) -> Self {
        Self {
            patterns: status.databases().cloned(),
        }
    }

    pub fn kind(&self, size: usize) -> HeuristicKind {
        if size == SIDE && self.patterns.is_some() {
            HeuristicKind::PatternDatabases
        } else {
            HeuristicKind::Manhattan
        }
    }

    pub fn estimate(&self, board: &Board) -> u32 {
        match &self.patterns {
            Some(patterns) if board.size() == SIDE => patterns.estimate(board),
            _ => manhattan_distance(board),
        }
    }
}
