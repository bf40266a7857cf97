//! Inversion-parity test for whether a board can reach the goal.

use crate::board::Board;

/// Whether `board` is in the same permutation class as the goal.
///
/// Odd sides: solvable iff the inversion count is even. Even sides: the
/// parity of the blank's row counted from the bottom must match the parity
/// of the inversion count.
pub fn is_solvable(board: &Board) -> bool {
    let inversions = count_inversions(board.tiles());

    if board.size() % 2 == 1 {
        inversions % 2 == 0
    } else {
        let blank_row_from_bottom = board.size() - 1 - board.blank().row;
        (blank_row_from_bottom % 2 == 0) == (inversions % 2 == 0)
    }
}

/// Out-of-order pairs among the nonzero tiles of a row-major sequence.
pub fn count_inversions(flattened: &[u8]) -> usize {
    flattened
        .iter()
        .enumerate()
        .filter(|&(_, &val)| val != 0)
        .map(|(i, &val)| {
            flattened[i + 1..]
                .iter()
                .filter(|&&next| next != 0 && next < val)
                .count()
        })
        .sum()
}
