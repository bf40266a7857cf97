use rand::{seq::SliceRandom, Rng};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ValidationError;
use crate::solvability::is_solvable;

pub const MIN_SIZE: usize = 2;
/// Largest supported board side; tile labels are stored as bytes.
pub const MAX_SIZE: usize = 16;

/// Direction a tile slides into the blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Left,
    Down,
    Right,
}

impl Move {
    /// Order in which [`Board::neighbors`] enumerates moves: the blank goes
    /// up, down, left, then right.
    pub const NEIGHBOR_ORDER: [Move; 4] = [Move::Down, Move::Up, Move::Right, Move::Left];

    /// Row/column offset of the blank when a tile slides in this direction.
    pub fn as_offset(&self) -> (isize, isize) {
        match self {
            Move::Up => (1, 0),
            Move::Left => (0, 1),
            Move::Down => (-1, 0),
            Move::Right => (0, -1),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
            Move::Right => Move::Left,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Move::Up => "up",
            Move::Left => "left",
            Move::Down => "down",
            Move::Right => "right",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Move::Up => "Up",
            Move::Left => "Left",
            Move::Down => "Down",
            Move::Right => "Right",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

// Sides up to 5 pack into a u128; larger boards keep their tile bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKey {
    Packed(u128),
    Bytes(Box<[u8]>),
}

/// An immutable, validated N×N puzzle state. `0` is the blank.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    tiles: Vec<u8>,
    blank: usize,
}

impl Board {
    /// Validates a raw grid and builds a board from it.
    pub fn from_rows(rows: &[Vec<i64>]) -> Result<Self, ValidationError> {
        let size = rows.len();
        if size < MIN_SIZE {
            return Err(ValidationError::TooSmall(size));
        }
        if size > MAX_SIZE {
            return Err(ValidationError::TooLarge {
                size,
                max: MAX_SIZE,
            });
        }

        let max = size * size - 1;
        let mut seen = vec![false; size * size];
        let mut duplicate = None;
        let mut tiles = Vec::with_capacity(size * size);

        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(ValidationError::NotSquare {
                    row: i,
                    len: row.len(),
                    expected: size,
                });
            }
            for &value in row {
                if value < 0 || value > max as i64 {
                    return Err(ValidationError::OutOfRange { value, max });
                }
                let slot = &mut seen[value as usize];
                if *slot && duplicate.is_none() {
                    duplicate = Some(value);
                }
                *slot = true;
                tiles.push(value as u8);
            }
        }

        if !seen[0] {
            return Err(ValidationError::MissingBlank);
        }
        if let Some(value) = duplicate {
            return Err(ValidationError::Duplicate { value });
        }

        Ok(Self::from_tiles(size, tiles))
    }

    /// The canonical goal: `1..N²-1` row-major with the blank bottom-right.
    pub fn goal(size: usize) -> Self {
        assert!(
            (MIN_SIZE..=MAX_SIZE).contains(&size),
            "board size {} outside {}..={}",
            size,
            MIN_SIZE,
            MAX_SIZE
        );
        let cells = size * size;
        let tiles = (1..cells as u16)
            .map(|value| value as u8)
            .chain(std::iter::once(0))
            .collect();

        Self {
            size,
            tiles,
            blank: cells - 1,
        }
    }

    /// A uniformly random solvable board.
    pub fn shuffled<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let mut flattened = Self::goal(size).tiles;

        loop {
            flattened.shuffle(rng);
            let board = Self::from_tiles(size, flattened.clone());
            if is_solvable(&board) {
                return board;
            }
        }
    }

    /// A board reached by a random walk of `moves` slides from the goal,
    /// never immediately undoing the previous slide.
    pub fn scrambled<R: Rng + ?Sized>(size: usize, moves: usize, rng: &mut R) -> Self {
        let mut board = Self::goal(size);
        let mut last_move: Option<Move> = None;

        for _ in 0..moves {
            let candidates: Vec<(Move, Board)> = board
                .neighbors()
                .into_iter()
                .filter(|(dir, _)| last_move.map_or(true, |last| *dir != last.opposite()))
                .collect();
            if let Some((dir, next)) = candidates.choose(rng).cloned() {
                board = next;
                last_move = Some(dir);
            }
        }

        board
    }

    fn from_tiles(size: usize, tiles: Vec<u8>) -> Self {
        let blank = tiles.iter().position(|&t| t == 0).unwrap_or_default();
        Self { size, tiles, blank }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tiles(&self) -> &[u8] {
        &self.tiles
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.tiles.chunks(self.size)
    }

    pub fn blank(&self) -> Position {
        self.position(self.blank)
    }

    pub fn get(&self, pos: Position) -> u8 {
        self.tiles[pos.row * self.size + pos.col]
    }

    fn position(&self, index: usize) -> Position {
        Position {
            row: index / self.size,
            col: index % self.size,
        }
    }

    /// Current cell of `tile`, if it is on the board.
    pub fn position_of(&self, tile: u8) -> Option<Position> {
        self.tiles
            .iter()
            .position(|&t| t == tile)
            .map(|index| self.position(index))
    }

    /// Goal cell of `tile`; the blank belongs bottom-right.
    pub fn goal_position(&self, tile: u8) -> Position {
        if tile == 0 {
            return self.position(self.tiles.len() - 1);
        }
        self.position(tile as usize - 1)
    }

    pub fn tile_positions(&self) -> BTreeMap<u8, Position> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|&(_, &tile)| tile != 0)
            .map(|(index, &tile)| (tile, self.position(index)))
            .collect()
    }

    pub fn is_goal(&self) -> bool {
        let last = self.tiles.len() - 1;
        self.tiles[last] == 0
            && self.tiles[..last]
                .iter()
                .enumerate()
                .all(|(i, &tile)| tile as usize == i + 1)
    }

    /// Slides the tile that lies in direction `movement` from the blank's
    /// point of view, or `None` if no such tile exists.
    pub fn apply_move(&self, movement: Move) -> Option<Board> {
        let (dr, dc) = movement.as_offset();
        let blank = self.blank();

        let new_row = blank.row as isize + dr;
        let new_col = blank.col as isize + dc;
        let size = self.size as isize;

        if new_row < 0 || new_row >= size || new_col < 0 || new_col >= size {
            return None;
        }

        let target = new_row as usize * self.size + new_col as usize;
        let mut tiles = self.tiles.clone();
        tiles.swap(self.blank, target);

        Some(Self {
            size: self.size,
            tiles,
            blank: target,
        })
    }

    /// Every board one slide away, in [`Move::NEIGHBOR_ORDER`].
    pub fn neighbors(&self) -> Vec<(Move, Board)> {
        Move::NEIGHBOR_ORDER
            .iter()
            .filter_map(|&dir| self.apply_move(dir).map(|board| (dir, board)))
            .collect()
    }

    pub fn key(&self) -> StateKey {
        let cells = self.tiles.len();
        let bits = (usize::BITS - (cells - 1).leading_zeros()) as usize;

        if bits * cells <= u128::BITS as usize {
            let packed = self
                .tiles
                .iter()
                .fold(0u128, |acc, &tile| (acc << bits) | tile as u128);
            StateKey::Packed(packed)
        } else {
            StateKey::Bytes(self.tiles.clone().into_boxed_slice())
        }
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = if self.tiles.len() > 10 { 2 } else { 1 };
        for row in self.rows() {
            for &val in row {
                write!(f, "{:width$} ", val, width = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn rows(grid: &[&[i64]]) -> Vec<Vec<i64>> {
        grid.iter().map(|row| row.to_vec()).collect()
    }

    #[test]
    fn goal_is_row_major_with_blank_last() {
        let goal = Board::goal(3);
        assert_eq!(goal.tiles(), &[1, 2, 3, 4, 5, 6, 7, 8, 0]);
        assert_eq!(goal.blank(), Position { row: 2, col: 2 });
        assert!(goal.is_goal());

        let goal = Board::goal(4);
        assert_eq!(goal.tiles()[14], 15);
        assert!(goal.is_goal());
    }

    #[test]
    fn from_rows_accepts_valid_board() {
        let board = Board::from_rows(&rows(&[&[1, 2, 3], &[4, 0, 6], &[7, 5, 8]])).unwrap();
        assert_eq!(board.size(), 3);
        assert_eq!(board.blank(), Position { row: 1, col: 1 });
        assert_eq!(board.get(Position { row: 2, col: 1 }), 5);
        assert!(!board.is_goal());
    }

    #[test]
    fn from_rows_rejects_malformed_boards() {
        assert_eq!(
            Board::from_rows(&rows(&[&[0]])),
            Err(ValidationError::TooSmall(1))
        );
        assert_eq!(
            Board::from_rows(&rows(&[&[1, 2, 3], &[0, 4]])),
            Err(ValidationError::NotSquare {
                row: 0,
                len: 3,
                expected: 2
            })
        );
        assert_eq!(
            Board::from_rows(&rows(&[&[1, 2], &[3, 0, 4]])),
            Err(ValidationError::NotSquare {
                row: 1,
                len: 3,
                expected: 2
            })
        );
        assert_eq!(
            Board::from_rows(&rows(&[&[1, 2], &[3, 4]])),
            Err(ValidationError::OutOfRange { value: 4, max: 3 })
        );
        assert_eq!(
            Board::from_rows(&rows(&[&[1, -2], &[3, 0]])),
            Err(ValidationError::OutOfRange { value: -2, max: 3 })
        );
        assert_eq!(
            Board::from_rows(&rows(&[&[1, 1], &[3, 2]])),
            Err(ValidationError::MissingBlank)
        );
        assert_eq!(
            Board::from_rows(&rows(&[&[1, 1], &[3, 0]])),
            Err(ValidationError::Duplicate { value: 1 })
        );
        let big = vec![vec![0i64; 17]; 17];
        assert_eq!(
            Board::from_rows(&big),
            Err(ValidationError::TooLarge { size: 17, max: 16 })
        );
    }

    #[test]
    fn neighbors_follow_blank_up_down_left_right() {
        let board = Board::from_rows(&rows(&[&[1, 2, 3], &[4, 0, 5], &[6, 7, 8]])).unwrap();
        let neighbors = board.neighbors();
        let moves: Vec<Move> = neighbors.iter().map(|(m, _)| *m).collect();
        assert_eq!(moves, vec![Move::Down, Move::Up, Move::Right, Move::Left]);

        // Tile 2 slides down into the blank.
        assert_eq!(neighbors[0].1.tiles(), &[1, 0, 3, 4, 2, 5, 6, 7, 8]);
        // Tile 7 slides up.
        assert_eq!(neighbors[1].1.tiles(), &[1, 2, 3, 4, 7, 5, 6, 0, 8]);
        // Tile 4 slides right.
        assert_eq!(neighbors[2].1.tiles(), &[1, 2, 3, 0, 4, 5, 6, 7, 8]);
        // Tile 5 slides left.
        assert_eq!(neighbors[3].1.tiles(), &[1, 2, 3, 4, 5, 0, 6, 7, 8]);
    }

    #[test]
    fn corner_blank_has_two_neighbors() {
        let goal = Board::goal(3);
        let neighbors = goal.neighbors();
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].0, Move::Down);
        assert_eq!(neighbors[1].0, Move::Right);
        // Moving never mutates the source board.
        assert!(goal.is_goal());
    }

    #[test]
    fn keys_are_unique_across_all_2x2_permutations() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut keys = HashSet::new();
        let mut boards = HashSet::new();
        for _ in 0..500 {
            let mut tiles = vec![0u8, 1, 2, 3];
            tiles.shuffle(&mut rng);
            let board = Board::from_tiles(2, tiles);
            boards.insert(board.clone());
            keys.insert(board.key());
        }
        assert_eq!(keys.len(), boards.len());
        assert_eq!(keys.len(), 24);
    }

    #[test]
    fn large_boards_use_byte_keys() {
        assert!(matches!(Board::goal(5).key(), StateKey::Packed(_)));
        let key = Board::goal(6).key();
        assert_eq!(key, StateKey::Bytes(Board::goal(6).tiles().to_vec().into()));
    }

    #[test]
    fn shuffled_boards_are_solvable_permutations() {
        let mut rng = StdRng::seed_from_u64(42);
        for size in 2..=5 {
            let board = Board::shuffled(size, &mut rng);
            assert!(is_solvable(&board));
            let mut sorted = board.tiles().to_vec();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..(size * size) as u8).collect::<Vec<_>>());
        }
    }

    #[test]
    fn scrambled_board_stays_within_walk_length() {
        let mut rng = StdRng::seed_from_u64(3);
        let board = Board::scrambled(4, 10, &mut rng);
        let blank = board.blank();
        assert!((3 - blank.row) + (3 - blank.col) <= 10);
        assert!(is_solvable(&board));
    }

    #[test]
    fn serializes_as_rows() {
        let json = serde_json::to_string(&Board::goal(2)).unwrap();
        assert_eq!(json, "[[1,2],[3,0]]");
        assert_eq!(Board::goal(2).to_string(), "1 2 \n3 0 \n");
    }
}
