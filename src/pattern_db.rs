//! Additive pattern databases for the 4×4 puzzle.

use log::{debug, info, warn};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::board::Board;
use crate::config::PatternDbConfig;
use crate::error::PatternDbError;

pub const SIDE: usize = 4;
const CELLS: usize = SIDE * SIDE;

pub const LOWER_TILES: [u8; 7] = [1, 2, 3, 4, 5, 6, 7];
pub const UPPER_TILES: [u8; 8] = [8, 9, 10, 11, 12, 13, 14, 15];

const FORMAT_VERSION: u32 = 2;
const UNSEEN: u8 = u8::MAX;

/// Number of ways to place `tiles` distinct tiles on the 16 cells.
pub fn placements(tiles: usize) -> usize {
    (0..tiles).map(|i| CELLS - i).product()
}

// Mixed-radix rank of a partial permutation: digit i is the index of
// cells[i] among the cells not taken by cells[..i].
fn rank(cells: &[u8]) -> usize {
    let mut used: u16 = 0;
    let mut index = 0;
    for (i, &cell) in cells.iter().enumerate() {
        let below = (used & ((1u16 << cell) - 1)).count_ones() as usize;
        index = index * (CELLS - i) + cell as usize - below;
        used |= 1 << cell;
    }
    index
}

fn unrank(mut index: usize, cells: &mut [u8]) {
    for i in (0..cells.len()).rev() {
        let base = CELLS - i;
        cells[i] = (index % base) as u8;
        index /= base;
    }

    let mut used: u16 = 0;
    for cell in cells.iter_mut() {
        let mut skip = *cell;
        let mut c = 0u8;
        loop {
            if used & (1 << c) == 0 {
                if skip == 0 {
                    break;
                }
                skip -= 1;
            }
            c += 1;
        }
        *cell = c;
        used |= 1 << c;
    }
}

fn adjacent(cell: u8) -> impl Iterator<Item = u8> {
    let (row, col) = (cell as usize / SIDE, cell as usize % SIDE);
    [(-1isize, 0isize), (1, 0), (0, -1), (0, 1)]
        .into_iter()
        .filter_map(move |(dr, dc)| {
            let r = row.checked_add_signed(dr).filter(|&r| r < SIDE)?;
            let c = col.checked_add_signed(dc).filter(|&c| c < SIDE)?;
            Some((r * SIDE + c) as u8)
        })
}

/// Fewest pattern-tile moves for every placement of one tile subset.
///
/// Tiles outside the subset are wildcards and the blank is not part of the
/// key, so a pattern tile may step into any adjacent cell not held by
/// another pattern tile. Each step costs one move.
pub struct PatternDatabase {
    tiles: Vec<u8>,
    // Index of each tile value within `tiles`.
    slots: [Option<u8>; CELLS],
    table: Vec<u8>,
}

impl PatternDatabase {
    fn empty(tiles: &[u8]) -> Result<Self, PatternDbError> {
        let mut sorted = tiles.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let in_range = sorted.iter().all(|&t| (1..CELLS as u8).contains(&t));
        if sorted.is_empty() || sorted.len() != tiles.len() || !in_range {
            return Err(PatternDbError::InvalidTiles(tiles.to_vec()));
        }

        let mut slots = [None; CELLS];
        for (slot, &tile) in sorted.iter().enumerate() {
            slots[tile as usize] = Some(slot as u8);
        }

        Ok(Self {
            table: vec![UNSEEN; placements(sorted.len())],
            tiles: sorted,
            slots,
        })
    }

    /// Breadth-first search backwards from the goal placement. Each pass
    /// scans the table for the current depth, so no frontier is kept.
    pub fn build(tiles: &[u8]) -> Result<Self, PatternDbError> {
        let mut db = Self::empty(tiles)?;
        let mut cells: Vec<u8> = db.tiles.iter().map(|&t| t - 1).collect();
        db.table[rank(&cells)] = 0;
        let mut depth = 0u8;

        loop {
            let mut reached = 0usize;
            for index in 0..db.table.len() {
                if db.table[index] != depth {
                    continue;
                }
                unrank(index, &mut cells);
                let occupied = cells.iter().fold(0u16, |mask, &c| mask | 1 << c);

                for i in 0..cells.len() {
                    let from = cells[i];
                    for to in adjacent(from) {
                        if occupied & (1 << to) != 0 {
                            continue;
                        }
                        cells[i] = to;
                        let child = rank(&cells);
                        if db.table[child] == UNSEEN {
                            db.table[child] = depth + 1;
                            reached += 1;
                        }
                    }
                    cells[i] = from;
                }
            }

            if reached == 0 {
                break;
            }
            depth += 1;
            debug!(
                "Tiles {:?}: {} placements at depth {}",
                db.tiles, reached, depth
            );
        }

        info!(
            "Built pattern database for tiles {:?}: {} entries, max depth {}",
            db.tiles,
            db.table.len(),
            depth
        );
        Ok(db)
    }

    pub fn tiles(&self) -> &[u8] {
        &self.tiles
    }

    /// Table size in entries, which is also its size in bytes.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Stored move count for the pattern on `board`, or 0 when unknown.
    pub fn lookup(&self, board: &Board) -> u32 {
        if board.size() != SIDE {
            return 0;
        }
        match self.table.get(self.pattern_index(board.tiles())) {
            Some(&depth) if depth != UNSEEN => depth as u32,
            _ => 0,
        }
    }

    fn pattern_index(&self, tiles: &[u8]) -> usize {
        let mut cells = [0u8; CELLS];
        for (cell, &tile) in tiles.iter().enumerate() {
            if let Some(slot) = self.slots.get(tile as usize).copied().flatten() {
                cells[slot as usize] = cell as u8;
            }
        }
        rank(&cells[..self.tiles.len()])
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), PatternDbError> {
        bincode::serialize_into(writer, &(FORMAT_VERSION, &self.tiles, &self.table))
            .map_err(PatternDbError::Encode)
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self, PatternDbError> {
        let (version, tiles, table): (u32, Vec<u8>, Vec<u8>) =
            bincode::deserialize_from(reader).map_err(PatternDbError::Decode)?;
        if version != FORMAT_VERSION {
            return Err(PatternDbError::UnsupportedVersion {
                found: version,
                expected: FORMAT_VERSION,
            });
        }

        let mut db = Self::empty(&tiles)?;
        if table.len() != db.table.len() {
            return Err(PatternDbError::TableSize {
                found: table.len(),
                expected: db.table.len(),
            });
        }
        db.table = table;
        if db.table[db.pattern_index(Board::goal(SIDE).tiles())] != 0 {
            return Err(PatternDbError::MissingGoal);
        }
        Ok(db)
    }

    pub fn save(&self, path: &Path) -> Result<(), PatternDbError> {
        let file = File::create(path).map_err(|source| PatternDbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(|source| PatternDbError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, PatternDbError> {
        let file = File::open(path).map_err(|source| PatternDbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read_from(BufReader::new(file))
    }
}

impl fmt::Debug for PatternDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternDatabase")
            .field("tiles", &self.tiles)
            .field("entries", &self.table.len())
            .finish()
    }
}

/// Two databases over disjoint tile sets whose lookups are summed.
#[derive(Debug)]
pub struct DisjointPatterns {
    lower: PatternDatabase,
    upper: PatternDatabase,
}

impl DisjointPatterns {
    pub fn new(lower: PatternDatabase, upper: PatternDatabase) -> Result<Self, PatternDbError> {
        if let Some(&tile) = lower.tiles.iter().find(|&&t| upper.tiles.contains(&t)) {
            return Err(PatternDbError::Overlap(tile));
        }
        Ok(Self { lower, upper })
    }

    // Tables of 57,657,600 and 518,918,400 bytes.
    pub fn build_default() -> Result<Self, PatternDbError> {
        Self::new(
            PatternDatabase::build(&LOWER_TILES)?,
            PatternDatabase::build(&UPPER_TILES)?,
        )
    }

    pub fn load(config: &PatternDbConfig) -> Result<Self, PatternDbError> {
        Self::new(
            PatternDatabase::load(&config.lower_path())?,
            PatternDatabase::load(&config.upper_path())?,
        )
    }

    pub fn save(&self, config: &PatternDbConfig) -> Result<(), PatternDbError> {
        self.lower.save(&config.lower_path())?;
        self.upper.save(&config.upper_path())
    }

    pub fn estimate(&self, board: &Board) -> u32 {
        self.lower.lookup(board) + self.upper.lookup(board)
    }

    pub fn databases(&self) -> [&PatternDatabase; 2] {
        [&self.lower, &self.upper]
    }
}

#[derive(Debug)]
pub enum PatternDbStatus {
    Loaded(Arc<DisjointPatterns>),
    Disabled,
    /// Loading failed; heuristics fall back to Manhattan distance.
    Unavailable(PatternDbError),
}

impl PatternDbStatus {
    /// Loads the databases named by `config` without touching global state.
    pub fn load(config: &PatternDbConfig) -> Self {
        if !config.enabled {
            info!("Pattern databases disabled by configuration");
            return PatternDbStatus::Disabled;
        }

        match DisjointPatterns::load(config) {
            Ok(patterns) => {
                let [lower, upper] = patterns.databases();
                info!(
                    "Pattern databases loaded from {} ({} + {} entries)",
                    config.directory.display(),
                    lower.len(),
                    upper.len()
                );
                PatternDbStatus::Loaded(Arc::new(patterns))
            }
            Err(err) => {
                warn!(
                    "Pattern databases unavailable, falling back to Manhattan distance: {}",
                    err
                );
                PatternDbStatus::Unavailable(err)
            }
        }
    }

    pub fn databases(&self) -> Option<&Arc<DisjointPatterns>> {
        match self {
            PatternDbStatus::Loaded(patterns) => Some(patterns),
            _ => None,
        }
    }
}

static STATUS: OnceLock<(PatternDbConfig, PatternDbStatus)> = OnceLock::new();

/// Loads the process-wide databases on the first call. Later calls return
/// the same state whatever `config` they pass.
pub fn init(config: &PatternDbConfig) -> &'static PatternDbStatus {
    let (loaded_with, status) =
        STATUS.get_or_init(|| (config.clone(), PatternDbStatus::load(config)));
    if loaded_with != config {
        debug!(
            "Pattern databases already initialized with {:?}, ignoring {:?}",
            loaded_with, config
        );
    }
    status
}

pub fn status() -> &'static PatternDbStatus {
    init(&PatternDbConfig::default())
}
