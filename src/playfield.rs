//! Board topology: every non-wall cell gets a dense field id, ordered
//!
//! - `0 .. n_box`          target fields
//! - `n_box .. n_pos`      other fields a box may stand on
//! - `n_pos .. n_fields`   fields only the player may occupy
//!
//! so goal and dead-end tests are plain range comparisons.

use smallvec::SmallVec;

use crate::error::FormatError;

pub type FieldId = u32;

/// Neighbor sentinel for walls and the outside of the grid.
pub const NO_FIELD: FieldId = FieldId::MAX;

pub type BoxVec = SmallVec<[FieldId; 20]>;

const WALL: u8 = b'#';
const DEAD: u8 = b'+';
const GOAL: u8 = b':';
const BOX: u8 = b'o';
const GOAL_BOX: u8 = b'O';
const EMPTY: u8 = b' ';
const PLAYER: u8 = b'm';
const GOAL_PLAYER: u8 = b'M';
const DEAD_PLAYER: u8 = b'*';

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Direction {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Up, Direction::Right, Direction::Down];

    #[inline(always)]
    pub const fn opposite(self) -> Self {
        Self::ALL[(self as usize) ^ 2]
    }

    /// (row, col) step.
    #[inline(always)]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::Left => (0, -1),
            Direction::Up => (-1, 0),
            Direction::Right => (0, 1),
            Direction::Down => (1, 0),
        }
    }

    pub const fn as_char(self) -> char {
        match self {
            Direction::Left => 'l',
            Direction::Up => 'u',
            Direction::Right => 'r',
            Direction::Down => 'd',
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Tile {
    Wall,
    Goal { has_box: bool },
    Free { has_box: bool },
    Dead,
}

impl Tile {
    fn from_symbol(symbol: u8) -> Option<Self> {
        Some(match symbol {
            WALL => Tile::Wall,
            GOAL => Tile::Goal { has_box: false },
            GOAL_BOX => Tile::Goal { has_box: true },
            EMPTY => Tile::Free { has_box: false },
            BOX => Tile::Free { has_box: true },
            DEAD => Tile::Dead,
            _ => return None,
        })
    }
}

/// An immutable Sokoban level.
#[derive(Clone, Debug)]
pub struct Level {
    width: usize,
    height: usize,
    // Row-major grid of field ids, NO_FIELD for walls.
    cells: Vec<FieldId>,
    neighbors: Vec<[FieldId; 4]>,
    n_box: usize,
    n_pos: usize,
    n_fields: usize,
    initial_player: FieldId,
    initial_boxes: BoxVec,
    goals: BoxVec,
}

impl Level {
    /// Parses the textual level format. Empty lines are ignored and short rows are
    /// padded with walls.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let rows: Vec<&[u8]> = text
            .lines()
            .map(|l| l.trim_end_matches('\r').as_bytes())
            .filter(|l| !l.is_empty())
            .collect();
        if rows.is_empty() {
            return Err(FormatError::Empty);
        }
        let height = rows.len();
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);

        // (1) Locate the player and replace the marker by the tile underneath.
        let mut player: Option<(usize, usize)> = None;
        for (row, line) in rows.iter().enumerate() {
            for col in memchr::memchr3_iter(PLAYER, GOAL_PLAYER, DEAD_PLAYER, line) {
                if let Some((r, c)) = player {
                    return Err(FormatError::MultiplePlayers(r, c, row, col));
                }
                player = Some((row, col));
            }
        }
        let (player_row, player_col) = player.ok_or(FormatError::NoPlayer)?;

        let mut tiles = vec![Tile::Wall; width * height];
        for (row, line) in rows.iter().enumerate() {
            for (col, &symbol) in line.iter().enumerate() {
                let symbol = match symbol {
                    PLAYER => EMPTY,
                    GOAL_PLAYER => GOAL,
                    DEAD_PLAYER => DEAD,
                    s => s,
                };
                tiles[row * width + col] = Tile::from_symbol(symbol).ok_or(
                    FormatError::UnknownSymbol { symbol: symbol as char, row, col },
                )?;
            }
        }

        // (2) Count boxes and goals.
        let (mut n_goal, mut n_box) = (0, 0);
        for tile in &tiles {
            match *tile {
                Tile::Goal { has_box } => {
                    n_goal += 1;
                    n_box += has_box as usize;
                }
                Tile::Free { has_box } => n_box += has_box as usize,
                _ => {}
            }
        }
        if n_box != n_goal {
            return Err(FormatError::BoxTargetMismatch { boxes: n_box, goals: n_goal });
        }

        // (3) Number the fields: goals, then free fields, then dead-end fields.
        let mut cells = vec![NO_FIELD; width * height];
        let mut coords: Vec<usize> = Vec::with_capacity(tiles.len());
        let passes: [fn(&Tile) -> bool; 3] = [
            |t| matches!(t, Tile::Goal { .. }),
            |t| matches!(t, Tile::Free { .. }),
            |t| matches!(t, Tile::Dead),
        ];
        let mut n_pos = 0;
        for (pass, belongs) in passes.iter().enumerate() {
            for (idx, tile) in tiles.iter().enumerate() {
                if belongs(tile) {
                    cells[idx] = coords.len() as FieldId;
                    coords.push(idx);
                }
            }
            if pass == 1 {
                n_pos = coords.len();
            }
        }
        let n_fields = coords.len();

        // (4) Neighbor table.
        let neighbors = coords
            .iter()
            .map(|&idx| {
                let (row, col) = (idx / width, idx % width);
                Direction::ALL.map(|dir| {
                    let (dr, dc) = dir.offset();
                    match (row.checked_add_signed(dr), col.checked_add_signed(dc)) {
                        (Some(r), Some(c)) if r < height && c < width => cells[r * width + c],
                        _ => NO_FIELD,
                    }
                })
            })
            .collect();

        // (5) Initial boxes in ascending field order, goals are 0..n_box.
        let initial_boxes: BoxVec = (0..n_pos)
            .filter(|&p| {
                matches!(
                    tiles[coords[p]],
                    Tile::Goal { has_box: true } | Tile::Free { has_box: true }
                )
            })
            .map(|p| p as FieldId)
            .collect();
        let goals: BoxVec = (0..n_box as FieldId).collect();

        Ok(Level {
            width,
            height,
            initial_player: cells[player_row * width + player_col],
            cells,
            neighbors,
            n_box,
            n_pos,
            n_fields,
            initial_boxes,
            goals,
        })
    }

    #[inline(always)]
    pub fn is_valid(&self, pos: FieldId) -> bool {
        pos != NO_FIELD
    }

    #[inline(always)]
    pub fn is_goal(&self, pos: FieldId) -> bool {
        (pos as usize) < self.n_box
    }

    /// A box on this field could never be moved off again (or it is no field at all).
    #[inline(always)]
    pub fn is_dead(&self, pos: FieldId) -> bool {
        pos as usize >= self.n_pos
    }

    #[inline(always)]
    pub fn neighbor(&self, pos: FieldId, dir: Direction) -> FieldId {
        self.neighbors[pos as usize][dir as usize]
    }

    #[inline(always)]
    pub fn neighbors(&self, pos: FieldId) -> &[FieldId; 4] {
        &self.neighbors[pos as usize]
    }

    pub fn n_box(&self) -> usize {
        self.n_box
    }

    pub fn n_pos(&self) -> usize {
        self.n_pos
    }

    pub fn n_fields(&self) -> usize {
        self.n_fields
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Field id at grid coordinates, `NO_FIELD` for walls and outside the grid.
    pub fn field_at(&self, row: usize, col: usize) -> FieldId {
        if row < self.height && col < self.width {
            self.cells[row * self.width + col]
        } else {
            NO_FIELD
        }
    }

    pub fn initial_player(&self) -> FieldId {
        self.initial_player
    }

    pub fn initial_boxes(&self) -> &[FieldId] {
        &self.initial_boxes
    }

    pub fn goals(&self) -> &[FieldId] {
        &self.goals
    }
}
