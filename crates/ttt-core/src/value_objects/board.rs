//! Board value object
//!
//! Wire format: a 9-character string over `-`, `X`, `O`. Index `i` maps
//! row-major onto the 3x3 grid (`row = i / 3`, `col = i % 3`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Number of cells on the board
pub const CELL_COUNT: usize = 9;

/// Contents of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    X,
    O,
}

impl Cell {
    /// Decode a wire character
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Self::Empty),
            'X' => Some(Self::X),
            'O' => Some(Self::O),
            _ => None,
        }
    }

    /// Wire character for this cell
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Empty => '-',
            Self::X => 'X',
            Self::O => 'O',
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Symbol a player places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// Cell value this symbol produces
    #[must_use]
    pub const fn cell(self) -> Cell {
        match self {
            Self::X => Cell::X,
            Self::O => Cell::O,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::O => "O",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Board index in `0..=8`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Position(u8);

impl Position {
    /// Create a position, rejecting anything outside the grid
    pub fn new(index: i64) -> Result<Self, DomainError> {
        u8::try_from(index)
            .ok()
            .filter(|i| usize::from(*i) < CELL_COUNT)
            .map(Self)
            .ok_or(DomainError::InvalidPosition(index))
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub const fn row(self) -> u8 {
        self.0 / 3
    }

    #[inline]
    #[must_use]
    pub const fn col(self) -> u8 {
        self.0 % 3
    }

    /// All nine positions in row-major order
    pub fn all() -> impl Iterator<Item = Position> {
        (0..CELL_COUNT as u8).map(Self)
    }
}

impl TryFrom<i64> for Position {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Position> for u8 {
    fn from(position: Position) -> Self {
        position.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Position {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let index = s
            .trim()
            .parse::<i64>()
            .map_err(|_| DomainError::ValidationError(format!("not a board position: {s}")))?;
        Self::new(index)
    }
}

/// Three cells the server reports as the winning line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Position>", into = "Vec<Position>")]
pub struct WinningLine([Position; 3]);

impl WinningLine {
    #[must_use]
    pub const fn new(cells: [Position; 3]) -> Self {
        Self(cells)
    }

    #[must_use]
    pub fn cells(&self) -> &[Position; 3] {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.0.contains(&position)
    }
}

impl TryFrom<Vec<Position>> for WinningLine {
    type Error = DomainError;

    fn try_from(cells: Vec<Position>) -> Result<Self, Self::Error> {
        let len = cells.len();
        <[Position; 3]>::try_from(cells)
            .map(Self)
            .map_err(|_| DomainError::ValidationError(format!("winning line has {len} cells")))
    }
}

impl From<WinningLine> for Vec<Position> {
    fn from(line: WinningLine) -> Self {
        line.0.to_vec()
    }
}

/// Difference between a held board and an incoming one
///
/// Cells only ever go from empty to occupied during a match, which lets a
/// re-delivered older board be told apart from a newer one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardDelta {
    /// Same board; re-delivered push
    Unchanged,
    /// Exactly one empty cell was filled
    Move(Position),
    /// Several empty cells were filled (pushes were missed)
    Advance(Vec<Position>),
    /// Incoming board is a strict predecessor of the held one
    Stale,
    /// An occupied cell changed; the boards disagree
    Conflict(Vec<Position>),
}

/// 3x3 tic-tac-toe board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Board([Cell; CELL_COUNT]);

impl Board {
    /// Empty board
    #[must_use]
    pub const fn empty() -> Self {
        Self([Cell::Empty; CELL_COUNT])
    }

    /// Parse the 9-character wire format
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let mut cells = [Cell::Empty; CELL_COUNT];
        let mut count = 0;
        for (i, c) in s.chars().enumerate() {
            if i >= CELL_COUNT {
                return Err(DomainError::InvalidBoard(s.to_string()));
            }
            cells[i] = Cell::from_char(c).ok_or_else(|| DomainError::InvalidBoard(s.to_string()))?;
            count += 1;
        }
        if count != CELL_COUNT {
            return Err(DomainError::InvalidBoard(s.to_string()));
        }
        Ok(Self(cells))
    }

    #[must_use]
    pub fn cell(&self, position: Position) -> Cell {
        self.0[position.index()]
    }

    #[must_use]
    pub fn is_empty_at(&self, position: Position) -> bool {
        self.cell(position).is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.0.iter().all(|c| !c.is_empty())
    }

    /// Number of occupied cells
    #[must_use]
    pub fn filled(&self) -> usize {
        self.0.iter().filter(|c| !c.is_empty()).count()
    }

    /// Rows of the grid, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.0.chunks(3)
    }

    /// Compare against an incoming board
    #[must_use]
    pub fn delta(&self, next: &Board) -> BoardDelta {
        let mut filled = Vec::new();
        let mut cleared = 0usize;
        let mut overwritten = Vec::new();

        for p in Position::all() {
            match (self.cell(p), next.cell(p)) {
                (a, b) if a == b => {}
                (Cell::Empty, _) => filled.push(p),
                (_, Cell::Empty) => cleared += 1,
                _ => overwritten.push(p),
            }
        }

        if !overwritten.is_empty() || (cleared > 0 && !filled.is_empty()) {
            overwritten.extend(filled);
            overwritten.sort();
            return BoardDelta::Conflict(overwritten);
        }
        if cleared > 0 {
            return BoardDelta::Stale;
        }
        match filled.as_slice() {
            [] => BoardDelta::Unchanged,
            [single] => BoardDelta::Move(*single),
            _ => BoardDelta::Advance(filled),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.0 {
            write!(f, "{}", cell.as_char())?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Board {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Board {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Board> for String {
    fn from(board: Board) -> Self {
        board.to_string()
    }
}
