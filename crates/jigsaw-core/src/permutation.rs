//! Cell-to-piece arrangement of a puzzle board
//!
//! `cells[cell] = piece`, where a piece is identified by the cell it occupies
//! when the puzzle is solved. The arrangement is always a bijection over
//! `0..n²`; it only changes by whole-board shuffles or pairwise swaps.

use serde::Serialize;
use std::fmt;

/// Board slot index (row-major)
pub type CellIndex = usize;

/// Piece identity: its solved cell index
pub type PieceId = usize;

/// A row/column position on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Position of a row-major index on a board of `grid_size` columns
    pub fn from_index(index: usize, grid_size: usize) -> Self {
        Self {
            row: index / grid_size,
            col: index % grid_size,
        }
    }

    pub fn to_index(self, grid_size: usize) -> usize {
        self.row * grid_size + self.col
    }
}

/// Errors raised when building an arrangement from untrusted data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermutationError {
    /// Piece list length is not grid_size²
    WrongLength { expected: usize, actual: usize },
    /// A piece is missing, duplicated or out of range
    NotABijection { piece: PieceId },
    /// A cell index lies outside the board
    CellOutOfRange { cell: CellIndex, len: usize },
    /// grid_size² does not fit in memory indices
    GridTooLarge { grid_size: usize },
}

impl fmt::Display for PermutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength { expected, actual } => {
                write!(f, "Expected {} pieces, got {}", expected, actual)
            }
            Self::NotABijection { piece } => {
                write!(f, "Piece {} is duplicated or out of range", piece)
            }
            Self::CellOutOfRange { cell, len } => {
                write!(f, "Cell {} is outside a board of {} cells", cell, len)
            }
            Self::GridTooLarge { grid_size } => {
                write!(f, "A {}x{} board is too large", grid_size, grid_size)
            }
        }
    }
}

impl std::error::Error for PermutationError {}

pub type PermutationResult<T> = Result<T, PermutationError>;

fn cell_count(grid_size: usize) -> PermutationResult<usize> {
    grid_size
        .checked_mul(grid_size)
        .ok_or(PermutationError::GridTooLarge { grid_size })
}

/// Current arrangement of pieces over board cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permutation {
    grid_size: usize,
    cells: Vec<PieceId>,
}

impl Permutation {
    /// The solved arrangement for an `n × n` board
    ///
    /// Panics if `n²` overflows `usize`; use [`Permutation::try_identity`]
    /// for sizes that come from outside.
    pub fn identity(grid_size: usize) -> Self {
        Self {
            grid_size,
            cells: (0..grid_size * grid_size).collect(),
        }
    }

    /// [`Permutation::identity`] with the cell count checked
    pub fn try_identity(grid_size: usize) -> PermutationResult<Self> {
        let len = cell_count(grid_size)?;
        Ok(Self {
            grid_size,
            cells: (0..len).collect(),
        })
    }

    /// Build an arrangement from a cell → piece list, checking it is a bijection
    pub fn from_pieces(grid_size: usize, pieces: Vec<PieceId>) -> PermutationResult<Self> {
        let expected = cell_count(grid_size)?;
        if pieces.len() != expected {
            return Err(PermutationError::WrongLength {
                expected,
                actual: pieces.len(),
            });
        }

        let mut seen = vec![false; expected];
        for &piece in &pieces {
            match seen.get_mut(piece) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(PermutationError::NotABijection { piece }),
            }
        }

        Ok(Self {
            grid_size,
            cells: pieces,
        })
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Number of cells (n²)
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The piece currently sitting in `cell`
    pub fn piece_at(&self, cell: CellIndex) -> Option<PieceId> {
        self.cells.get(cell).copied()
    }

    /// The cell currently holding `piece`
    pub fn cell_of(&self, piece: PieceId) -> Option<CellIndex> {
        self.cells.iter().position(|&p| p == piece)
    }

    /// Cell → piece view of the whole board
    pub fn pieces(&self) -> &[PieceId] {
        &self.cells
    }

    pub fn position(&self, cell: CellIndex) -> Position {
        Position::from_index(cell, self.grid_size)
    }

    /// Solved means every cell holds its own piece
    pub fn is_solved(&self) -> bool {
        self.cells.iter().enumerate().all(|(cell, &piece)| cell == piece)
    }

    /// Number of cells holding a foreign piece
    pub fn misplaced_count(&self) -> usize {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(cell, &piece)| cell != piece)
            .count()
    }

    /// Exchange the pieces of two cells.
    ///
    /// Returns `Ok(false)` without touching the board when `a == b`.
    pub fn swap(&mut self, a: CellIndex, b: CellIndex) -> PermutationResult<bool> {
        let len = self.cells.len();
        for cell in [a, b] {
            if cell >= len {
                return Err(PermutationError::CellOutOfRange { cell, len });
            }
        }
        if a == b {
            return Ok(false);
        }
        self.cells.swap(a, b);
        Ok(true)
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [PieceId] {
        &mut self.cells
    }
}
