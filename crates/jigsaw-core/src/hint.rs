//! Misplaced-piece hints

use crate::permutation::{CellIndex, Permutation, PieceId};
use serde::Serialize;

/// How long a hint stays visible, in milliseconds
pub const HINT_DURATION_MS: u64 = 3000;

/// A misplaced piece and the cell it belongs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hint {
    /// Cell currently holding the misplaced piece
    pub source: CellIndex,
    /// The piece's solved cell
    pub destination: CellIndex,
    pub piece: PieceId,
}

/// First misplaced piece in cell order, or `None` when solved.
///
/// Deterministic, so repeated hints without moves point at the same piece.
pub fn compute_hint(perm: &Permutation) -> Option<Hint> {
    perm.pieces()
        .iter()
        .enumerate()
        .find(|&(cell, &piece)| cell != piece)
        .map(|(cell, &piece)| Hint {
            source: cell,
            destination: piece,
            piece,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_mismatch() {
        let perm = Permutation::from_pieces(2, vec![1, 0, 2, 3]).unwrap();
        let hint = compute_hint(&perm).unwrap();
        assert_eq!(hint.source, 0);
        assert_eq!(hint.destination, 1);
    }

    #[test]
    fn test_skips_placed_prefix() {
        let perm = Permutation::from_pieces(2, vec![0, 1, 3, 2]).unwrap();
        let hint = compute_hint(&perm).unwrap();
        assert_eq!((hint.source, hint.destination), (2, 3));
        assert_eq!(compute_hint(&perm), Some(hint));
    }

    #[test]
    fn test_solved_has_no_hint() {
        assert_eq!(compute_hint(&Permutation::identity(3)), None);
    }
}
