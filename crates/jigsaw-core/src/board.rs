//! Mapping from the arrangement to on-screen tile placement
//!
//! Layout is a pure function of the permutation: each piece keeps its own
//! background crop (derived from the piece id) and only its translation
//! changes as it moves between cells.

use crate::permutation::{CellIndex, Permutation, PieceId, Position};
use serde::Serialize;

/// Placement of one piece
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileLayout {
    pub piece: PieceId,
    /// Cell the piece currently occupies
    pub cell: CellIndex,
    pub row: usize,
    pub col: usize,
    /// Translation in percent of one tile's size
    pub translate_x_pct: f64,
    pub translate_y_pct: f64,
    /// Background crop in percent of the free image range
    pub background_x_pct: f64,
    pub background_y_pct: f64,
}

impl TileLayout {
    /// CSS transform placing the tile in its cell
    pub fn transform_css(&self) -> String {
        format!(
            "translate3d({}%, {}%, 0)",
            self.translate_x_pct, self.translate_y_pct
        )
    }

    pub fn background_position_css(&self) -> String {
        format!("{}% {}%", self.background_x_pct, self.background_y_pct)
    }

    pub fn aria_label(&self) -> String {
        format!(
            "Tile {}, currently at row {} column {}",
            self.piece + 1,
            self.row + 1,
            self.col + 1
        )
    }
}

/// Placement of every piece, indexed by piece id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardLayout {
    pub grid_size: usize,
    pub tiles: Vec<TileLayout>,
}

impl BoardLayout {
    pub fn tile_for_piece(&self, piece: PieceId) -> Option<&TileLayout> {
        self.tiles.get(piece)
    }

    pub fn tile_at_cell(&self, cell: CellIndex) -> Option<&TileLayout> {
        self.tiles.iter().find(|t| t.cell == cell)
    }
}

/// Background crop of a piece: `col * 100 / (n - 1)` percent per axis
fn background_pct(index: usize, grid_size: usize) -> f64 {
    if grid_size <= 1 {
        0.0
    } else {
        index as f64 * 100.0 / (grid_size - 1) as f64
    }
}

/// Compute where every piece is drawn
pub fn layout(perm: &Permutation) -> BoardLayout {
    let grid_size = perm.grid_size();
    let mut tiles: Vec<Option<TileLayout>> = vec![None; perm.len()];

    for (cell, &piece) in perm.pieces().iter().enumerate() {
        let at = Position::from_index(cell, grid_size);
        let home = Position::from_index(piece, grid_size);
        tiles[piece] = Some(TileLayout {
            piece,
            cell,
            row: at.row,
            col: at.col,
            translate_x_pct: at.col as f64 * 100.0,
            translate_y_pct: at.row as f64 * 100.0,
            background_x_pct: background_pct(home.col, grid_size),
            background_y_pct: background_pct(home.row, grid_size),
        });
    }

    BoardLayout {
        grid_size,
        // A permutation covers every piece exactly once
        tiles: tiles.into_iter().flatten().collect(),
    }
}

/// Axis-aligned rectangle in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Half-open containment: the right and bottom edges are outside
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && y >= self.top && x < self.left + self.width && y < self.top + self.height
    }
}

/// The board's on-screen rectangle and grid size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoardGeometry {
    pub rect: Rect,
    pub grid_size: usize,
}

impl BoardGeometry {
    pub fn new(rect: Rect, grid_size: usize) -> Self {
        Self { rect, grid_size }
    }

    pub fn cell_width(&self) -> f64 {
        self.rect.width / self.grid_size.max(1) as f64
    }

    pub fn cell_height(&self) -> f64 {
        self.rect.height / self.grid_size.max(1) as f64
    }

    /// Cell under a client-space point, or `None` outside the board
    pub fn cell_at(&self, x: f64, y: f64) -> Option<CellIndex> {
        if self.grid_size == 0 || !self.rect.contains(x, y) {
            return None;
        }
        let col = ((x - self.rect.left) / self.cell_width()) as usize;
        let row = ((y - self.rect.top) / self.cell_height()) as usize;
        let last = self.grid_size - 1;
        Some(Position::new(row.min(last), col.min(last)).to_index(self.grid_size))
    }

    /// Client-space rectangle of a cell
    pub fn cell_rect(&self, cell: CellIndex) -> Rect {
        let at = Position::from_index(cell, self.grid_size.max(1));
        Rect::new(
            self.rect.left + at.col as f64 * self.cell_width(),
            self.rect.top + at.row as f64 * self.cell_height(),
            self.cell_width(),
            self.cell_height(),
        )
    }

    /// Centre of a cell, handy for synthesising pointer events
    pub fn cell_center(&self, cell: CellIndex) -> (f64, f64) {
        let r = self.cell_rect(cell);
        (r.left + r.width / 2.0, r.top + r.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_places_pieces_by_cell() {
        let perm = Permutation::from_pieces(2, vec![3, 0, 1, 2]).unwrap();
        let layout = layout(&perm);

        let piece3 = layout.tile_for_piece(3).unwrap();
        assert_eq!((piece3.cell, piece3.row, piece3.col), (0, 0, 0));
        assert_eq!(piece3.transform_css(), "translate3d(0%, 0%, 0)");
        // Crop follows the piece, not the cell
        assert_eq!(piece3.background_position_css(), "100% 100%");

        let piece2 = layout.tile_for_piece(2).unwrap();
        assert_eq!((piece2.row, piece2.col), (1, 1));
        assert_eq!(piece2.transform_css(), "translate3d(100%, 100%, 0)");
        assert_eq!(piece2.aria_label(), "Tile 3, currently at row 2 column 2");
    }

    #[test]
    fn test_layout_is_idempotent() {
        let perm = Permutation::from_pieces(3, vec![8, 7, 6, 5, 4, 3, 2, 1, 0]).unwrap();
        assert_eq!(layout(&perm), layout(&perm));
        assert_eq!(layout(&perm).tiles.len(), 9);
    }

    #[test]
    fn test_cell_at_and_bounds() {
        let geometry = BoardGeometry::new(Rect::new(10.0, 20.0, 400.0, 400.0), 4);
        assert_eq!(geometry.cell_at(10.0, 20.0), Some(0));
        assert_eq!(geometry.cell_at(409.0, 419.0), Some(15));
        assert_eq!(geometry.cell_at(115.0, 125.0), Some(5));
        assert_eq!(geometry.cell_at(410.0, 30.0), None);
        assert_eq!(geometry.cell_at(9.0, 30.0), None);
    }

    #[test]
    fn test_cell_rect_and_center() {
        let geometry = BoardGeometry::new(Rect::new(0.0, 0.0, 300.0, 300.0), 3);
        assert_eq!(geometry.cell_rect(4), Rect::new(100.0, 100.0, 100.0, 100.0));
        assert_eq!(geometry.cell_center(8), (250.0, 250.0));
        assert_eq!(geometry.cell_at(250.0, 250.0), Some(8));
    }
}
