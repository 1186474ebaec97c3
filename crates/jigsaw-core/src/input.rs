//! Drag-to-swap pointer resolution
//!
//! A [`DragSession`] lives from pointer-down to pointer-up (or cancel) for
//! one pointer id. While it is open the resolver keeps a hover candidate,
//! the tile under the pointer according to the front end's hit test. On
//! release the target cell is the hover candidate if there is one, else the
//! cell under the pointer when it is still inside the board.

use crate::board::{BoardGeometry, Rect};
use crate::permutation::CellIndex;
use std::collections::HashMap;

/// Identity of one pointer (mouse, pen or a single touch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// A raw pointer event in client coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub pointer: PointerId,
    pub x: f64,
    pub y: f64,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, pointer: PointerId, x: f64, y: f64) -> Self {
        Self {
            kind,
            pointer,
            x,
            y,
        }
    }

    pub fn down(pointer: PointerId, x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Down, pointer, x, y)
    }

    pub fn moved(pointer: PointerId, x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Move, pointer, x, y)
    }

    pub fn up(pointer: PointerId, x: f64, y: f64) -> Self {
        Self::new(PointerEventKind::Up, pointer, x, y)
    }

    pub fn cancel(pointer: PointerId) -> Self {
        Self::new(PointerEventKind::Cancel, pointer, 0.0, 0.0)
    }
}

/// Finds the rendered tile under a client-space point
pub trait HitTest {
    fn tile_at(&self, x: f64, y: f64) -> Option<CellIndex>;
}

impl HitTest for BoardGeometry {
    fn tile_at(&self, x: f64, y: f64) -> Option<CellIndex> {
        self.cell_at(x, y)
    }
}

/// One pointer's tile-move gesture
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub pointer: PointerId,
    /// Cell the lifted tile came from
    pub origin: CellIndex,
    /// The lifted tile's rectangle at drag start
    pub tile_rect: Rect,
    /// Board rectangle at drag start
    pub board_rect: Rect,
    /// Tile currently under the pointer, never the origin
    pub hover: Option<CellIndex>,
}

impl DragSession {
    /// Board-relative offset that centres the lifted tile on the pointer
    pub fn follow_offset(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x - self.board_rect.left - self.tile_rect.width / 2.0,
            y - self.board_rect.top - self.tile_rect.height / 2.0,
        )
    }
}

/// Hover candidate transition produced by a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverChange {
    pub previous: Option<CellIndex>,
    pub current: Option<CellIndex>,
}

/// How a gesture ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Exchange the pieces of the two cells
    Swap { from: CellIndex, to: CellIndex },
    /// No valid target; the tile returns to its origin
    Cancelled { origin: CellIndex },
}

/// Open drag sessions keyed by pointer id
#[derive(Debug, Default)]
pub struct DragResolver {
    sessions: HashMap<PointerId, DragSession>,
}

impl DragResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `pointer` lifting the tile in `origin`.
    ///
    /// Ignored (returns `None`) when the pointer already has a session or the
    /// tile is already lifted by another pointer.
    pub fn begin(
        &mut self,
        pointer: PointerId,
        origin: CellIndex,
        geometry: &BoardGeometry,
    ) -> Option<&DragSession> {
        if self.sessions.contains_key(&pointer) || self.is_lifted(origin) {
            return None;
        }
        let session = DragSession {
            pointer,
            origin,
            tile_rect: geometry.cell_rect(origin),
            board_rect: geometry.rect,
            hover: None,
        };
        log::debug!("drag start pointer={:?} cell={}", pointer, origin);
        Some(self.sessions.entry(pointer).or_insert(session))
    }

    /// Re-run the hit test for a moving pointer.
    ///
    /// Returns the transition only when the hover candidate changed.
    pub fn update(
        &mut self,
        pointer: PointerId,
        x: f64,
        y: f64,
        hit: &dyn HitTest,
    ) -> Option<HoverChange> {
        let session = self.sessions.get_mut(&pointer)?;
        let origin = session.origin;
        let current = hit.tile_at(x, y).filter(|&cell| cell != origin);
        if current == session.hover {
            return None;
        }
        let previous = std::mem::replace(&mut session.hover, current);
        Some(HoverChange { previous, current })
    }

    /// Close a session on release and resolve its target
    pub fn finish(
        &mut self,
        pointer: PointerId,
        x: f64,
        y: f64,
        geometry: &BoardGeometry,
    ) -> Option<(DragSession, DropOutcome)> {
        let session = self.sessions.remove(&pointer)?;
        let target = session.hover.or_else(|| geometry.cell_at(x, y));
        let outcome = match target {
            Some(to) if to != session.origin => DropOutcome::Swap {
                from: session.origin,
                to,
            },
            _ => DropOutcome::Cancelled {
                origin: session.origin,
            },
        };
        log::debug!("drag end pointer={:?} outcome={:?}", pointer, outcome);
        Some((session, outcome))
    }

    /// Abort a session without resolving a target
    pub fn cancel(&mut self, pointer: PointerId) -> Option<DragSession> {
        self.sessions.remove(&pointer)
    }

    /// Abort every session whose origin or hover is one of `cells`
    pub fn cancel_touching(&mut self, cells: &[CellIndex]) -> Vec<DragSession> {
        let pointers: Vec<PointerId> = self
            .sessions
            .values()
            .filter(|s| {
                cells.contains(&s.origin) || s.hover.is_some_and(|h| cells.contains(&h))
            })
            .map(|s| s.pointer)
            .collect();
        pointers
            .into_iter()
            .filter_map(|p| self.sessions.remove(&p))
            .collect()
    }

    /// Abort every open session
    pub fn cancel_all(&mut self) -> Vec<DragSession> {
        self.sessions.drain().map(|(_, s)| s).collect()
    }

    pub fn session(&self, pointer: PointerId) -> Option<&DragSession> {
        self.sessions.get(&pointer)
    }

    pub fn is_lifted(&self, cell: CellIndex) -> bool {
        self.sessions.values().any(|s| s.origin == cell)
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}
