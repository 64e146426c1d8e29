#![forbid(unsafe_code)]

//! Fixed-capacity tile ring for one half of a segment.
//!
//! [`TilePool`] keeps a sliding window of tiles: hidden history on one side
//! of the cursor, queued tiles on the other. Every [`advance`](TilePool::advance)
//! inserts exactly one tile and evicts exactly one, so `len() == capacity()`
//! for the pool's whole life.
//!
//! The two halves store their window in opposite directions:
//!
//! ```text
//! upper: [newest .. queued, CURRENT, history .. oldest]   push front, evict back
//! lower: [oldest .. history, CURRENT, queued .. newest]   push back, evict front
//! ```

use std::collections::VecDeque;

use crate::tile::{Half, Tile, TilePhase};

/// Ring of rendered tiles with a cursor on the visible tile.
#[derive(Debug, Clone)]
pub struct TilePool {
    half: Half,
    tiles: VecDeque<Tile>,
    capacity: usize,
    cursor: usize,
}

impl TilePool {
    /// Build a pool from tiles already in storage order. The pool's capacity
    /// is fixed to the number of tiles supplied.
    pub(crate) fn from_tiles(half: Half, tiles: Vec<Tile>, cursor: usize) -> Self {
        debug_assert!(cursor < tiles.len(), "cursor outside the pool");
        let capacity = tiles.len();
        Self {
            half,
            tiles: tiles.into(),
            capacity,
            cursor,
        }
    }

    /// Shift the window by one tile.
    ///
    /// The previous falling tile lands, the current tile starts falling, the
    /// oldest tile is evicted and returned, `incoming` joins at the newest
    /// end, and the next queued tile becomes current.
    pub(crate) fn advance(&mut self, incoming: Tile) -> Option<Tile> {
        self.land();
        if let Some(tile) = self.tiles.get_mut(self.cursor) {
            tile.phase = TilePhase::Falling;
        }

        let evicted = match self.half {
            Half::Upper => {
                let oldest = self.tiles.pop_back();
                self.tiles.push_front(incoming);
                oldest
            }
            Half::Lower => {
                let oldest = self.tiles.pop_front();
                self.tiles.push_back(incoming);
                oldest
            }
        };

        if let Some(tile) = self.tiles.get_mut(self.cursor) {
            tile.phase = TilePhase::Current;
        }
        evicted
    }

    /// Which half this pool renders.
    #[must_use]
    pub const fn half(&self) -> Half {
        self.half
    }

    /// The tile under the cursor.
    #[must_use]
    pub fn current(&self) -> &Tile {
        &self.tiles[self.cursor]
    }

    /// Cursor position in storage order.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// The tile that becomes current on the next advance, if it is already
    /// loaded. `None` means the incoming tile will be shown directly.
    #[must_use]
    pub fn upcoming(&self) -> Option<&Tile> {
        match self.half {
            Half::Upper => self.cursor.checked_sub(1).and_then(|i| self.tiles.get(i)),
            Half::Lower => self.tiles.get(self.cursor + 1),
        }
    }

    /// The tile that most recently left the cursor, while it is still falling.
    #[must_use]
    pub fn falling(&self) -> Option<&Tile> {
        self.tiles
            .get(self.falling_slot()?)
            .filter(|tile| tile.phase == TilePhase::Falling)
    }

    /// Move the falling tile, if any, back to hidden history.
    pub(crate) fn land(&mut self) {
        let Some(index) = self.falling_slot() else {
            return;
        };
        if let Some(tile) = self.tiles.get_mut(index) {
            if tile.phase == TilePhase::Falling {
                tile.phase = TilePhase::Hidden;
            }
        }
    }

    /// Tiles currently in `phase`.
    #[must_use]
    pub fn count_in(&self, phase: TilePhase) -> usize {
        self.tiles.iter().filter(|tile| tile.phase == phase).count()
    }

    fn falling_slot(&self) -> Option<usize> {
        match self.half {
            Half::Upper => self.cursor.checked_add(1),
            Half::Lower => self.cursor.checked_sub(1),
        }
    }

    /// Number of tiles currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false for a seeded pool.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Fixed number of tiles this pool holds.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over tiles in storage order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Remove every tile, handing each to `release`.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Tile> + '_ {
        self.tiles.drain(..)
    }
}
