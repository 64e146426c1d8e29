#![forbid(unsafe_code)]

//! Terminal drawing for the clock.
//!
//! [`TermRenderer`] is the tile registry the display talks to. It remembers
//! every live tile and marks itself dirty on each change, so the app only
//! repaints when a flap actually moved. [`Surface`] turns segment views into
//! crossterm commands: every segment is a two-row tile, upper half over lower
//! half, with a falling flap drawn dimmed over the lower half.

use std::collections::HashMap;
use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{QueueableCommand, queue};
use splitflap_core::{Half, RenderError, SegmentView, TileHandle, TilePhase, TileRenderer};
use unicode_width::UnicodeWidthStr;

/// A tile as the terminal knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermTile {
    pub half: Half,
    pub glyph: String,
    pub phase: TilePhase,
}

/// Tile registry backing a clock display.
#[derive(Debug, Default)]
pub struct TermRenderer {
    tiles: HashMap<TileHandle, TermTile>,
    next_handle: u64,
    dirty: bool,
}

impl TermRenderer {
    /// Number of tiles currently allocated.
    #[must_use]
    pub fn live(&self) -> usize {
        self.tiles.len()
    }

    /// Tiles currently in `phase`.
    pub fn in_phase(&self, phase: TilePhase) -> impl Iterator<Item = &TermTile> {
        self.tiles.values().filter(move |tile| tile.phase == phase)
    }

    /// Whether anything changed since the last call, clearing the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl TileRenderer for TermRenderer {
    fn create(
        &mut self,
        half: Half,
        glyph: &str,
        phase: TilePhase,
    ) -> Result<TileHandle, RenderError> {
        let handle = TileHandle(self.next_handle);
        self.next_handle = self
            .next_handle
            .checked_add(1)
            .ok_or_else(|| RenderError::new("tile handles exhausted"))?;
        self.tiles.insert(
            handle,
            TermTile {
                half,
                glyph: glyph.to_string(),
                phase,
            },
        );
        self.dirty = true;
        Ok(handle)
    }

    fn transition(
        &mut self,
        half: Half,
        handle: TileHandle,
        phase: TilePhase,
    ) -> Result<(), RenderError> {
        let tile = self
            .tiles
            .get_mut(&handle)
            .ok_or_else(|| RenderError::new(format!("unknown {half} tile {}", handle.0)))?;
        tile.phase = phase;
        self.dirty = true;
        Ok(())
    }

    fn release(&mut self, half: Half, handle: TileHandle) {
        if self.tiles.remove(&handle).is_none() {
            tracing::debug!(%half, handle = handle.0, "release of unknown tile");
        }
        self.dirty = true;
    }
}

/// Where one segment's tile lands and what it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileCell<'a> {
    pub x: u16,
    pub width: u16,
    pub upper: &'a str,
    pub lower: &'a str,
    /// The lower row shows a flap still falling.
    pub lower_falling: bool,
}

/// Lay segments out left to right, one column of padding between tiles.
///
/// `widths` gives each segment's glyph width; missing entries count as one.
#[must_use]
pub fn layout<'a>(views: &[SegmentView<'a>], widths: &[usize], origin_x: u16) -> Vec<TileCell<'a>> {
    let mut x = origin_x;
    views
        .iter()
        .enumerate()
        .map(|(i, view)| {
            let width = widths.get(i).copied().unwrap_or(1).max(1);
            let width = u16::try_from(width).unwrap_or(u16::MAX);
            let (lower, lower_falling) = match view.falling {
                Some(falling) => (falling, true),
                None => (view.glyph, false),
            };
            let cell = TileCell {
                x,
                width,
                upper: view.glyph,
                lower,
                lower_falling,
            };
            x = x.saturating_add(width).saturating_add(1);
            cell
        })
        .collect()
}

/// Total columns a layout occupies.
#[must_use]
pub fn layout_width(widths: &[usize]) -> u16 {
    let cells: usize = widths.iter().map(|w| (*w).max(1) + 1).sum();
    u16::try_from(cells.saturating_sub(1)).unwrap_or(u16::MAX)
}

/// Buffered crossterm output.
pub struct Surface<W: Write> {
    out: W,
}

impl<W: Write> Surface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn clear(&mut self) -> io::Result<()> {
        self.out.queue(Clear(ClearType::All))?;
        Ok(())
    }

    /// Draw tiles at row `y` (upper halves) and `y + 1` (lower halves).
    pub fn draw_tiles(&mut self, cells: &[TileCell<'_>], y: u16) -> io::Result<()> {
        for cell in cells {
            let upper = pad(cell.upper, cell.width);
            let lower = pad(cell.lower, cell.width);
            queue!(
                self.out,
                MoveTo(cell.x, y),
                SetAttribute(Attribute::Reverse),
                Print(upper),
                SetAttribute(Attribute::Reset),
                MoveTo(cell.x, y.saturating_add(1)),
                SetAttribute(Attribute::Reverse),
            )?;
            if cell.lower_falling {
                queue!(self.out, SetAttribute(Attribute::Dim))?;
            }
            queue!(self.out, Print(lower), SetAttribute(Attribute::Reset))?;
        }
        Ok(())
    }

    /// Draw plain text at (`x`, `y`), clearing the rest of the line.
    pub fn draw_text(&mut self, text: &str, x: u16, y: u16) -> io::Result<()> {
        queue!(
            self.out,
            MoveTo(x, y),
            Clear(ClearType::UntilNewLine),
            Print(text)
        )
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    #[cfg(test)]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }
}

fn pad(glyph: &str, width: u16) -> String {
    let fill = usize::from(width).saturating_sub(glyph.width());
    let mut cell = String::with_capacity(glyph.len() + fill);
    cell.push_str(glyph);
    cell.extend(std::iter::repeat_n(' ', fill));
    cell
}
