#![forbid(unsafe_code)]

//! One character position of a split-flap display.
//!
//! A [`Segment`] owns an upper and a lower [`TilePool`] and walks its visible
//! glyph forward through its [`GlyphSet`], one glyph per step, until it shows
//! the requested target. Like a mechanical flap it never moves backward:
//! reaching an earlier glyph means going all the way around.
//!
//! # Convergence loop
//!
//! [`flip_to`](Segment::flip_to) records the target and, if no loop is
//! running, runs the first iteration immediately. Each further iteration is
//! a [`tick`](Segment::tick) fired by the owner's timer. A request made while
//! a loop is running only swaps the target; the running loop picks it up on
//! its next tick.
//!
//! # Invariants
//!
//! 1. Both pools keep their seeded size across every step.
//! 2. Upper and lower pools always show the same glyph.
//! 3. A segment whose visible glyph equals its target performs no steps.
//! 4. A renderer failure leaves pools, `last_loaded` and the renderer's
//!    phases as they were.
//! 5. Each pool has one current tile and at most one falling tile; nothing
//!    falls once the loop has ended.

use tracing::{debug, trace, warn};

use crate::error::{FlapError, RenderError};
use crate::glyphs::GlyphSet;
use crate::tile::{Half, Tile, TileHandle, TilePhase, TileRenderer};
use crate::tile_pool::TilePool;
use crate::timing::{CACHE_FRAMES, TileWindows};

/// Result of a [`Segment::flip_to`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// The glyph is not in the segment's set; nothing changed.
    Ignored,
    /// Already showing the target; no loop was started.
    Settled,
    /// A new loop started and took its first step; schedule a tick.
    Started,
    /// A loop was already running and will observe the new target.
    Redirected,
    /// The first step failed in the renderer; the loop did not start.
    Stalled,
}

/// Result of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The visible glyph matches the target; the loop ended.
    Settled,
    /// One step was taken; schedule another tick.
    Continue,
    /// The renderer failed; the loop ended without a step.
    Stalled,
}

/// Read-only view of a segment for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentView<'a> {
    /// Glyph under the cursor.
    pub glyph: &'a str,
    /// Glyph of the tile that just left the cursor, while it still falls.
    pub falling: Option<&'a str>,
    /// Most recently requested glyph.
    pub target: &'a str,
    /// Whether a convergence loop is scheduled.
    pub advancing: bool,
}

/// One character cell with its two tile pools.
#[derive(Debug)]
pub struct Segment {
    glyphs: GlyphSet,
    target: Box<str>,
    target_index: usize,
    upper: TilePool,
    lower: TilePool,
    last_loaded: usize,
    advancing: bool,
    steps: u64,
}

impl Segment {
    /// Seed a segment showing `initial` (or the rest glyph).
    ///
    /// An `initial` glyph outside the set starts the segment on the rest
    /// glyph. If the renderer fails, every tile created so far is released.
    pub fn new<R>(
        glyphs: GlyphSet,
        initial: Option<&str>,
        windows: TileWindows,
        renderer: &mut R,
    ) -> Result<Self, FlapError>
    where
        R: TileRenderer + ?Sized,
    {
        let (start, target): (usize, Box<str>) = match initial {
            Some(glyph) => match glyphs.position(glyph) {
                Some(index) => (index, glyph.into()),
                None => {
                    debug!(glyph, "initial glyph not in set, starting blank");
                    (0, glyphs.blank().into())
                }
            },
            None => (0, glyphs.blank().into()),
        };

        let len = glyphs.len();
        let back = |k: usize| (start + len - k % len) % len;
        let ahead = |k: usize| (start + k) % len;

        // upper: [t+C-1 .. t+1, t, t-1 .. t-H]
        let mut upper_plan = Vec::with_capacity(windows.upper_capacity());
        for k in (0..CACHE_FRAMES).rev() {
            upper_plan.push((ahead(k), cache_phase(k)));
        }
        for k in 1..=windows.upper {
            upper_plan.push((back(k), TilePhase::Hidden));
        }

        // lower: [t-H .. t-1, t, t+1 .. t+C-1]
        let mut lower_plan = Vec::with_capacity(windows.lower_capacity());
        for k in (1..=windows.lower).rev() {
            lower_plan.push((back(k), TilePhase::Hidden));
        }
        for k in 0..CACHE_FRAMES {
            lower_plan.push((ahead(k), cache_phase(k)));
        }

        let mut upper = seed_pool(Half::Upper, &glyphs, &upper_plan, CACHE_FRAMES - 1, renderer)?;
        let lower = match seed_pool(Half::Lower, &glyphs, &lower_plan, windows.lower, renderer) {
            Ok(pool) => pool,
            Err(err) => {
                for tile in upper.drain() {
                    renderer.release(Half::Upper, tile.handle);
                }
                return Err(err.into());
            }
        };

        Ok(Self {
            target_index: start,
            last_loaded: ahead(CACHE_FRAMES - 1),
            glyphs,
            target,
            upper,
            lower,
            advancing: false,
            steps: 0,
        })
    }

    /// Request `glyph`. Unknown glyphs are ignored.
    pub fn flip_to<R>(&mut self, glyph: &str, renderer: &mut R) -> FlipOutcome
    where
        R: TileRenderer + ?Sized,
    {
        let Some(index) = self.glyphs.position(glyph) else {
            debug!(glyph, "glyph not in set, request ignored");
            return FlipOutcome::Ignored;
        };
        self.target = glyph.into();
        self.target_index = index;

        if self.advancing {
            return FlipOutcome::Redirected;
        }
        match self.tick(renderer) {
            StepOutcome::Settled => FlipOutcome::Settled,
            StepOutcome::Continue => FlipOutcome::Started,
            StepOutcome::Stalled => FlipOutcome::Stalled,
        }
    }

    /// Run one loop iteration: stop if the target is showing, otherwise step.
    ///
    /// A loop that ends, settled or stalled, lands its last falling tiles.
    pub fn tick<R>(&mut self, renderer: &mut R) -> StepOutcome
    where
        R: TileRenderer + ?Sized,
    {
        if self.is_settled() {
            if self.advancing {
                trace!(glyph = &*self.target, steps = self.steps, "segment settled");
            }
            self.advancing = false;
            self.land(renderer);
            return StepOutcome::Settled;
        }
        match self.advance(renderer) {
            Ok(()) => {
                self.advancing = true;
                StepOutcome::Continue
            }
            Err(err) => {
                warn!(error = %err, glyph = &*self.target, "segment step failed, loop stopped");
                self.advancing = false;
                self.land(renderer);
                StepOutcome::Stalled
            }
        }
    }

    /// Move the visible glyph forward by one. All renderer calls that can
    /// fail run before any pool is touched, and a failure undoes the calls
    /// that already went through.
    pub(crate) fn advance<R>(&mut self, renderer: &mut R) -> Result<(), RenderError>
    where
        R: TileRenderer + ?Sized,
    {
        let next = (self.last_loaded + 1) % self.glyphs.len();
        let glyph = self.glyphs.cyclic(next);

        let upper_handle = renderer.create(Half::Upper, glyph, TilePhase::Queued)?;
        let lower_handle = match renderer.create(Half::Lower, glyph, TilePhase::Queued) {
            Ok(handle) => handle,
            Err(err) => {
                renderer.release(Half::Upper, upper_handle);
                return Err(err);
            }
        };
        let upper_plan = step_plan(&self.upper, upper_handle);
        let lower_plan = step_plan(&self.lower, lower_handle);
        let mut announced = apply_plan(Half::Upper, &upper_plan, renderer);
        if announced.is_ok() {
            announced = apply_plan(Half::Lower, &lower_plan, renderer);
            if announced.is_err() {
                revert(Half::Upper, &upper_plan, renderer);
            }
        }
        if let Err(err) = announced {
            renderer.release(Half::Upper, upper_handle);
            renderer.release(Half::Lower, lower_handle);
            return Err(err);
        }

        self.last_loaded = next;
        for (pool, handle) in [
            (&mut self.upper, upper_handle),
            (&mut self.lower, lower_handle),
        ] {
            let incoming = Tile {
                glyph: next,
                phase: TilePhase::Queued,
                handle,
            };
            if let Some(evicted) = pool.advance(incoming) {
                renderer.release(pool.half(), evicted.handle);
            }
        }
        self.steps += 1;
        Ok(())
    }

    /// Hide the tiles still falling from the last step.
    fn land<R>(&mut self, renderer: &mut R)
    where
        R: TileRenderer + ?Sized,
    {
        for pool in [&mut self.upper, &mut self.lower] {
            let Some(handle) = pool.falling().map(|tile| tile.handle) else {
                continue;
            };
            match renderer.transition(pool.half(), handle, TilePhase::Hidden) {
                Ok(()) => pool.land(),
                Err(err) => {
                    warn!(error = %err, half = %pool.half(), "falling tile did not land");
                }
            }
        }
    }

    /// Release every pooled tile. The segment is unusable afterwards.
    pub(crate) fn release<R>(&mut self, renderer: &mut R)
    where
        R: TileRenderer + ?Sized,
    {
        for pool in [&mut self.upper, &mut self.lower] {
            let half = pool.half();
            for tile in pool.drain() {
                renderer.release(half, tile.handle);
            }
        }
        self.advancing = false;
    }

    /// The segment's glyph set.
    #[must_use]
    pub fn glyph_set(&self) -> &GlyphSet {
        &self.glyphs
    }

    /// Most recently requested glyph, as requested.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Index of the glyph under the cursor.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.upper.current().glyph
    }

    /// Glyph under the cursor, in the set's own spelling.
    #[must_use]
    pub fn visible(&self) -> &str {
        self.glyphs.cyclic(self.current_index())
    }

    /// Index most recently loaded into the pools.
    #[must_use]
    pub const fn last_loaded(&self) -> usize {
        self.last_loaded
    }

    /// Whether the visible glyph is the target.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.current_index() == self.target_index
    }

    /// Whether a convergence loop is running.
    #[must_use]
    pub const fn is_advancing(&self) -> bool {
        self.advancing
    }

    /// Whether case is ignored when matching requests.
    #[must_use]
    pub const fn is_case_insensitive(&self) -> bool {
        self.glyphs.is_case_insensitive()
    }

    /// Steps taken since construction.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Steps still needed to show the current target.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.glyphs
            .forward_distance(self.current_index(), self.target_index)
    }

    #[must_use]
    pub fn upper(&self) -> &TilePool {
        &self.upper
    }

    #[must_use]
    pub fn lower(&self) -> &TilePool {
        &self.lower
    }

    #[must_use]
    pub fn view(&self) -> SegmentView<'_> {
        SegmentView {
            glyph: self.visible(),
            falling: self.upper.falling().map(|tile| self.glyphs.cyclic(tile.glyph)),
            target: &self.target,
            advancing: self.advancing,
        }
    }
}

fn cache_phase(k: usize) -> TilePhase {
    if k == 0 {
        TilePhase::Current
    } else {
        TilePhase::Queued
    }
}

fn seed_pool<R>(
    half: Half,
    glyphs: &GlyphSet,
    plan: &[(usize, TilePhase)],
    cursor: usize,
    renderer: &mut R,
) -> Result<TilePool, RenderError>
where
    R: TileRenderer + ?Sized,
{
    let mut tiles = Vec::with_capacity(plan.len());
    for &(glyph, phase) in plan {
        match renderer.create(half, glyphs.cyclic(glyph), phase) {
            Ok(handle) => tiles.push(Tile {
                glyph,
                phase,
                handle,
            }),
            Err(err) => {
                for tile in tiles {
                    renderer.release(half, tile.handle);
                }
                return Err(err);
            }
        }
    }
    Ok(TilePool::from_tiles(half, tiles, cursor))
}

/// One tile's phase change within a step.
#[derive(Debug, Clone, Copy)]
struct PhaseChange {
    handle: TileHandle,
    from: TilePhase,
    to: TilePhase,
}

/// Phase changes the next advance of `pool` implies, in the order they are
/// reported.
fn step_plan(pool: &TilePool, incoming: TileHandle) -> Vec<PhaseChange> {
    let mut plan = Vec::with_capacity(3);
    if let Some(tile) = pool.falling() {
        plan.push(PhaseChange {
            handle: tile.handle,
            from: TilePhase::Falling,
            to: TilePhase::Hidden,
        });
    }
    plan.push(PhaseChange {
        handle: pool.current().handle,
        from: TilePhase::Current,
        to: TilePhase::Falling,
    });
    plan.push(PhaseChange {
        handle: pool.upcoming().map_or(incoming, |tile| tile.handle),
        from: TilePhase::Queued,
        to: TilePhase::Current,
    });
    plan
}

/// Report `plan` to the renderer. On failure the changes already reported
/// are undone, newest first.
fn apply_plan<R>(half: Half, plan: &[PhaseChange], renderer: &mut R) -> Result<(), RenderError>
where
    R: TileRenderer + ?Sized,
{
    for (done, change) in plan.iter().enumerate() {
        if let Err(err) = renderer.transition(half, change.handle, change.to) {
            revert(half, &plan[..done], renderer);
            return Err(err);
        }
    }
    Ok(())
}

fn revert<R>(half: Half, applied: &[PhaseChange], renderer: &mut R)
where
    R: TileRenderer + ?Sized,
{
    for change in applied.iter().rev() {
        if let Err(err) = renderer.transition(half, change.handle, change.from) {
            warn!(error = %err, %half, handle = change.handle.0, "could not restore tile phase");
        }
    }
}
