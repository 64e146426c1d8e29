//! Property-based invariant tests for segments and displays.
//!
//! These must hold for any glyph set, starting glyph, and request sequence:
//!
//! 1. Both tile pools keep their seeded size across every step.
//! 2. Upper and lower pools show the same glyph after every step.
//! 3. A loop converges in fewer steps than the set has glyphs.
//! 4. Requesting the visible glyph takes no steps.
//! 5. Redirecting a running loop ends on the latest target.
//! 6. `value()` pads and truncates to the segment count.
//! 7. Teardown releases every tile the renderer created.
//! 8. After every step each pool has one current tile and at most one falling
//!    tile, the renderer agrees on every phase, and nothing falls once the
//!    loop has ended.

use std::collections::HashMap;
use std::time::Duration;

use proptest::prelude::*;
use splitflap_core::{
    DisplayConfig, FlapDisplay, FlipOutcome, GlyphSet, Half, HeadlessRenderer, RenderError,
    Segment, StepOutcome, TileHandle, TilePhase, TileRenderer, TileWindows, TransitionTiming,
};
use web_time::Instant;

// ── Helpers ─────────────────────────────────────────────────────────────

const POOL: &str = " ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789:.-";

fn glyph_set_strategy() -> impl Strategy<Value = GlyphSet> {
    (2usize..=POOL.len()).prop_map(|len| GlyphSet::from_chars(&POOL[..len]).unwrap())
}

fn windows_strategy() -> impl Strategy<Value = TileWindows> {
    (20u64..=400, 0u64..=400, 0u64..=400, 0u64..=400).prop_map(|(step, upper, lower, delay)| {
        let timing = TransitionTiming {
            upper_fall: Duration::from_millis(upper),
            lower_fall: Duration::from_millis(lower),
            lower_delay: Duration::from_millis(delay),
        };
        TileWindows::derive(&timing, Duration::from_millis(step)).unwrap()
    })
}

/// Tick until the loop stops, checking pool invariants after every step.
fn drive(segment: &mut Segment, renderer: &mut HeadlessRenderer) -> Result<u64, TestCaseError> {
    let upper = segment.upper().len();
    let lower = segment.lower().len();
    let before = segment.steps();
    loop {
        prop_assert_eq!(segment.upper().len(), upper);
        prop_assert_eq!(segment.lower().len(), lower);
        prop_assert_eq!(segment.upper().current().glyph, segment.lower().current().glyph);
        if segment.tick(renderer) != StepOutcome::Continue {
            break;
        }
    }
    Ok(segment.steps() - before)
}

/// Renderer that remembers the phase of every live tile.
#[derive(Default)]
struct PhaseLedger {
    phases: HashMap<TileHandle, TilePhase>,
    next: u64,
}

impl TileRenderer for PhaseLedger {
    fn create(
        &mut self,
        _half: Half,
        _glyph: &str,
        phase: TilePhase,
    ) -> Result<TileHandle, RenderError> {
        let handle = TileHandle(self.next);
        self.next += 1;
        self.phases.insert(handle, phase);
        Ok(handle)
    }

    fn transition(
        &mut self,
        _half: Half,
        handle: TileHandle,
        phase: TilePhase,
    ) -> Result<(), RenderError> {
        match self.phases.get_mut(&handle) {
            Some(slot) => {
                *slot = phase;
                Ok(())
            }
            None => Err(RenderError::new("unknown tile")),
        }
    }

    fn release(&mut self, _half: Half, handle: TileHandle) {
        self.phases.remove(&handle);
    }
}

fn check_phases(segment: &Segment, ledger: &PhaseLedger) -> Result<(), TestCaseError> {
    for pool in [segment.upper(), segment.lower()] {
        prop_assert_eq!(pool.count_in(TilePhase::Current), 1);
        prop_assert!(pool.count_in(TilePhase::Falling) <= 1);
        if !segment.is_advancing() {
            prop_assert_eq!(pool.count_in(TilePhase::Falling), 0);
        }
        for tile in pool.iter() {
            prop_assert_eq!(ledger.phases.get(&tile.handle), Some(&tile.phase));
        }
    }
    if !segment.is_advancing() {
        prop_assert_eq!(segment.view().falling, None);
    }
    Ok(())
}

// ═════════════════════════════════════════════════════════════════════════
// 1–3. Pool size, pool agreement, bounded convergence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn converges_with_stable_pools(
        set in glyph_set_strategy(),
        windows in windows_strategy(),
        start in any::<prop::sample::Index>(),
        target in any::<prop::sample::Index>(),
    ) {
        let mut renderer = HeadlessRenderer::new();
        let start = set.cyclic(start.index(set.len())).to_string();
        let target = set.cyclic(target.index(set.len())).to_string();
        let mut segment = Segment::new(set.clone(), Some(start.as_str()), windows, &mut renderer).unwrap();
        prop_assert_eq!(segment.upper().len(), windows.upper_capacity());
        prop_assert_eq!(segment.lower().len(), windows.lower_capacity());
        let seeded = renderer.live();

        let outcome = segment.flip_to(&target, &mut renderer);
        let first = u64::from(outcome == FlipOutcome::Started);
        let steps = first + drive(&mut segment, &mut renderer)?;

        prop_assert_eq!(segment.visible(), target.as_str());
        prop_assert!(steps < set.len() as u64);
        prop_assert_eq!(steps, segment.steps());
        prop_assert_eq!(renderer.live(), seeded);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn visible_glyph_request_is_free(
        set in glyph_set_strategy(),
        start in any::<prop::sample::Index>(),
    ) {
        let mut renderer = HeadlessRenderer::new();
        let windows = TileWindows::derive(&TransitionTiming::default(), Duration::from_millis(120)).unwrap();
        let glyph = set.cyclic(start.index(set.len())).to_string();
        let mut segment = Segment::new(set, Some(glyph.as_str()), windows, &mut renderer).unwrap();
        prop_assert_eq!(segment.flip_to(&glyph, &mut renderer), FlipOutcome::Settled);
        prop_assert_eq!(segment.steps(), 0);
        prop_assert!(!segment.is_advancing());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Redirect
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn redirect_ends_on_latest_target(
        set in glyph_set_strategy(),
        first in any::<prop::sample::Index>(),
        second in any::<prop::sample::Index>(),
        ticks_between in 0usize..5,
    ) {
        let mut renderer = HeadlessRenderer::new();
        let windows = TileWindows::derive(&TransitionTiming::default(), Duration::from_millis(120)).unwrap();
        let mut segment = Segment::new(set.clone(), None, windows, &mut renderer).unwrap();
        let first = set.cyclic(first.index(set.len())).to_string();
        let second = set.cyclic(second.index(set.len())).to_string();

        segment.flip_to(&first, &mut renderer);
        for _ in 0..ticks_between {
            segment.tick(&mut renderer);
        }
        segment.flip_to(&second, &mut renderer);
        drive(&mut segment, &mut renderer)?;

        prop_assert_eq!(segment.visible(), second.as_str());
        prop_assert!(!segment.is_advancing());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6–7. Display value and teardown
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn value_pads_and_truncates(
        segments in 1usize..12,
        value in "[A-Z0-9 ]{0,16}",
    ) {
        let config = DisplayConfig::new().segments(segments);
        let mut display = FlapDisplay::new(config, HeadlessRenderer::new()).unwrap();
        display.set_value_at(&value, Instant::now());

        let expected: String = value
            .chars()
            .chain(std::iter::repeat(' '))
            .take(segments)
            .collect();
        prop_assert_eq!(display.value(), expected);
    }

    #[test]
    fn teardown_releases_everything(
        segments in 1usize..8,
        value in "[A-Z0-9]{0,8}",
        polls in 0u64..20,
    ) {
        let config = DisplayConfig::new().segments(segments);
        let mut display = FlapDisplay::new(config, HeadlessRenderer::new()).unwrap();
        let t0 = Instant::now();
        display.set_value_at(&value, t0);
        display.poll(t0 + Duration::from_millis(polls * 120));

        display.teardown();
        prop_assert_eq!(display.renderer().live(), 0);
        prop_assert_eq!(display.renderer().created(), display.renderer().released());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Tile phases
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn phases_stay_consistent(
        set in glyph_set_strategy(),
        windows in windows_strategy(),
        start in any::<prop::sample::Index>(),
        requests in prop::collection::vec((any::<prop::sample::Index>(), 0usize..6), 1..6),
    ) {
        let mut ledger = PhaseLedger::default();
        let start = set.cyclic(start.index(set.len())).to_string();
        let mut segment = Segment::new(set.clone(), Some(start.as_str()), windows, &mut ledger).unwrap();
        check_phases(&segment, &ledger)?;

        for (target, ticks) in requests {
            let target = set.cyclic(target.index(set.len())).to_string();
            segment.flip_to(&target, &mut ledger);
            check_phases(&segment, &ledger)?;
            for _ in 0..ticks {
                segment.tick(&mut ledger);
                check_phases(&segment, &ledger)?;
            }
        }
        while segment.tick(&mut ledger) == StepOutcome::Continue {
            check_phases(&segment, &ledger)?;
        }
        check_phases(&segment, &ledger)?;
        prop_assert_eq!(ledger.phases.len(), segment.upper().len() + segment.lower().len());
    }
}
