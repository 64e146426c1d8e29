#![forbid(unsafe_code)]

//! End-to-end display scenarios driven by a virtual clock.
//!
//! Every test passes explicit instants to the display, so timing is exact and
//! nothing sleeps.

use std::time::Duration;

use pretty_assertions::assert_eq;
use splitflap_core::{
    DisplayConfig, FlapDisplay, GlyphConfig, GlyphSet, Half, HeadlessRenderer, PositionSelector,
    RenderError, TileHandle, TilePhase, TileRenderer, catalog,
};
use tracing::Level;
use web_time::Instant;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(Level::DEBUG)
        .try_init();
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn clock_config(initial: &str) -> DisplayConfig {
    DisplayConfig::new()
        .glyphs(GlyphSet::from_chars(" 0123456789:").unwrap())
        .initial(initial)
        .step_interval(ms(100))
}

/// Poll at every interval boundary until settled; returns the instant it
/// settled at.
fn run_to_rest<R: TileRenderer>(display: &mut FlapDisplay<R>, start: Instant) -> Instant {
    let mut now = start;
    for _ in 0..1_000 {
        if display.is_settled() {
            return now;
        }
        now = display.next_deadline().unwrap_or(now);
        display.poll(now);
    }
    panic!("display did not settle: {display:?}");
}

// ============================================================================
// Convergence
// ============================================================================

#[test]
fn clock_face_steps_per_segment() {
    init_tracing();
    let mut display = FlapDisplay::new(clock_config("00:00"), HeadlessRenderer::new()).unwrap();
    let t0 = Instant::now();

    display.set_value_at("12:34", t0);
    assert_eq!(display.value(), "12:34");
    run_to_rest(&mut display, t0);

    let steps: Vec<u64> = display.segments().iter().map(|s| s.steps()).collect();
    assert_eq!(steps, vec![1, 2, 0, 3, 4]);
    assert_eq!(display.visible(), "12:34");
}

#[test]
fn segments_settle_out_of_phase() {
    let mut display = FlapDisplay::new(clock_config("00:00"), HeadlessRenderer::new()).unwrap();
    let t0 = Instant::now();
    display.set_value_at("12:34", t0);

    assert_eq!(display.visible(), "11:11");

    display.poll(t0 + ms(100));
    assert_eq!(display.visible(), "12:22");
    // segment 0 noticed it had arrived; the others keep going
    assert!(!display.segments()[0].is_advancing());
    assert!(display.segments()[4].is_advancing());

    display.poll(t0 + ms(200));
    assert_eq!(display.visible(), "12:33");
    display.poll(t0 + ms(300));
    assert_eq!(display.visible(), "12:34");
}

#[test]
fn unknown_glyph_leaves_segment_alone() {
    let mut display = FlapDisplay::new(clock_config("00:00"), HeadlessRenderer::new()).unwrap();
    let t0 = Instant::now();
    display.set_value_at("Z0:01", t0);
    assert_eq!(display.value(), "00:01");
    run_to_rest(&mut display, t0);
    assert_eq!(display.segments()[0].steps(), 0);
    assert_eq!(display.visible(), "00:01");
}

#[test]
fn backward_request_goes_all_the_way_around() {
    let mut display = FlapDisplay::new(clock_config("5"), HeadlessRenderer::new()).unwrap();
    let t0 = Instant::now();
    display.set_value_at("4", t0);
    run_to_rest(&mut display, t0);
    assert_eq!(display.segments()[0].steps(), 11);
}

// ============================================================================
// Value round-trip
// ============================================================================

#[test]
fn value_round_trips_with_padding_and_truncation() {
    let config = DisplayConfig::new()
        .glyphs(catalog::alphanumeric())
        .segments(6);
    let mut display = FlapDisplay::new(config, HeadlessRenderer::new()).unwrap();
    let t0 = Instant::now();

    display.set_value_at("HI", t0);
    assert_eq!(display.value(), "HI    ");

    display.set_value_at("LONDON CALLING", t0);
    assert_eq!(display.value(), "LONDON");

    display.set_value_at("berlin", t0);
    assert_eq!(display.value(), "berlin");
    run_to_rest(&mut display, t0);
    assert_eq!(display.visible(), "BERLIN");
}

#[test]
fn initial_value_sets_width() {
    let display = FlapDisplay::new(
        DisplayConfig::new().initial("HELLO WORLD"),
        HeadlessRenderer::new(),
    )
    .unwrap();
    assert_eq!(display.len(), 11);
    assert_eq!(display.visible(), "HELLO WORLD");
    assert!(display.is_settled());
}

#[test]
fn default_width_is_five_blanks() {
    let display = FlapDisplay::new(DisplayConfig::new(), HeadlessRenderer::new()).unwrap();
    assert_eq!(display.len(), 5);
    assert_eq!(display.value(), "     ");
}

// ============================================================================
// Scheduling
// ============================================================================

#[test]
fn rapid_updates_share_one_loop() {
    let mut display = FlapDisplay::new(clock_config("00:00"), HeadlessRenderer::new()).unwrap();
    let t0 = Instant::now();

    display.set_value_at("00:05", t0);
    let deadline = display.next_deadline();
    display.set_value_at("00:02", t0 + ms(10));
    assert_eq!(display.next_deadline(), deadline);

    run_to_rest(&mut display, t0);
    assert_eq!(display.segments()[4].steps(), 2);
    assert_eq!(display.visible(), "00:02");
}

#[test]
fn settled_display_has_no_deadline() {
    let mut display = FlapDisplay::new(clock_config("12:00"), HeadlessRenderer::new()).unwrap();
    display.set_value_at("12:00", Instant::now());
    assert_eq!(display.next_deadline(), None);
    assert!(display.is_settled());
}

#[test]
fn resting_display_draws_nothing_falling() {
    let config = clock_config("0").segments(1);
    let mut display = FlapDisplay::new(config, HeadlessRenderer::new()).unwrap();
    let t0 = Instant::now();

    display.set_value_at("1", t0);
    let view = display.views().next().unwrap();
    assert_eq!((view.glyph, view.falling), ("1", Some("0")));

    display.poll(t0 + Duration::from_secs(3600));
    assert!(display.is_settled());
    let view = display.views().next().unwrap();
    assert_eq!((view.glyph, view.falling), ("1", None));
    for segment in display.segments() {
        assert_eq!(segment.upper().count_in(TilePhase::Falling), 0);
        assert_eq!(segment.lower().count_in(TilePhase::Falling), 0);
    }
}

// ============================================================================
// Per-position sets
// ============================================================================

#[test]
fn clock_layout_with_multi_character_positions() {
    let config = DisplayConfig::new()
        .glyphs(GlyphConfig::PerPosition(vec![
            (PositionSelector::At(0), catalog::twelve()),
            (PositionSelector::At(1), GlyphSet::from_chars(":").unwrap()),
            (PositionSelector::At(2), catalog::minutes()),
        ]))
        .segments(3)
        .step_interval(ms(50));
    let mut display = FlapDisplay::new(config, HeadlessRenderer::new()).unwrap();
    assert_eq!(display.value(), "1:00");

    let t0 = Instant::now();
    display.set_glyphs_at(&["11", ":", "45"], t0);
    run_to_rest(&mut display, t0);
    assert_eq!(display.visible(), "11:45");
}

// ============================================================================
// Renderer failures and teardown
// ============================================================================

/// Headless renderer whose create calls can be switched off.
#[derive(Default)]
struct Flaky {
    inner: HeadlessRenderer,
    broken: bool,
}

impl TileRenderer for Flaky {
    fn create(
        &mut self,
        half: Half,
        glyph: &str,
        phase: TilePhase,
    ) -> Result<TileHandle, RenderError> {
        if self.broken {
            return Err(RenderError::new("surface lost"));
        }
        self.inner.create(half, glyph, phase)
    }

    fn transition(
        &mut self,
        half: Half,
        handle: TileHandle,
        phase: TilePhase,
    ) -> Result<(), RenderError> {
        self.inner.transition(half, handle, phase)
    }

    fn release(&mut self, half: Half, handle: TileHandle) {
        self.inner.release(half, handle);
    }
}

#[test]
fn drop_releases_tiles_of_borrowed_renderer() {
    init_tracing();
    let mut flaky = Flaky::default();
    {
        let mut display = FlapDisplay::new(clock_config("00:00"), &mut flaky).unwrap();
        let t0 = Instant::now();
        display.set_value_at("00:03", t0);
        display.poll(t0 + ms(100));
        assert_eq!(display.visible(), "00:02");
    }
    assert_eq!(flaky.inner.live(), 0);
    assert_eq!(flaky.inner.created(), flaky.inner.released());
}

#[test]
fn stalled_segment_restarts_on_next_value() {
    let mut display = FlapDisplay::new(clock_config("00:00"), Flaky::default()).unwrap();
    let t0 = Instant::now();
    display.set_value_at("00:03", t0);
    let seeded = display.renderer().inner.live();

    set_broken(&mut display, true);
    assert_eq!(display.poll(t0 + ms(100)), 0);
    assert_eq!(display.next_deadline(), None);
    assert_eq!(display.visible(), "00:01");
    assert_eq!(display.renderer().inner.live(), seeded);

    set_broken(&mut display, false);
    display.set_value_at("00:03", t0 + ms(500));
    run_to_rest(&mut display, t0 + ms(500));
    assert_eq!(display.visible(), "00:03");
}

fn set_broken(display: &mut FlapDisplay<Flaky>, broken: bool) {
    display.renderer_mut().broken = broken;
}

#[test]
fn teardown_is_idempotent_and_final() {
    let mut display = FlapDisplay::new(clock_config("00:00"), HeadlessRenderer::new()).unwrap();
    let t0 = Instant::now();
    display.set_value_at("99:99", t0);

    display.teardown();
    display.teardown();
    assert_eq!(display.renderer().live(), 0);
    assert_eq!(display.renderer().created(), display.renderer().released());

    display.set_value_at("11:11", t0);
    assert_eq!(display.poll(t0 + ms(10_000)), 0);
    assert_eq!(display.value(), "");
    assert!(display.is_torn_down());
}
