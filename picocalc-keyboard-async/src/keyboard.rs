//! Core implementation of the keyboard event decoder.

use embassy_time::{Duration, Instant, Ticker};
use heapless::Vec;
use log::{debug, trace, warn};
use picocalc_regmap_async::{regmap::RegisterMap, regs};

use crate::{
    config::KeyboardConfig,
    event::{KeyState, RawEvent},
    keymap::{self, KeyMapping},
    sink::{EventSink, PointerButton},
};

/// Depth of the microcontroller's key-event queue. One drain reads at
/// most this many slots.
pub const FIFO_DEPTH: usize = 31;

// Direction-held bits of the mouse emulation mask.
const DIR_UP: u8 = 1 << 0;
const DIR_DOWN: u8 = 1 << 1;
const DIR_LEFT: u8 = 1 << 2;
const DIR_RIGHT: u8 = 1 << 3;

/// Decoder state that survives across poll cycles.
///
/// Everything else lives and dies with the cycle that produced it. A
/// direction bit is set only while its key's `Pressed` is more recent
/// than the matching `Released`.
#[derive(Debug, Default)]
struct DecoderContext {
    mouse_mode: bool,
    held: u8,
    /// When the current directional press run began. Stamped only on a
    /// direction bit's 0-to-1 edge, so holding a key keeps the run aging.
    press_run_started: Option<Instant>,
    last_activity: Option<Instant>,
}

/// Decodes the keyboard microcontroller's event queue into host input
/// events.
///
/// Owns the register transport, the event sink and the persistent decoder
/// state; [`Self::run`] drives it from a single task, so the processor
/// can never race itself.
pub struct KeyboardController<M: RegisterMap, S: EventSink> {
    regmap: M,
    sink: S,
    config: KeyboardConfig,
    ctx: DecoderContext,
}

impl<M: RegisterMap, S: EventSink> KeyboardController<M, S> {
    /// Creates a new `KeyboardController`.
    ///
    /// # Arguments
    ///
    /// * `regmap` - Register transport to the keyboard microcontroller.
    /// * `sink` - Where decoded events are reported.
    /// * `config` - Startup configuration, `Default` for the stock
    ///   behavior.
    pub fn new(regmap: M, sink: S, config: KeyboardConfig) -> Self {
        Self {
            regmap,
            sink,
            config,
            ctx: DecoderContext::default(),
        }
    }

    /// Whether key subset reinterpretation as pointer input is active.
    pub fn mouse_mode(&self) -> bool {
        self.ctx.mouse_mode
    }

    /// When the last mapped key event was seen, if any.
    pub fn last_activity(&self) -> Option<Instant> {
        self.ctx.last_activity
    }

    /// Runs the poll loop forever at the configured cadence.
    ///
    /// A tick that fires while a cycle is still running is absorbed by
    /// the ticker rather than re-entering the decoder. Transport failures
    /// are logged; the next tick is the retry.
    pub async fn run(mut self) -> ! {
        let mut ticker = Ticker::every(self.config.poll_period);
        loop {
            ticker.next().await;
            if let Err(err) = self.poll_cycle(Instant::now()).await {
                warn!("key queue drain failed: {err:?}");
            }
        }
    }

    /// One complete poll cycle: drain the queue, decode the batch, apply
    /// the mouse emulation step, synchronize the sink.
    ///
    /// A transport failure discards the cycle's batch (partial reads
    /// included), but the cycle still completes: held directions keep
    /// moving the pointer and the sink is synchronized. The error is
    /// returned for reporting only.
    pub async fn poll_cycle(&mut self, now: Instant) -> Result<(), M::Error> {
        let (batch, drained) = match self.drain_fifo().await {
            Ok(batch) => (batch, Ok(())),
            Err(err) => (Vec::new(), Err(err)),
        };

        for event in batch {
            self.process_event(event, now);
        }
        self.emit_motion(now);
        self.sink.sync();

        drained
    }

    /// Reads up to [`FIFO_DEPTH`] queue slots, stopping early at an empty
    /// slot. Malformed slots are skipped without ending the drain, but
    /// still count against the read bound.
    async fn drain_fifo(&mut self) -> Result<Vec<RawEvent, FIFO_DEPTH>, M::Error> {
        let mut batch = Vec::new();
        for _ in 0..FIFO_DEPTH {
            let [state, scancode] = self.regmap.read_pair(regs::REG_FIF).await?;
            if state == 0 {
                break;
            }
            match KeyState::from_wire(state) {
                // At most one push per read, so the capacity holds.
                Some(state) => {
                    let _ = batch.push(RawEvent { state, scancode });
                }
                None => trace!("dropping malformed state byte {state:#04X}"),
            }
        }
        Ok(batch)
    }

    fn process_event(&mut self, event: RawEvent, now: Instant) {
        if !matches!(
            event.state,
            KeyState::Pressed | KeyState::Hold | KeyState::Released
        ) {
            return;
        }

        // The toggle key is consumed in either mode and never reaches the
        // keymap; only the press edge toggles.
        if event.scancode == self.config.toggle_scancode {
            if event.state == KeyState::Pressed {
                self.ctx.mouse_mode = !self.ctx.mouse_mode;
                // Releases are only tracked while mouse mode is on, so a
                // direction held across the toggle could never be cleared
                // again; the run state resets with the mode.
                self.ctx.held = 0;
                self.ctx.press_run_started = None;
                debug!(
                    "mouse mode {}",
                    if self.ctx.mouse_mode { "on" } else { "off" }
                );
            }
            return;
        }

        if self.ctx.mouse_mode && self.capture_mouse_key(event, now) {
            return;
        }

        self.report_key(event, now);
    }

    /// Arrow and button capture while mouse mode is active. Returns
    /// whether the event was consumed.
    fn capture_mouse_key(&mut self, event: RawEvent, now: Instant) -> bool {
        let keys = self.config.mouse_keys;

        let dir = match event.scancode {
            code if code == keys.up => Some(DIR_UP),
            code if code == keys.down => Some(DIR_DOWN),
            code if code == keys.left => Some(DIR_LEFT),
            code if code == keys.right => Some(DIR_RIGHT),
            _ => None,
        };
        if let Some(dir) = dir {
            match event.state {
                KeyState::Pressed => {
                    if self.ctx.held & dir == 0 {
                        self.ctx.press_run_started = Some(now);
                    }
                    self.ctx.held |= dir;
                }
                KeyState::Released => {
                    self.ctx.held &= !dir;
                }
                // A repeat of a held arrow is not a new movement edge;
                // it is swallowed without touching the mask.
                _ => {}
            }
            return true;
        }

        if event.scancode == keys.left_button {
            self.sink
                .button(PointerButton::Left, event.state == KeyState::Pressed);
            true
        } else if event.scancode == keys.right_button {
            self.sink
                .button(PointerButton::Right, event.state == KeyState::Pressed);
            true
        } else {
            false
        }
    }

    fn report_key(&mut self, event: RawEvent, now: Instant) {
        let code = match keymap::lookup(event.scancode) {
            KeyMapping::Ignored => return,
            KeyMapping::Unknown => {
                self.sink.scancode(event.scancode);
                warn!("no keycode for scancode {:#04X}", event.scancode);
                return;
            }
            KeyMapping::Code(code) => code,
        };

        self.sink.scancode(event.scancode);
        trace!(
            "scancode {:#04X} -> {code:?} ({:?})",
            event.scancode,
            event.state
        );

        // Only keys that map to something count as activity.
        self.ctx.last_activity = Some(now);

        // The firmware streams Hold transitions for every repeat tick;
        // autorepeat is the host input layer's job.
        if event.state == KeyState::Hold {
            return;
        }
        self.sink.key(code, event.state == KeyState::Pressed);
    }

    /// Once per cycle: turn held directions into relative motion, one
    /// delta per direction, so diagonals are two independent axis deltas.
    fn emit_motion(&mut self, now: Instant) {
        if !self.ctx.mouse_mode || self.ctx.held == 0 {
            return;
        }

        let elapsed = self
            .ctx
            .press_run_started
            .map_or(Duration::from_ticks(0), |started| now - started);
        let step = self.config.ramp.step(elapsed);

        if self.ctx.held & DIR_LEFT != 0 {
            self.sink.relative_motion(-step, 0);
        }
        if self.ctx.held & DIR_RIGHT != 0 {
            self.sink.relative_motion(step, 0);
        }
        if self.ctx.held & DIR_DOWN != 0 {
            self.sink.relative_motion(0, step);
        }
        if self.ctx.held & DIR_UP != 0 {
            self.sink.relative_motion(0, -step);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::collections::VecDeque;
    use std::vec::Vec;

    use embassy_futures::block_on;

    use super::*;
    use crate::keymap::KeyCode;

    const PRESSED: u8 = 1;
    const HOLD: u8 = 2;
    const RELEASED: u8 = 3;
    const LONG_HOLD: u8 = 4;

    const TOGGLE: u8 = 0xA3;
    const UP: u8 = 0xB5;
    const RIGHT: u8 = 0xB7;

    /// Register map whose FIFO register replays a scripted queue.
    struct ScriptedMap {
        queue: VecDeque<[u8; 2]>,
        fail_at: Option<usize>,
        reads: usize,
    }

    impl ScriptedMap {
        fn new(slots: &[[u8; 2]]) -> Self {
            Self {
                queue: slots.iter().copied().collect(),
                fail_at: None,
                reads: 0,
            }
        }
    }

    impl RegisterMap for ScriptedMap {
        type Error = &'static str;

        async fn read_u8(&mut self, _reg: u8) -> Result<u8, Self::Error> {
            Ok(0)
        }

        async fn read_pair(&mut self, reg: u8) -> Result<[u8; 2], Self::Error> {
            assert_eq!(reg, regs::REG_FIF);
            if self.fail_at == Some(self.reads) {
                return Err("bus fault");
            }
            self.reads += 1;
            Ok(self.queue.pop_front().unwrap_or([0, 0]))
        }

        async fn write_u8(&mut self, _reg: u8, _value: u8) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Emitted {
        Key(KeyCode, bool),
        Scan(u8),
        Rel(i32, i32),
        Button(PointerButton, bool),
        Sync,
    }

    #[derive(Default)]
    struct RecordingSink {
        emitted: Vec<Emitted>,
    }

    impl EventSink for RecordingSink {
        fn key(&mut self, code: KeyCode, pressed: bool) {
            self.emitted.push(Emitted::Key(code, pressed));
        }

        fn scancode(&mut self, scancode: u8) {
            self.emitted.push(Emitted::Scan(scancode));
        }

        fn relative_motion(&mut self, dx: i32, dy: i32) {
            self.emitted.push(Emitted::Rel(dx, dy));
        }

        fn button(&mut self, button: PointerButton, pressed: bool) {
            self.emitted.push(Emitted::Button(button, pressed));
        }

        fn sync(&mut self) {
            self.emitted.push(Emitted::Sync);
        }
    }

    fn controller(slots: &[[u8; 2]]) -> KeyboardController<ScriptedMap, RecordingSink> {
        KeyboardController::new(
            ScriptedMap::new(slots),
            RecordingSink::default(),
            KeyboardConfig::default(),
        )
    }

    /// Runs one poll cycle at `at_ms` and returns what the sink saw.
    fn cycle(
        controller: &mut KeyboardController<ScriptedMap, RecordingSink>,
        at_ms: u64,
    ) -> Vec<Emitted> {
        block_on(controller.poll_cycle(Instant::from_millis(at_ms))).unwrap();
        std::mem::take(&mut controller.sink.emitted)
    }

    fn queue(
        controller: &mut KeyboardController<ScriptedMap, RecordingSink>,
        slots: &[[u8; 2]],
    ) {
        controller.regmap.queue.extend(slots.iter().copied());
    }

    #[test]
    fn mapped_press_release_reports_key_events() {
        let mut kbd = controller(&[[PRESSED, b'a'], [RELEASED, b'a']]);

        assert_eq!(
            cycle(&mut kbd, 0),
            [
                Emitted::Scan(b'a'),
                Emitted::Key(KeyCode::A, true),
                Emitted::Scan(b'a'),
                Emitted::Key(KeyCode::A, false),
                Emitted::Sync,
            ],
        );
    }

    #[test]
    fn ignored_scancode_makes_no_sink_calls() {
        let mut kbd = controller(&[[PRESSED, 0x10], [RELEASED, 0x10]]);

        assert_eq!(cycle(&mut kbd, 0), [Emitted::Sync]);
    }

    #[test]
    fn unknown_scancode_reports_scan_only() {
        let mut kbd = controller(&[[PRESSED, 0xA4]]);

        assert_eq!(cycle(&mut kbd, 0), [Emitted::Scan(0xA4), Emitted::Sync]);
    }

    #[test]
    fn hold_reports_scan_but_no_key_repeat() {
        let mut kbd = controller(&[[HOLD, b'a']]);

        assert_eq!(cycle(&mut kbd, 0), [Emitted::Scan(b'a'), Emitted::Sync]);
    }

    #[test]
    fn long_hold_produces_no_output() {
        let mut kbd = controller(&[[LONG_HOLD, b'a']]);

        assert_eq!(cycle(&mut kbd, 0), [Emitted::Sync]);
    }

    #[test]
    fn malformed_state_is_skipped_without_truncating() {
        let mut kbd = controller(&[[9, b'a'], [PRESSED, b'b']]);

        assert_eq!(
            cycle(&mut kbd, 0),
            [
                Emitted::Scan(b'b'),
                Emitted::Key(KeyCode::B, true),
                Emitted::Sync,
            ],
        );
    }

    #[test]
    fn empty_slot_ends_the_drain_early() {
        let mut kbd = controller(&[[PRESSED, b'a'], [0, 0x63], [PRESSED, b'b']]);

        assert_eq!(
            cycle(&mut kbd, 0),
            [
                Emitted::Scan(b'a'),
                Emitted::Key(KeyCode::A, true),
                Emitted::Sync,
            ],
        );
        // The slot after the sentinel must not even be read.
        assert_eq!(kbd.regmap.reads, 2);
    }

    #[test]
    fn drain_is_bounded_by_fifo_depth() {
        let slots: Vec<[u8; 2]> = (0..40).map(|_| [PRESSED, b'a']).collect();
        let mut kbd = controller(&slots);

        let emitted = cycle(&mut kbd, 0);

        assert_eq!(emitted.len(), FIFO_DEPTH * 2 + 1);
        assert_eq!(kbd.regmap.reads, FIFO_DEPTH);
    }

    #[test]
    fn malformed_slots_count_against_the_read_bound() {
        // A device stuck streaming garbage must not keep the drain
        // running past the FIFO depth.
        let slots: Vec<[u8; 2]> = (0..40).map(|_| [9, b'a']).collect();
        let mut kbd = controller(&slots);

        assert_eq!(cycle(&mut kbd, 0), [Emitted::Sync]);
        assert_eq!(kbd.regmap.reads, FIFO_DEPTH);
    }

    #[test]
    fn toggle_flips_mouse_mode_on_press_edges_only() {
        let mut kbd = controller(&[[PRESSED, TOGGLE]]);

        assert_eq!(cycle(&mut kbd, 0), [Emitted::Sync]);
        assert!(kbd.mouse_mode());

        queue(&mut kbd, &[[HOLD, TOGGLE], [RELEASED, TOGGLE]]);
        assert_eq!(cycle(&mut kbd, 10), [Emitted::Sync]);
        assert!(kbd.mouse_mode());

        queue(&mut kbd, &[[PRESSED, TOGGLE]]);
        cycle(&mut kbd, 20);
        assert!(!kbd.mouse_mode());
    }

    #[test]
    fn arrow_capture_ramps_velocity_over_the_press_run() {
        let mut kbd = controller(&[[PRESSED, TOGGLE], [PRESSED, RIGHT]]);

        // The press cycle itself already moves one unit.
        assert_eq!(cycle(&mut kbd, 0), [Emitted::Rel(1, 0), Emitted::Sync]);
        // At the threshold the slow step still applies.
        assert_eq!(cycle(&mut kbd, 150), [Emitted::Rel(1, 0), Emitted::Sync]);
        assert_eq!(cycle(&mut kbd, 300), [Emitted::Rel(2, 0), Emitted::Sync]);
        assert_eq!(cycle(&mut kbd, 450), [Emitted::Rel(2, 0), Emitted::Sync]);
        assert_eq!(cycle(&mut kbd, 600), [Emitted::Rel(4, 0), Emitted::Sync]);

        queue(&mut kbd, &[[RELEASED, RIGHT]]);
        assert_eq!(cycle(&mut kbd, 610), [Emitted::Sync]);
        assert_eq!(cycle(&mut kbd, 620), [Emitted::Sync]);
    }

    #[test]
    fn diagonal_motion_is_two_axis_deltas() {
        let mut kbd = controller(&[[PRESSED, TOGGLE], [PRESSED, RIGHT], [PRESSED, UP]]);

        assert_eq!(
            cycle(&mut kbd, 0),
            [Emitted::Rel(1, 0), Emitted::Rel(0, -1), Emitted::Sync],
        );
    }

    #[test]
    fn new_direction_edge_restarts_the_ramp() {
        let mut kbd = controller(&[[PRESSED, TOGGLE], [PRESSED, RIGHT]]);

        cycle(&mut kbd, 0);

        // A second direction joining at 400 ms restarts the run for both.
        queue(&mut kbd, &[[PRESSED, UP]]);
        assert_eq!(
            cycle(&mut kbd, 400),
            [Emitted::Rel(1, 0), Emitted::Rel(0, -1), Emitted::Sync],
        );
        assert_eq!(
            cycle(&mut kbd, 500),
            [Emitted::Rel(1, 0), Emitted::Rel(0, -1), Emitted::Sync],
        );
    }

    #[test]
    fn repeated_press_of_a_held_direction_does_not_restart_the_ramp() {
        let mut kbd = controller(&[[PRESSED, TOGGLE], [PRESSED, RIGHT]]);

        cycle(&mut kbd, 0);

        queue(&mut kbd, &[[PRESSED, RIGHT]]);
        assert_eq!(cycle(&mut kbd, 400), [Emitted::Rel(2, 0), Emitted::Sync]);
    }

    #[test]
    fn arrow_hold_is_consumed_without_setting_direction() {
        let mut kbd = controller(&[[PRESSED, TOGGLE], [HOLD, RIGHT]]);

        // Captured arrows never reach the scancode channel, and a hold
        // alone starts no movement.
        assert_eq!(cycle(&mut kbd, 0), [Emitted::Sync]);
        assert_eq!(kbd.ctx.held, 0);
    }

    #[test]
    fn brackets_act_as_pointer_buttons_in_mouse_mode() {
        let mut kbd = controller(&[[PRESSED, TOGGLE], [PRESSED, b']'], [RELEASED, b']']]);

        assert_eq!(
            cycle(&mut kbd, 0),
            [
                Emitted::Button(PointerButton::Left, true),
                Emitted::Button(PointerButton::Left, false),
                Emitted::Sync,
            ],
        );

        queue(&mut kbd, &[[PRESSED, b'[']]);
        assert_eq!(
            cycle(&mut kbd, 10),
            [Emitted::Button(PointerButton::Right, true), Emitted::Sync],
        );
    }

    #[test]
    fn brackets_are_ordinary_keys_outside_mouse_mode() {
        let mut kbd = controller(&[[PRESSED, b']']]);

        assert_eq!(
            cycle(&mut kbd, 0),
            [
                Emitted::Scan(b']'),
                Emitted::Key(KeyCode::RightBrace, true),
                Emitted::Sync,
            ],
        );
    }

    #[test]
    fn other_keys_pass_through_while_mouse_mode_is_active() {
        let mut kbd = controller(&[[PRESSED, TOGGLE], [PRESSED, b'a']]);

        assert_eq!(
            cycle(&mut kbd, 0),
            [
                Emitted::Scan(b'a'),
                Emitted::Key(KeyCode::A, true),
                Emitted::Sync,
            ],
        );
    }

    #[test]
    fn transport_failure_discards_partial_batch_but_finishes_the_cycle() {
        let mut kbd = controller(&[[PRESSED, TOGGLE], [PRESSED, RIGHT]]);

        cycle(&mut kbd, 0);

        // Next drain delivers one slot, then the bus faults: the partial
        // batch is dropped, held motion and sync still happen.
        queue(&mut kbd, &[[PRESSED, b'a']]);
        kbd.regmap.fail_at = Some(kbd.regmap.reads + 1);
        let result = block_on(kbd.poll_cycle(Instant::from_millis(300)));

        assert_eq!(result, Err("bus fault"));
        assert_eq!(
            std::mem::take(&mut kbd.sink.emitted),
            [Emitted::Rel(2, 0), Emitted::Sync],
        );
    }

    #[test]
    fn empty_drain_leaves_context_unchanged() {
        let mut kbd = controller(&[]);

        assert_eq!(cycle(&mut kbd, 0), [Emitted::Sync]);
        assert!(!kbd.mouse_mode());
        assert_eq!(kbd.ctx.held, 0);
        assert_eq!(kbd.last_activity(), None);
    }

    #[test]
    fn accepted_events_advance_the_activity_clock() {
        let mut kbd = controller(&[[PRESSED, b'a']]);

        cycle(&mut kbd, 5);
        assert_eq!(kbd.last_activity(), Some(Instant::from_millis(5)));

        queue(&mut kbd, &[[RELEASED, b'a']]);
        cycle(&mut kbd, 25);
        assert_eq!(kbd.last_activity(), Some(Instant::from_millis(25)));
    }

    #[test]
    fn consumed_events_do_not_advance_the_activity_clock() {
        // Ignored, unknown and toggle scancodes never reach the mapped
        // key path, so none of them count as activity.
        let mut kbd = controller(&[[PRESSED, 0x10], [PRESSED, 0xA4], [PRESSED, TOGGLE]]);

        cycle(&mut kbd, 5);
        assert_eq!(kbd.last_activity(), None);
    }

    #[test]
    fn toggling_mode_resets_held_directions() {
        let mut kbd = controller(&[[PRESSED, TOGGLE], [PRESSED, RIGHT]]);

        cycle(&mut kbd, 0);

        // Mode off while the arrow is still down: its release arrives as
        // an ordinary key event and cannot clear the mask.
        queue(&mut kbd, &[[PRESSED, TOGGLE], [RELEASED, RIGHT]]);
        assert_eq!(
            cycle(&mut kbd, 10),
            [
                Emitted::Scan(RIGHT),
                Emitted::Key(KeyCode::Right, false),
                Emitted::Sync,
            ],
        );

        // Back on: no phantom motion from the stale press run.
        queue(&mut kbd, &[[PRESSED, TOGGLE]]);
        assert_eq!(cycle(&mut kbd, 20), [Emitted::Sync]);
        assert_eq!(kbd.ctx.held, 0);
    }

    #[test]
    fn direction_bit_follows_press_and_release() {
        let mut kbd = controller(&[[PRESSED, TOGGLE], [PRESSED, RIGHT]]);

        cycle(&mut kbd, 0);
        assert_eq!(kbd.ctx.held, DIR_RIGHT);

        queue(&mut kbd, &[[RELEASED, RIGHT]]);
        cycle(&mut kbd, 10);
        assert_eq!(kbd.ctx.held, 0);
    }
}
