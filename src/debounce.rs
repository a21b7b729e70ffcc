use log::trace;
use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use crate::{
    calibrate::CalibrationMatrix,
    config::{PEN_CONFIRM_SAMPLES, SAMPLE_RING_LEN},
    events::{PointerEvent, PointerEventKind},
    types::{RawSample, ScreenPoint},
};

#[derive(Clone, Copy, Debug)]
enum PenHsmEvent {
    Sample { touched: bool, point: ScreenPoint },
}

/// Events produced by one debounce cycle. Two slots because a tap shorter
/// than the ring pre-fill reports its down and up in the same cycle.
#[derive(Clone, Copy, Debug, Default)]
pub struct DebounceOutput {
    pub events: [Option<PointerEvent>; 2],
}

#[derive(Clone, Copy, Debug, Default)]
struct DispatchContext {
    events: [Option<PointerEvent>; 2],
}

impl DispatchContext {
    fn emit(&mut self, event: PointerEvent) {
        for slot in &mut self.events {
            if slot.is_none() {
                *slot = Some(event);
                return;
            }
        }
    }

    fn finish(self) -> DebounceOutput {
        DebounceOutput {
            events: self.events,
        }
    }
}

/// Filters pen bounce out of the raw sample stream and emits at most one
/// down/move plus one up event per acquisition cycle.
///
/// An edge in either direction must hold for [`PEN_CONFIRM_SAMPLES`]
/// consecutive cycles before it is believed; a single noisy sample never
/// produces an event. Confirmed positions pass through a small delay ring
/// so the distorted readings taken while the pen lifts are overwritten
/// instead of reported.
pub struct Debouncer {
    matrix: CalibrationMatrix,
    touch_min: i16,
    machine: statig::blocking::StateMachine<PenHsm>,
}

impl Debouncer {
    pub fn new(matrix: CalibrationMatrix, touch_min: i16) -> Self {
        Self {
            matrix,
            touch_min,
            machine: PenHsm::new().state_machine(),
        }
    }

    /// Runs one debounce cycle over a completed raw sample pair.
    pub fn feed(&mut self, raw: RawSample) -> DebounceOutput {
        let point = self.matrix.transform(raw);
        let touched = raw.x >= self.touch_min && raw.y >= self.touch_min;
        let mut context = DispatchContext::default();
        self.machine
            .handle_with_context(&PenHsmEvent::Sample { touched, point }, &mut context);
        context.finish()
    }

    pub fn set_calibration(&mut self, matrix: CalibrationMatrix) {
        self.matrix = matrix;
    }

    pub fn touch_min(&self) -> i16 {
        self.touch_min
    }

    pub fn set_touch_min(&mut self, touch_min: i16) {
        self.touch_min = touch_min;
    }
}

struct PenHsm {
    /// Delayed pen positions, interleaved x/y pairs.
    samples: [i16; SAMPLE_RING_LEN],
    /// Ring cursor. Negative while the ring is pre-filling after a pen
    /// down; otherwise the slot of the oldest stored pair, stepping by two.
    cursor: i8,
    /// Consecutive samples agreeing on the pending edge.
    streak: u8,
}

impl PenHsm {
    fn new() -> Self {
        Self {
            samples: [0; SAMPLE_RING_LEN],
            cursor: 0,
            streak: 0,
        }
    }

    fn store(&mut self, slot: usize, point: ScreenPoint) {
        self.samples[slot] = point.x;
        self.samples[slot + 1] = point.y;
    }

    fn emit(&self, context: &mut DispatchContext, kind: PointerEventKind, slot: usize) {
        context.emit(PointerEvent::new(
            kind,
            self.samples[slot],
            self.samples[slot + 1],
        ));
    }

    fn begin_press(&mut self, point: ScreenPoint) {
        // Pre-fill the whole ring before reporting anything, so positions
        // sampled while the pen lifts again never reach the consumer.
        self.cursor = -(SAMPLE_RING_LEN as i8);
        self.store(0, point);
    }

    /// Ring update for one confirmed-down sample. Shared between the down
    /// state and a touch resuming mid release-confirmation, which still
    /// advances the ring in the cycle that cancels the release.
    fn advance_ring(&mut self, context: &mut DispatchContext, point: ScreenPoint) {
        if self.cursor == -2 {
            // Pre-fill complete: report the position of first contact.
            self.emit(context, PointerEventKind::Down, 0);
            self.store(0, point);
            self.cursor = 2;
        } else if self.cursor < 0 {
            let slot = (self.cursor + 2 + SAMPLE_RING_LEN as i8) as usize;
            self.store(slot, point);
            self.cursor += 2;
        } else {
            let slot = self.cursor as usize;
            self.emit(context, PointerEventKind::Move, slot);
            self.store(slot, point);
            self.cursor = (self.cursor + 2) & (SAMPLE_RING_LEN as i8 - 1);
        }
    }

    fn finish_release(&mut self, context: &mut DispatchContext) {
        // A release caught mid pre-fill still owes the consumer a down.
        // Report the first contact position as both press and release so
        // short taps are never swallowed.
        if self.cursor < 0 {
            self.emit(context, PointerEventKind::Down, 0);
            self.cursor = 0;
        }
        self.emit(context, PointerEventKind::Up, self.cursor as usize);
    }
}

#[state_machine(initial = "State::idle()")]
impl PenHsm {
    /// Pen confirmed up.
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &PenHsmEvent) -> Outcome<State> {
        let _ = context;
        match event {
            PenHsmEvent::Sample { touched, .. } => {
                if *touched {
                    self.streak = 1;
                    Transition(State::confirming_down())
                } else {
                    Handled
                }
            }
        }
    }

    /// Contact seen; waiting for enough agreeing samples to believe it.
    #[state]
    fn confirming_down(
        &mut self,
        context: &mut DispatchContext,
        event: &PenHsmEvent,
    ) -> Outcome<State> {
        let _ = context;
        match event {
            PenHsmEvent::Sample { touched, point } => {
                if !*touched {
                    return Transition(State::idle());
                }
                self.streak += 1;
                if self.streak >= PEN_CONFIRM_SAMPLES {
                    trace!("pen down at ({}, {})", point.x, point.y);
                    self.begin_press(*point);
                    Transition(State::down())
                } else {
                    Handled
                }
            }
        }
    }

    /// Pen confirmed down; the ring delays reported positions.
    #[state]
    fn down(&mut self, context: &mut DispatchContext, event: &PenHsmEvent) -> Outcome<State> {
        match event {
            PenHsmEvent::Sample { touched, point } => {
                if *touched {
                    self.advance_ring(context, *point);
                    Handled
                } else {
                    self.streak = 1;
                    Transition(State::confirming_up())
                }
            }
        }
    }

    /// Contact lost; waiting for enough misses to believe the release.
    #[state]
    fn confirming_up(
        &mut self,
        context: &mut DispatchContext,
        event: &PenHsmEvent,
    ) -> Outcome<State> {
        match event {
            PenHsmEvent::Sample { touched, point } => {
                if *touched {
                    // Contact resumed before the release was confirmed; the
                    // sample still advances the ring as a normal move.
                    self.advance_ring(context, *point);
                    return Transition(State::down());
                }
                self.streak += 1;
                if self.streak >= PEN_CONFIRM_SAMPLES {
                    trace!("pen up");
                    self.finish_release(context);
                    Transition(State::idle())
                } else {
                    Handled
                }
            }
        }
    }
}
