use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel};

use crate::types::ScreenPoint;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
}

/// A debounced pointer event carrying calibrated screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub x: i16,
    pub y: i16,
}

impl PointerEvent {
    pub(crate) fn new(kind: PointerEventKind, x: i16, y: i16) -> Self {
        Self { kind, x, y }
    }

    pub fn point(&self) -> ScreenPoint {
        ScreenPoint {
            x: self.x,
            y: self.y,
        }
    }
}

/// Receives pointer events from the acquisition pipeline.
///
/// Called from the conversion-complete interrupt context, so
/// implementations must not block or run unbounded work.
pub trait PointerEventSink {
    fn on_event(&mut self, event: PointerEvent);
}

/// Adapts a closure into a [`PointerEventSink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(PointerEvent)> PointerEventSink for FnSink<F> {
    fn on_event(&mut self, event: PointerEvent) {
        (self.0)(event)
    }
}

impl<M: RawMutex, const N: usize> PointerEventSink for &Channel<M, PointerEvent, N> {
    fn on_event(&mut self, event: PointerEvent) {
        // Dropping on overflow keeps the interrupt path non-blocking; a
        // consumer that falls this far behind has lost the gesture anyway.
        let _ = self.try_send(event);
    }
}
