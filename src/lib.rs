#![cfg_attr(not(test), no_std)]

//! Driver core for four-wire resistive touch panels.
//!
//! Resistive panels are read by alternately energizing one plate and
//! sampling the voltage gradient through the other, which takes a small
//! state machine, a settling delay per axis, and aggressive debouncing
//! before the readings are fit for anything. This crate packages that
//! logic in a platform-agnostic form:
//!
//! - [`TouchDriver`] sequences the electrodes through a caller-supplied
//!   [`AnalogFrontEnd`], producing one raw sample pair every four ticks of
//!   a periodic conversion interrupt (nominally 400 Hz).
//! - [`Debouncer`] filters pen bounce with a three-sample confirmation on
//!   both edges and delays reported positions through a small ring so the
//!   smear of a lifting pen never reaches the consumer. It emits
//!   [`PointerEvent`]s (down, move, up) into a [`PointerEventSink`].
//! - [`calibrate`] fits the affine raw-to-screen transform from three
//!   reference points and carries the per-target sampling helpers a
//!   calibration pass needs.
//!
//! Everything runs in bounded time with no allocation, suitable for
//! interrupt context. Event delivery to a foreground task is available
//! through the sink impl for `embassy-sync` channels.

pub mod acquire;
pub mod afe;
pub mod calibrate;
pub mod config;
pub mod debounce;
pub mod events;
pub mod types;

pub use acquire::{AcquireState, TouchDriver};
pub use afe::AnalogFrontEnd;
pub use calibrate::{
    calibration_targets, solve, CalibrationError, CalibrationMatrix, CalibrationPoint,
    CalibrationSession, Orientation, TargetSampler,
};
pub use debounce::{DebounceOutput, Debouncer};
pub use events::{FnSink, PointerEvent, PointerEventKind, PointerEventSink};
pub use types::{RawSample, ScreenPoint};
