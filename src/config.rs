//! Tuning constants for the acquisition and debounce pipeline.

/// Nominal rate of the conversion-complete tick. Four ticks make one full
/// acquisition cycle, so raw sample pairs arrive at a quarter of this.
pub const SAMPLE_TICK_HZ: u32 = 400;

/// Lowest raw reading treated as a valid press. Readings below this on
/// either axis mean the panel is not being touched.
pub const TOUCH_MIN_DEFAULT: i16 = 150;

/// Consecutive agreeing samples required before a pen edge is believed.
pub const PEN_CONFIRM_SAMPLES: u8 = 3;

/// Slots in the delayed-position ring: four interleaved x/y pairs.
pub const SAMPLE_RING_LEN: usize = 8;

/// Samples discarded after first contact on a calibration target, giving
/// the panel time to settle before averaging starts.
pub const CALIBRATION_SETTLE_DISCARD: i32 = 5;

/// Reference points needed for one calibration pass.
pub const CALIBRATION_TARGET_COUNT: usize = 3;
