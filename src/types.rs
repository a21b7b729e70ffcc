/// One unprocessed ADC reading pair, x then y axis, captured over a full
/// acquisition cycle. Overwritten each cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawSample {
    pub x: i16,
    pub y: i16,
}

/// A calibrated position in screen pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScreenPoint {
    pub x: i16,
    pub y: i16,
}
