use crate::{
    afe::AnalogFrontEnd,
    calibrate::CalibrationMatrix,
    config::TOUCH_MIN_DEFAULT,
    debounce::Debouncer,
    events::PointerEventSink,
    types::RawSample,
};

/// Electrode configuration currently applied to the panel, which also
/// determines what the next completed conversion means.
///
/// The states run in a fixed cycle. Each axis costs two ticks: one
/// conversion is discarded while the freshly released sense plate settles,
/// the next is captured. A full raw pair therefore takes four ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireState {
    /// No configuration applied yet; the first tick applies the X drive.
    Init,
    /// X plate driven; the pending conversion is a settling value.
    SkipX,
    /// X plate driven and settled; the pending conversion is the X reading.
    ReadX,
    /// Y plate driven; the pending conversion is a settling value.
    SkipY,
    /// Y plate driven and settled; the pending conversion is the Y reading.
    ReadY,
}

/// Owns the acquisition sequencing and the debouncer behind it.
///
/// [`TouchDriver::on_conversion_complete`] is the single entry point,
/// intended to be called from the ADC conversion-complete interrupt fired
/// by a periodic trigger timer (see [`crate::config::SAMPLE_TICK_HZ`]).
/// Once per four ticks a completed raw pair is pushed through the
/// debouncer and any resulting pointer events are handed to the sink
/// before the handler returns.
pub struct TouchDriver<A: AnalogFrontEnd> {
    afe: A,
    state: AcquireState,
    raw: RawSample,
    debouncer: Debouncer,
}

impl<A: AnalogFrontEnd> TouchDriver<A> {
    pub fn new(afe: A, matrix: CalibrationMatrix) -> Self {
        Self {
            afe,
            state: AcquireState::Init,
            raw: RawSample::default(),
            debouncer: Debouncer::new(matrix, TOUCH_MIN_DEFAULT),
        }
    }

    /// Applies the initial electrode configuration and begins sequencing.
    ///
    /// Equivalent to the first tick passing through [`AcquireState::Init`];
    /// call it once before enabling the trigger timer so the first real
    /// tick already has a conversion to discard.
    pub fn start(&mut self) {
        self.afe.drive_x_plate();
        self.state = AcquireState::SkipX;
    }

    /// Advances the state machine by one conversion-complete tick.
    pub fn on_conversion_complete(&mut self, sink: &mut impl PointerEventSink) {
        match self.state {
            AcquireState::Init => {
                self.afe.drive_x_plate();
                self.state = AcquireState::SkipX;
            }
            AcquireState::SkipX => {
                self.afe.discard_conversion();
                self.afe.release_y_plate();
                self.state = AcquireState::ReadX;
            }
            AcquireState::ReadX => {
                self.raw.x = self.afe.take_conversion();
                self.afe.drive_y_plate();
                self.state = AcquireState::SkipY;
            }
            AcquireState::SkipY => {
                self.afe.discard_conversion();
                self.afe.release_x_plate();
                self.state = AcquireState::ReadY;
            }
            AcquireState::ReadY => {
                self.raw.y = self.afe.take_conversion();
                // The post-read configuration is identical to the initial
                // one, so the Init drive helper is reused here.
                self.afe.drive_x_plate();
                let output = self.debouncer.feed(self.raw);
                for event in output.events.into_iter().flatten() {
                    sink.on_event(event);
                }
                self.state = AcquireState::SkipX;
            }
        }
    }

    pub fn state(&self) -> AcquireState {
        self.state
    }

    /// Latest raw reading pair. Valid as a pair only after a full cycle;
    /// calibration flows poll this directly instead of consuming events.
    pub fn raw_sample(&self) -> RawSample {
        self.raw
    }

    /// Whether the latest raw pair clears the touch threshold on both
    /// axes. This is the undebounced verdict calibration polling uses.
    pub fn pressed_raw(&self) -> bool {
        let min = self.debouncer.touch_min();
        self.raw.x >= min && self.raw.y >= min
    }

    pub fn set_calibration(&mut self, matrix: CalibrationMatrix) {
        self.debouncer.set_calibration(matrix);
    }

    pub fn touch_min(&self) -> i16 {
        self.debouncer.touch_min()
    }

    pub fn set_touch_min(&mut self, touch_min: i16) {
        self.debouncer.set_touch_min(touch_min);
    }

    pub fn afe(&self) -> &A {
        &self.afe
    }

    /// Consumes the driver and returns the front end.
    pub fn release(self) -> A {
        self.afe
    }
}
