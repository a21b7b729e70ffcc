/// Hardware operations behind the acquisition state machine.
///
/// An implementation owns the four electrode pins of the panel and the ADC
/// conversion mechanism. The state machine calls exactly one drive or
/// release method plus at most one conversion read per tick, always from
/// the conversion-complete interrupt context, so nothing here may block.
///
/// The drive methods also ground the opposite plate. Discharging the idle
/// plate matters: residual voltage on a floating plate reads as a phantom
/// press once that plate becomes the sense side.
pub trait AnalogFrontEnd {
    /// Drive X+ high and X- low, ground both Y electrodes, and select the
    /// Y-plate sense channel for the next conversion.
    fn drive_x_plate(&mut self);

    /// Release the Y electrodes to inputs so the X-axis gradient can settle
    /// on the sense node.
    fn release_y_plate(&mut self);

    /// Drive Y+ high and Y- low, ground both X electrodes, and select the
    /// X-plate sense channel for the next conversion.
    fn drive_y_plate(&mut self);

    /// Release the X electrodes to inputs.
    fn release_x_plate(&mut self);

    /// Consume the completed ADC conversion.
    fn take_conversion(&mut self) -> i16;

    /// Consume and discard a conversion taken during electrode settling.
    fn discard_conversion(&mut self) {
        let _ = self.take_conversion();
    }
}
