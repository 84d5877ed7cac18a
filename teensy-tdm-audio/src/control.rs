/// Runtime control of an audio component such as a codec array.
pub trait AudioControl {
    /// Error type for control operations.
    type Error;

    /// Power up and configure the component.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Quietly stop the component.
    fn disable(&mut self) -> Result<(), Self::Error>;

    /// Set the output volume (0.0 = silent, 1.0 = full scale).
    fn volume(&mut self, level: f32) -> Result<(), Self::Error>;

    /// Set the input level as attenuation in dB (0.0 down to the component's minimum).
    fn input_level(&mut self, level_db: f32) -> Result<(), Self::Error>;

    /// Select an input source by index (0 = line, 1 = microphone).
    fn input_select(&mut self, input: u8) -> Result<(), Self::Error>;
}
