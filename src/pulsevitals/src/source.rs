use pulsevitals_types::{Sample, VitalsError};

mod capture;
pub use capture::CaptureSource;

mod channel;
pub use channel::{ChannelSource, SampleSender, channel};

mod manual;
pub use manual::ManualSource;

mod recorder;
pub use recorder::Recorder;

mod synth;
pub use synth::{FingerOff, PpgSynth, SynthSource};

/// Producer side of the pipeline.
///
/// Every call hands over all complete acquisition slots available at that
/// moment. Red and IR travel together in one [`Sample`], so the channels can
/// never be drained out of lockstep.
pub trait SampleSource {
    /// Appends every available sample to `out` in arrival order and returns
    /// how many were appended.
    fn drain(&mut self, out: &mut Vec<Sample>) -> Result<usize, VitalsError>;
}

/// A source driven by an external clock instead of wall time.
pub trait ClockedSource: SampleSource {
    /// Makes every sample stamped at or before `now_ms` available.
    fn advance_to(&mut self, now_ms: u64);

    /// No further samples will become available.
    fn is_exhausted(&self) -> bool;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn drain(&mut self, out: &mut Vec<Sample>) -> Result<usize, VitalsError> {
        (**self).drain(out)
    }
}
