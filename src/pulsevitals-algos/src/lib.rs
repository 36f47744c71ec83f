pub(crate) mod ring_buffer;
pub use ring_buffer::RingBuffer;

pub(crate) mod finger;
pub use finger::{FingerEvent, FingerPresenceDetector};

pub(crate) mod conditioner;
pub use conditioner::{ConditionedWindow, SignalConditioner};

pub(crate) mod waveform;
pub use waveform::WaveformNormalizer;

pub(crate) mod peaks;
pub use peaks::PeakDetector;

pub(crate) mod heart_rate;
pub use heart_rate::HeartRateEstimator;

pub(crate) mod spo2;
pub use spo2::SpO2Estimator;

pub mod helpers;
