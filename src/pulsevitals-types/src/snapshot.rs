use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
pub enum FingerState {
    #[default]
    Absent,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
pub enum ControllerState {
    #[default]
    AwaitingFinger,
    /// Finger present, no valid BPM yet.
    Acquiring,
    /// At least one valid BPM produced in this session.
    Stable,
}

/// Where a reported BPM came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum HeartRateSource {
    /// The current window produced new intervals.
    Measured,
    /// The window was unusable; the history median is repeated.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BpmReading {
    pub bpm: f64,
    pub source: HeartRateSource,
}

/// Latest reported state, handed to the display sink at the draw cadence.
///
/// The waveform is borrowed from the controller's pre-sized display buffer,
/// so a sink that wants to keep it must copy it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VitalsSnapshot<'a> {
    pub state: ControllerState,
    pub bpm: Option<f64>,
    pub spo2: Option<f64>,
    /// Normalized display samples in `[0, 1]`, oldest first.
    pub waveform: &'a [f32],
    /// Signal quality, 0..=100.
    pub quality: u8,
    pub elapsed_s: f64,
}

impl VitalsSnapshot<'_> {
    const DEFAULT_BEAT_MS: u64 = 600;

    pub fn finger_present(&self) -> bool {
        !matches!(self.state, ControllerState::AwaitingFinger)
    }

    /// Length of one beat for animation purposes.
    pub fn beat_period_ms(&self) -> u64 {
        match self.bpm {
            Some(bpm) if bpm > 0.0 => (60_000.0 / bpm) as u64,
            _ => Self::DEFAULT_BEAT_MS,
        }
    }
}
