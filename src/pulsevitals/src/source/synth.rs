use std::{f64::consts::TAU, fmt, str::FromStr};

use pulsevitals_types::{Sample, Spo2Config, VitalsError};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{ClockedSource, SampleSource};

/// A span of the session with no finger on the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerOff {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl FingerOff {
    pub fn contains(&self, timestamp_ms: u64) -> bool {
        (self.start_ms..self.end_ms).contains(&timestamp_ms)
    }
}

/// Parses `start-end` in seconds, e.g. `12.5-15`.
impl FromStr for FingerOff {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("expected `start-end` in seconds, got `{s}`"))?;
        let seconds = |v: &str| -> Result<u64, String> {
            let v: f64 = v.trim().parse().map_err(|_| format!("invalid seconds `{v}`"))?;
            if v < 0.0 {
                return Err(format!("negative seconds `{v}`"));
            }
            Ok((v * 1000.0).round() as u64)
        };

        let (start_ms, end_ms) = (seconds(start)?, seconds(end)?);
        if end_ms <= start_ms {
            return Err(format!("finger-off interval `{s}` is empty"));
        }
        Ok(Self { start_ms, end_ms })
    }
}

impl fmt::Display for FingerOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start_ms as f64 / 1000.0,
            self.end_ms as f64 / 1000.0
        )
    }
}

/// Shape of a synthetic two-channel PPG signal.
#[derive(Debug, Clone)]
pub struct PpgSynth {
    pub sample_rate_hz: u32,
    pub bpm: f64,
    /// Saturation the red amplitude is tuned to reproduce.
    pub spo2: f64,
    pub ir_dc: f64,
    /// Peak-to-peak IR pulse amplitude.
    pub ir_ac: f64,
    pub red_dc: f64,
    /// Noise bound in counts, applied to both channels.
    pub noise: u32,
    pub finger_off: Vec<FingerOff>,
}

impl Default for PpgSynth {
    fn default() -> Self {
        Self {
            sample_rate_hz: 50,
            bpm: 72.0,
            spo2: 97.0,
            ir_dc: 90_000.0,
            ir_ac: 3_000.0,
            red_dc: 60_000.0,
            noise: 20,
            finger_off: Vec::new(),
        }
    }
}

impl PpgSynth {
    const AMBIENT_IR: f64 = 400.0;
    const AMBIENT_RED: f64 = 250.0;

    /// Red amplitude whose ratio-of-ratios maps back to `self.spo2`.
    pub fn red_ac(&self, calibration: &Spo2Config) -> f64 {
        let ratio = (calibration.intercept - self.spo2) / calibration.slope;
        ratio.max(0.0) * (self.ir_ac / self.ir_dc) * self.red_dc
    }

    pub fn timestamp_of(&self, index: u64) -> u64 {
        index * 1000 / u64::from(self.sample_rate_hz)
    }

    fn finger_on(&self, timestamp_ms: u64) -> bool {
        !self.finger_off.iter().any(|off| off.contains(timestamp_ms))
    }

    /// Noise-free `(red, ir)` levels at `timestamp_ms`.
    pub fn levels(&self, timestamp_ms: u64, red_ac: f64) -> (f64, f64) {
        if !self.finger_on(timestamp_ms) {
            return (Self::AMBIENT_RED, Self::AMBIENT_IR);
        }

        let phase = TAU * self.bpm / 60.0 * timestamp_ms as f64 / 1000.0;
        let pulse = phase.sin() / 2.0;
        (
            self.red_dc + red_ac * pulse,
            self.ir_dc + self.ir_ac * pulse,
        )
    }
}

/// Generates samples from a [`PpgSynth`] as an external clock advances.
#[derive(Debug)]
pub struct SynthSource {
    synth: PpgSynth,
    red_ac: f64,
    rng: StdRng,
    next_index: u64,
    horizon_ms: u64,
    end_ms: Option<u64>,
}

impl SynthSource {
    pub fn new(synth: PpgSynth, calibration: &Spo2Config, seed: u64) -> Result<Self, VitalsError> {
        if synth.sample_rate_hz == 0 || synth.sample_rate_hz > 1000 {
            return Err(VitalsError::InvalidConfig(
                "sample rate must be between 1 and 1000 Hz".to_owned(),
            ));
        }
        if synth.bpm.is_nan() || synth.bpm <= 0.0 {
            return Err(VitalsError::InvalidConfig(
                "synthetic heart rate must be positive".to_owned(),
            ));
        }

        Ok(Self {
            red_ac: synth.red_ac(calibration),
            synth,
            rng: StdRng::seed_from_u64(seed),
            next_index: 0,
            horizon_ms: 0,
            end_ms: None,
        })
    }

    /// Stops generating after `end_ms`.
    pub fn with_end(self, end_ms: u64) -> Self {
        Self {
            end_ms: Some(end_ms),
            ..self
        }
    }

    fn jitter(&mut self) -> f64 {
        let bound = i64::from(self.synth.noise);
        if bound == 0 {
            return 0.0;
        }
        let a = self.rng.random_range(-bound..=bound);
        let b = self.rng.random_range(-bound..=bound);
        (a + b) as f64 / 2.0
    }

    fn next_timestamp(&self) -> u64 {
        self.synth.timestamp_of(self.next_index)
    }
}

impl SampleSource for SynthSource {
    fn drain(&mut self, out: &mut Vec<Sample>) -> Result<usize, VitalsError> {
        let mut count = 0;
        loop {
            let timestamp_ms = self.next_timestamp();
            let past_end = self.end_ms.is_some_and(|end| timestamp_ms > end);
            if timestamp_ms > self.horizon_ms || past_end {
                return Ok(count);
            }

            let (red, ir) = self.synth.levels(timestamp_ms, self.red_ac);
            let red = (red + self.jitter()).max(0.0).round() as u32;
            let ir = (ir + self.jitter()).max(0.0).round() as u32;
            out.push(Sample::new(red, ir, timestamp_ms));

            self.next_index += 1;
            count += 1;
        }
    }
}

impl ClockedSource for SynthSource {
    fn advance_to(&mut self, now_ms: u64) {
        self.horizon_ms = self.horizon_ms.max(now_ms);
    }

    fn is_exhausted(&self) -> bool {
        self.end_ms.is_some_and(|end| self.next_timestamp() > end)
    }
}
