use pulsevitals_types::{FingerConfig, FingerState};

use crate::RingBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerEvent {
    Placed,
    Removed,
}

/// Windowed running average of the IR channel with a presence threshold.
/// A single noisy sample moves the average by at most `1 / window` of its
/// value, which is the only hysteresis applied.
#[derive(Debug, Clone)]
pub struct FingerPresenceDetector {
    threshold: u32,
    window: RingBuffer<u32>,
    sum: u64,
    state: FingerState,
}

impl FingerPresenceDetector {
    pub fn new(config: &FingerConfig) -> Self {
        Self {
            threshold: config.threshold,
            window: RingBuffer::new(config.window),
            sum: 0,
            state: FingerState::Absent,
        }
    }

    /// Feeds one IR sample. Returns an event only on the sample that flips the
    /// presence state.
    pub fn update(&mut self, ir: u32) -> Option<FingerEvent> {
        let evicted = self.window.push(ir).unwrap_or_default();
        self.sum = self.sum + u64::from(ir) - u64::from(evicted);

        let present = self.running_average() > u64::from(self.threshold);
        match (self.state, present) {
            (FingerState::Absent, true) => {
                self.state = FingerState::Present;
                Some(FingerEvent::Placed)
            }
            (FingerState::Present, false) => {
                self.state = FingerState::Absent;
                Some(FingerEvent::Removed)
            }
            _ => None,
        }
    }

    /// Mean of the samples currently in the window; 0 before the first sample.
    pub fn running_average(&self) -> u64 {
        match self.window.len() {
            0 => 0,
            n => self.sum / n as u64,
        }
    }

    pub fn state(&self) -> FingerState {
        self.state
    }

    pub fn reset(&mut self) {
        self.window.reset();
        self.sum = 0;
        self.state = FingerState::Absent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> FingerPresenceDetector {
        FingerPresenceDetector::new(&FingerConfig::default())
    }

    #[test]
    fn starts_absent() {
        let detector = detector();
        assert_eq!(detector.state(), FingerState::Absent);
        assert_eq!(detector.running_average(), 0);
    }

    #[test]
    fn bright_reading_reports_placement_once() {
        let mut detector = detector();
        assert_eq!(detector.update(80_000), Some(FingerEvent::Placed));
        for _ in 0..50 {
            assert_eq!(detector.update(80_000), None);
        }
        assert_eq!(detector.state(), FingerState::Present);
    }

    #[test]
    fn single_dark_sample_does_not_remove_finger() {
        let mut detector = detector();
        for _ in 0..20 {
            detector.update(60_000);
        }
        assert_eq!(detector.update(0), None);
        assert_eq!(detector.state(), FingerState::Present);
    }

    #[test]
    fn sustained_dark_readings_report_removal_once() {
        let mut detector = detector();
        for _ in 0..20 {
            detector.update(60_000);
        }

        let events: Vec<_> = (0..40).filter_map(|_| detector.update(500)).collect();
        assert_eq!(events, vec![FingerEvent::Removed]);
        assert_eq!(detector.state(), FingerState::Absent);
    }

    #[test]
    fn removal_happens_when_average_crosses_threshold() {
        let mut detector = detector();
        for _ in 0..20 {
            detector.update(50_000);
        }
        // Each zero replaces one 50k sample; the average drops 2.5k per step
        // and reaches 10k after 16 samples, which is not above the threshold.
        let mut removed_at = None;
        for i in 1..=20 {
            if detector.update(0) == Some(FingerEvent::Removed) {
                removed_at = Some(i);
                break;
            }
        }
        assert_eq!(removed_at, Some(16));
    }

    #[test]
    fn running_sum_tracks_window_exactly() {
        let mut detector = detector();
        for value in 1..=100_u32 {
            detector.update(value * 1_000);
        }
        // Window holds 81..=100 thousand.
        assert_eq!(detector.running_average(), 90_500);
    }

    #[test]
    fn reset_returns_to_absent() {
        let mut detector = detector();
        detector.update(90_000);
        detector.reset();
        assert_eq!(detector.state(), FingerState::Absent);
        assert_eq!(detector.running_average(), 0);
        assert_eq!(detector.update(90_000), Some(FingerEvent::Placed));
    }
}
