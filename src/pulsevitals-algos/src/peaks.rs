use pulsevitals_types::PeakConfig;

use crate::ConditionedWindow;

/// Local-maximum detector with a dynamic amplitude threshold and a
/// refractory spacing between accepted peaks.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    threshold_ratio: f64,
    min_peak_distance_ms: u64,
    accepted: Vec<u64>,
}

impl PeakDetector {
    pub fn new(config: &PeakConfig, capacity: usize) -> Self {
        Self {
            threshold_ratio: config.threshold_ratio,
            min_peak_distance_ms: config.min_peak_distance_ms,
            accepted: Vec::with_capacity(capacity),
        }
    }

    /// Timestamps of accepted peaks in `window`, in order.
    ///
    /// A candidate must rise strictly above both neighbours and above
    /// `threshold_ratio` of the window's positive maximum. Inside a cluster
    /// closer than the refractory spacing the first candidate wins; later
    /// ones are dropped even if taller.
    pub fn detect(&mut self, window: ConditionedWindow<'_>) -> &[u64] {
        self.accepted.clear();

        let values = window.values;
        if values.len() < 3 {
            return &self.accepted;
        }

        let max = values.iter().copied().fold(0.0_f64, f64::max);
        let threshold = self.threshold_ratio * max;

        let mut last_peak: Option<u64> = None;
        for i in 1..values.len() - 1 {
            let value = values[i];
            if value <= threshold || value <= values[i - 1] || value <= values[i + 1] {
                continue;
            }

            let timestamp = window.timestamps[i];
            let spaced = last_peak
                .is_none_or(|last| timestamp.saturating_sub(last) >= self.min_peak_distance_ms);
            if spaced {
                self.accepted.push(timestamp);
                last_peak = Some(timestamp);
            }
        }

        &self.accepted
    }

    pub fn reset(&mut self) {
        self.accepted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const SAMPLE_MS: u64 = 20;

    fn window_of(values: &[f64]) -> (Vec<f64>, Vec<u64>) {
        let timestamps = (0..values.len() as u64).map(|i| i * SAMPLE_MS).collect();
        (values.to_vec(), timestamps)
    }

    fn detect(detector: &mut PeakDetector, values: &[f64], timestamps: &[u64]) -> Vec<u64> {
        detector
            .detect(ConditionedWindow { values, timestamps })
            .to_vec()
    }

    fn detector() -> PeakDetector {
        PeakDetector::new(&PeakConfig::default(), 250)
    }

    #[test]
    fn periodic_waveform_spacing_matches_period() {
        for period in [25_usize, 37, 41, 60] {
            let values: Vec<f64> = (0..250)
                .map(|i| (2.0 * PI * i as f64 / period as f64).sin())
                .collect();
            let (values, timestamps) = window_of(&values);
            let peaks = detect(&mut detector(), &values, &timestamps);
            assert!(peaks.len() >= 2, "period {period}: too few peaks {peaks:?}");
            for pair in peaks.windows(2) {
                let spacing = ((pair[1] - pair[0]) / SAMPLE_MS) as i64;
                assert!(
                    (spacing - period as i64).abs() <= 1,
                    "period {period}: spacing {spacing}"
                );
            }
        }
    }

    #[test]
    fn peaks_inside_refractory_window_are_never_both_accepted() {
        // Two bumps 200 ms apart, then one 600 ms later.
        let mut values = vec![0.0; 60];
        values[10] = 1.0;
        values[20] = 1.0;
        values[50] = 1.0;
        let (values, timestamps) = window_of(&values);
        let peaks = detect(&mut detector(), &values, &timestamps);
        assert_eq!(peaks, vec![200, 1_000]);
        for pair in peaks.windows(2) {
            assert!(pair[1] - pair[0] >= 300);
        }
    }

    #[test]
    fn first_candidate_in_cluster_wins_over_taller_one() {
        let mut values = vec![0.0; 40];
        values[10] = 0.6;
        values[14] = 1.0;
        let (values, timestamps) = window_of(&values);
        assert_eq!(detect(&mut detector(), &values, &timestamps), vec![200]);
    }

    #[test]
    fn small_ripples_below_threshold_are_ignored() {
        let mut values = vec![0.0; 60];
        values[10] = 1.0;
        values[25] = 0.2;
        values[45] = 1.0;
        let (values, timestamps) = window_of(&values);
        assert_eq!(detect(&mut detector(), &values, &timestamps), vec![200, 900]);
    }

    #[test]
    fn flat_or_negative_window_has_no_peaks() {
        let (values, timestamps) = window_of(&[-1.0; 50]);
        assert!(detect(&mut detector(), &values, &timestamps).is_empty());

        let (values, timestamps) = window_of(&[0.0; 50]);
        assert!(detect(&mut detector(), &values, &timestamps).is_empty());
    }

    #[test]
    fn edge_samples_are_not_peaks() {
        let mut values = vec![0.0; 10];
        values[0] = 5.0;
        values[9] = 5.0;
        let (values, timestamps) = window_of(&values);
        assert!(detect(&mut detector(), &values, &timestamps).is_empty());
    }

    #[test]
    fn threshold_tracks_amplitude() {
        // Same shape at 1000x the amplitude finds the same peaks.
        let shape: Vec<f64> = (0..200)
            .map(|i| (2.0 * PI * i as f64 / 40.0).sin())
            .collect();
        let scaled: Vec<f64> = shape.iter().map(|v| v * 1_000.0).collect();
        let (shape, timestamps) = window_of(&shape);
        let (scaled, _) = window_of(&scaled);
        let mut detector = detector();
        let small = detect(&mut detector, &shape, &timestamps);
        let large = detect(&mut detector, &scaled, &timestamps);
        assert_eq!(small, large);
    }
}
