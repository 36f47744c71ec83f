use pulsevitals_algos::{
    FingerEvent, FingerPresenceDetector, HeartRateEstimator, PeakDetector, SignalConditioner,
    SpO2Estimator, WaveformNormalizer,
};
use pulsevitals_types::{
    BpmReading, ControllerState, Sample, VitalsConfig, VitalsError, VitalsSnapshot,
};

use crate::{DisplaySink, SampleSource};

/// Every per-session buffer, cleared together on finger removal.
#[derive(Debug)]
struct Pipeline {
    finger: FingerPresenceDetector,
    conditioner: SignalConditioner,
    waveform: WaveformNormalizer,
    peaks: PeakDetector,
    heart_rate: HeartRateEstimator,
    spo2: SpO2Estimator,
}

impl Pipeline {
    fn new(config: &VitalsConfig) -> Self {
        let window = config.conditioning.analysis_window;
        Self {
            finger: FingerPresenceDetector::new(&config.finger),
            conditioner: SignalConditioner::new(&config.conditioning),
            waveform: WaveformNormalizer::new(&config.waveform),
            peaks: PeakDetector::new(&config.peaks, window),
            heart_rate: HeartRateEstimator::new(&config.heart_rate, window),
            spo2: SpO2Estimator::new(&config.spo2),
        }
    }

    fn push(&mut self, sample: &Sample) {
        self.conditioner.push(sample.timestamp_ms, sample.ir);
        self.waveform.push(sample.ir);
        self.spo2.push(sample.red, sample.ir);
    }

    fn reset(&mut self) {
        self.finger.reset();
        self.conditioner.reset();
        self.waveform.reset();
        self.peaks.reset();
        self.heart_rate.reset();
        self.spo2.reset();
    }
}

/// Fixed-interval trigger anchored on the first poll.
#[derive(Debug, Clone, Copy)]
struct Cadence {
    interval_ms: u64,
    next_ms: Option<u64>,
}

impl Cadence {
    fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            next_ms: None,
        }
    }

    fn poll(&mut self, now_ms: u64) -> bool {
        match self.next_ms {
            None => {
                self.next_ms = Some(now_ms + self.interval_ms);
                false
            }
            Some(next) if now_ms >= next => {
                let following = next + self.interval_ms;
                self.next_ms = Some(if following > now_ms {
                    following
                } else {
                    now_ms + self.interval_ms
                });
                true
            }
            Some(_) => false,
        }
    }
}

/// Drives the vitals pipeline from a sample source to a display sink.
///
/// Each [`tick`](Self::tick) drains the source completely, then runs the
/// heart-rate and SpO2 computation if the compute interval has elapsed, then
/// hands a snapshot to the sink if the draw interval has elapsed. Finger
/// removal clears every session buffer in one step.
pub struct VitalsController<S, D> {
    config: VitalsConfig,
    source: S,
    sink: D,
    pipeline: Pipeline,
    state: ControllerState,
    heart_rate: Result<BpmReading, VitalsError>,
    spo2: Option<f64>,
    compute: Cadence,
    draw: Cadence,
    placed_at_ms: Option<u64>,
    last_timestamp_ms: Option<u64>,
    rejected_samples: u64,
    batch: Vec<Sample>,
    display: Box<[f32]>,
}

impl<S: SampleSource, D: DisplaySink> VitalsController<S, D> {
    pub fn new(config: VitalsConfig, source: S, sink: D) -> Result<Self, VitalsError> {
        config.validate()?;

        Ok(Self {
            pipeline: Pipeline::new(&config),
            state: ControllerState::AwaitingFinger,
            heart_rate: Err(VitalsError::InsufficientData),
            spo2: None,
            compute: Cadence::new(config.cadence.compute_interval_ms),
            draw: Cadence::new(config.cadence.draw_interval_ms),
            placed_at_ms: None,
            last_timestamp_ms: None,
            rejected_samples: 0,
            // bursts larger than a window grow the batch once; it keeps that capacity
            batch: Vec::with_capacity(config.conditioning.analysis_window),
            display: vec![0.5; config.waveform.width].into_boxed_slice(),
            config,
            source,
            sink,
        })
    }

    /// One pass of the control loop at `now_ms`.
    ///
    /// Only a disconnected source is reported; every per-sample and
    /// per-window problem is absorbed.
    pub fn tick(&mut self, now_ms: u64) -> Result<(), VitalsError> {
        self.batch.clear();
        let drained = self.source.drain(&mut self.batch)?;
        if drained > 0 {
            trace!("drained {} samples", drained);
        }

        let batch = std::mem::take(&mut self.batch);
        for sample in &batch {
            self.ingest(*sample);
        }
        self.batch = batch;

        if self.compute.poll(now_ms) {
            self.compute();
        }
        if self.draw.poll(now_ms) {
            self.draw();
        }

        Ok(())
    }

    fn ingest(&mut self, mut sample: Sample) {
        let max = self.config.sensor.max_sample_value;
        if let Some(value) = sample.clamp_to(max) {
            warn!("{}", VitalsError::OutOfRangeSample { value, max });
        }

        if let Some(previous_ms) = self.last_timestamp_ms {
            if sample.timestamp_ms < previous_ms {
                self.rejected_samples += 1;
                warn!(
                    "{}",
                    VitalsError::OutOfOrderSample {
                        previous_ms,
                        timestamp_ms: sample.timestamp_ms,
                    }
                );
                return;
            }
        }
        self.last_timestamp_ms = Some(sample.timestamp_ms);

        match self.pipeline.finger.update(sample.ir) {
            Some(FingerEvent::Placed) => {
                info!("finger placed at {} ms", sample.timestamp_ms);
                self.state = ControllerState::Acquiring;
                self.placed_at_ms = Some(sample.timestamp_ms);
            }
            Some(FingerEvent::Removed) => {
                info!("finger removed at {} ms", sample.timestamp_ms);
                self.end_session();
            }
            None => {}
        }

        if self.state != ControllerState::AwaitingFinger {
            self.pipeline.push(&sample);
        }
    }

    fn end_session(&mut self) {
        self.pipeline.reset();
        self.state = ControllerState::AwaitingFinger;
        self.heart_rate = Err(VitalsError::InsufficientData);
        self.spo2 = None;
        self.placed_at_ms = None;
    }

    fn compute(&mut self) {
        if self.state == ControllerState::AwaitingFinger {
            return;
        }

        let pipeline = &mut self.pipeline;
        let peaks: &[u64] = match pipeline.conditioner.condition() {
            Some(window) => pipeline.peaks.detect(window),
            None => &[],
        };
        self.heart_rate = pipeline.heart_rate.estimate(peaks);

        match &self.heart_rate {
            Ok(reading) => {
                debug!("heart rate {:.1} bpm ({})", reading.bpm, reading.source);
                if self.state == ControllerState::Acquiring {
                    info!("first stable heart rate: {:.1} bpm", reading.bpm);
                    self.state = ControllerState::Stable;
                }
            }
            Err(error) => debug!("heart rate: {}", error),
        }

        self.spo2 = match pipeline.spo2.estimate() {
            Ok(spo2) => {
                debug!("spo2 {:.1}%", spo2);
                Some(spo2)
            }
            Err(error) => {
                debug!("spo2: {}", error);
                None
            }
        };
    }

    fn draw(&mut self) {
        let present = self.state != ControllerState::AwaitingFinger;
        let quality = if present {
            self.pipeline.waveform.fill(&mut self.display);
            self.pipeline.waveform.quality()
        } else {
            self.display.fill(0.5);
            0
        };

        let elapsed_s = match (self.placed_at_ms, self.last_timestamp_ms) {
            (Some(placed), Some(last)) => last.saturating_sub(placed) as f64 / 1000.0,
            _ => 0.0,
        };

        let snapshot = VitalsSnapshot {
            state: self.state,
            bpm: self.bpm(),
            spo2: self.spo2,
            waveform: &self.display,
            quality,
            elapsed_s,
        };
        self.sink.show(&snapshot);
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Latest heart-rate status. `InsufficientData` until the current session
    /// has produced a valid window.
    pub fn heart_rate(&self) -> Result<BpmReading, VitalsError> {
        self.heart_rate.clone()
    }

    pub fn bpm(&self) -> Option<f64> {
        self.heart_rate.as_ref().ok().map(|reading| reading.bpm)
    }

    pub fn spo2(&self) -> Option<f64> {
        self.spo2
    }

    /// Samples dropped for arriving older than their predecessor.
    pub fn rejected_samples(&self) -> u64 {
        self.rejected_samples
    }

    pub fn config(&self) -> &VitalsConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn into_parts(self) -> (S, D) {
        (self.source, self.sink)
    }
}
