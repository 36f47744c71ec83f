use std::{fmt::Write as _, io::Write};

use pulsevitals_types::{ControllerState, VitalsSnapshot};

use crate::DisplaySink;

/// Redraws a single status line: heart glyph, readings and a sparkline of the
/// waveform.
#[derive(Debug)]
pub struct TerminalSink<W> {
    out: W,
    columns: usize,
    line: String,
}

impl<W: Write> TerminalSink<W> {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    const HEART_LARGE: char = '♥';
    const HEART_SMALL: char = '♡';

    pub fn new(out: W, columns: usize) -> Self {
        Self {
            out,
            columns,
            line: String::with_capacity(columns * 4 + 64),
        }
    }

    fn heart(snapshot: &VitalsSnapshot<'_>) -> char {
        let period = snapshot.beat_period_ms().max(1);
        let elapsed_ms = (snapshot.elapsed_s * 1000.0) as u64;
        if elapsed_ms % period < period / 4 {
            Self::HEART_LARGE
        } else {
            Self::HEART_SMALL
        }
    }

    pub fn render(&mut self, snapshot: &VitalsSnapshot<'_>) -> &str {
        self.line.clear();

        if snapshot.state == ControllerState::AwaitingFinger {
            self.line.push_str("  place a finger on the sensor");
            return &self.line;
        }

        let _ = write!(self.line, "{} ", Self::heart(snapshot));
        let _ = match snapshot.bpm {
            Some(bpm) => write!(self.line, "{:>3.0} bpm", bpm),
            None => write!(self.line, "--- bpm"),
        };
        let _ = match snapshot.spo2 {
            Some(spo2) => write!(self.line, "  SpO2 {:>3.0}%", spo2),
            None => write!(self.line, "  SpO2 --%"),
        };
        let _ = write!(
            self.line,
            "  q{:>3}  {:>6.1}s  ",
            snapshot.quality, snapshot.elapsed_s
        );

        let waveform = snapshot.waveform;
        if !waveform.is_empty() {
            for column in 0..self.columns {
                let value = waveform[column * waveform.len() / self.columns];
                let level = (value.clamp(0.0, 1.0) * 7.0).round() as usize;
                self.line.push(Self::BARS[level]);
            }
        }

        &self.line
    }
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn show(&mut self, snapshot: &VitalsSnapshot<'_>) {
        self.render(snapshot);
        let result = write!(self.out, "\r{}\x1b[K", self.line).and_then(|_| self.out.flush());
        if let Err(error) = result {
            warn!("terminal write failed: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot<'a>(waveform: &'a [f32], bpm: Option<f64>, elapsed_s: f64) -> VitalsSnapshot<'a> {
        VitalsSnapshot {
            state: ControllerState::Stable,
            bpm,
            spo2: Some(97.4),
            waveform,
            quality: 42,
            elapsed_s,
        }
    }

    #[test]
    fn awaiting_finger_prompt() {
        let mut sink = TerminalSink::new(Vec::new(), 16);
        let snapshot = VitalsSnapshot {
            state: ControllerState::AwaitingFinger,
            ..snapshot(&[0.5; 4], None, 0.0)
        };
        assert!(sink.render(&snapshot).contains("place a finger"));
    }

    #[test]
    fn readings_and_sparkline() {
        let waveform = [0.0, 0.25, 0.5, 1.0];
        let mut sink = TerminalSink::new(Vec::new(), 8);
        let line = sink.render(&snapshot(&waveform, Some(72.2), 3.25)).to_owned();

        assert!(line.contains(" 72 bpm"), "{line}");
        assert!(line.contains("SpO2  97%"), "{line}");
        assert!(line.contains("q 42"), "{line}");
        assert!(line.ends_with("▁▁▃▃▅▅██"), "{line}");
    }

    #[test]
    fn acquiring_shows_placeholders() {
        let mut sink = TerminalSink::new(Vec::new(), 4);
        let snapshot = VitalsSnapshot {
            state: ControllerState::Acquiring,
            spo2: None,
            ..snapshot(&[0.5; 4], None, 1.0)
        };
        let line = sink.render(&snapshot);
        assert!(line.contains("--- bpm"));
        assert!(line.contains("SpO2 --%"));
    }

    #[test]
    fn heart_beats_with_bpm() {
        let waveform = [0.5; 2];
        // 60 bpm: large for the first 250 ms of every second
        assert_eq!(TerminalSink::<Vec<u8>>::heart(&snapshot(&waveform, Some(60.0), 2.1)), '♥');
        assert_eq!(TerminalSink::<Vec<u8>>::heart(&snapshot(&waveform, Some(60.0), 2.5)), '♡');
        // unknown rate falls back to 600 ms beats
        assert_eq!(TerminalSink::<Vec<u8>>::heart(&snapshot(&waveform, None, 0.61)), '♥');
    }

    #[test]
    fn show_redraws_line() {
        let mut sink = TerminalSink::new(Vec::new(), 4);
        sink.show(&snapshot(&[0.5; 4], Some(80.0), 0.0));
        let written = String::from_utf8(sink.out).unwrap();
        assert!(written.starts_with('\r'));
        assert!(written.ends_with("\x1b[K"));
    }
}
