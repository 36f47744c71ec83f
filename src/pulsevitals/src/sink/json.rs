use std::io::Write;

use chrono::Local;
use pulsevitals_types::VitalsSnapshot;
use serde::Serialize;

use crate::DisplaySink;

#[derive(Serialize)]
struct JsonLine<'a> {
    timestamp: String,
    #[serde(flatten)]
    snapshot: VitalsSnapshot<'a>,
}

/// Writes one JSON object per snapshot, stamped with local wall-clock time.
#[derive(Debug)]
pub struct JsonSink<W> {
    out: W,
    include_waveform: bool,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W, include_waveform: bool) -> Self {
        Self {
            out,
            include_waveform,
        }
    }
}

impl<W: Write> DisplaySink for JsonSink<W> {
    fn show(&mut self, snapshot: &VitalsSnapshot<'_>) {
        let snapshot = if self.include_waveform {
            *snapshot
        } else {
            VitalsSnapshot {
                waveform: &[],
                ..*snapshot
            }
        };
        let line = JsonLine {
            timestamp: Local::now().to_rfc3339(),
            snapshot,
        };

        let result = serde_json::to_writer(&mut self.out, &line)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush());
        if let Err(error) = result {
            warn!("json write failed: {}", error);
        }
    }
}
