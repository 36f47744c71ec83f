use pulsevitals_types::Sample;

use crate::{
    constants::{MAX_SAMPLES_PER_FRAME, SOF},
    error::CodecError,
    frame::SampleFrame,
};

/// Splits a contiguous capture buffer into frames. Stops after the first
/// error since frame boundaries past a corrupt header cannot be trusted.
pub struct FrameReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FrameReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn fail(&mut self, error: CodecError) -> Option<Result<SampleFrame, CodecError>> {
        self.pos = self.bytes.len();
        Some(Err(error))
    }
}

impl Iterator for FrameReader<'_> {
    type Item = Result<SampleFrame, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.bytes;
        let rest = &bytes[self.pos..];
        if rest.is_empty() {
            return None;
        }
        if rest[0] != SOF {
            return self.fail(CodecError::InvalidSof);
        }
        if rest.len() < 4 {
            return self.fail(CodecError::PacketTooShort);
        }

        let length = usize::from(u16::from_le_bytes([rest[1], rest[2]]));
        let total = 4 + length;
        if rest.len() < total {
            return self.fail(CodecError::PacketTooShort);
        }

        let frame = rest[..total].to_vec();
        self.pos += total;
        match SampleFrame::from_data(frame) {
            Ok(frame) => Some(Ok(frame)),
            Err(error) => self.fail(error),
        }
    }
}

/// Packs samples into consecutive frames. A new frame starts when the current
/// one is full or the next timestamp no longer fits the slot offset.
pub fn encode_capture(samples: &[Sample]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    let mut seq: u8 = 0;
    let mut start = 0;

    while start < samples.len() {
        let base = samples[start].timestamp_ms;
        let end = samples[start..]
            .iter()
            .take(MAX_SAMPLES_PER_FRAME)
            .position(|s| !SampleFrame::fits(base, s))
            .map_or_else(
                || (start + MAX_SAMPLES_PER_FRAME).min(samples.len()),
                |offset| start + offset,
            );

        let frame = SampleFrame::new(seq, samples[start..end].to_vec())?;
        out.extend_from_slice(&frame.framed_packet());

        seq = seq.wrapping_add(1);
        start = end;
    }

    Ok(out)
}

pub fn decode_capture(bytes: &[u8]) -> Result<Vec<Sample>, CodecError> {
    let mut samples = Vec::new();
    for frame in FrameReader::new(bytes) {
        samples.extend(frame?.into_samples());
    }
    Ok(samples)
}
