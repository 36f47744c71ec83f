use std::fmt;

use pulsevitals_types::Sample;

use crate::{
    constants::{
        HEADER_SIZE, MAX_CHANNEL_VALUE, MAX_SAMPLES_PER_FRAME, PacketType, SAMPLE_SIZE, SOF,
    },
    error::CodecError,
    helpers::{BufferReader, push_u24_le},
};

/// A batch of samples sharing one base timestamp. Each slot stores its offset
/// from `base_ts` in milliseconds.
///
/// Fields are only set through [`SampleFrame::new`] and
/// [`SampleFrame::from_data`], so every frame fits the wire layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFrame {
    packet_type: PacketType,
    seq: u8,
    base_ts: u32,
    samples: Vec<Sample>,
}

impl SampleFrame {
    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn seq(&self) -> u8 {
        self.seq
    }

    pub fn base_ts(&self) -> u32 {
        self.base_ts
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn with_seq(self, seq: u8) -> SampleFrame {
        SampleFrame { seq, ..self }
    }

    pub fn new(seq: u8, samples: Vec<Sample>) -> Result<Self, CodecError> {
        if samples.len() > MAX_SAMPLES_PER_FRAME {
            return Err(CodecError::TooManySamples(samples.len()));
        }

        let base = samples.first().map_or(0, |s| s.timestamp_ms);
        let base_ts = u32::try_from(base).map_err(|_| CodecError::SampleOutOfRange)?;

        for sample in &samples {
            let in_range = sample.red <= MAX_CHANNEL_VALUE
                && sample.ir <= MAX_CHANNEL_VALUE
                && sample
                    .timestamp_ms
                    .checked_sub(base)
                    .is_some_and(|dt| dt <= u64::from(u16::MAX));
            if !in_range {
                return Err(CodecError::SampleOutOfRange);
            }
        }

        Ok(Self {
            packet_type: PacketType::Samples,
            seq,
            base_ts,
            samples,
        })
    }

    /// Whether `sample` can share a frame that starts at `base_ms`.
    pub fn fits(base_ms: u64, sample: &Sample) -> bool {
        sample
            .timestamp_ms
            .checked_sub(base_ms)
            .is_some_and(|dt| dt <= u64::from(u16::MAX))
    }

    pub fn from_data(mut data: Vec<u8>) -> Result<Self, CodecError> {
        if data.len() < 8 {
            return Err(CodecError::PacketTooShort);
        }

        let sof = data.pop_front()?;
        if sof != SOF {
            return Err(CodecError::InvalidSof);
        }

        let length_buffer = data.read::<2>()?;
        let expected_crc8 = data.pop_front()?;
        if Self::crc8(&length_buffer) != expected_crc8 {
            return Err(CodecError::InvalidHeaderCrc8);
        }

        let length = usize::from(u16::from_le_bytes(length_buffer));
        if length < HEADER_SIZE + 4 || data.len() != length {
            return Err(CodecError::InvalidPacketLength);
        }

        let expected_crc32 = u32::from_le_bytes(data.read_end()?);
        if Self::crc32(&data) != expected_crc32 {
            return Err(CodecError::InvalidDataCrc32);
        }

        let packet_type = {
            let packet_type = data.pop_front()?;
            PacketType::from_u8(packet_type).ok_or(CodecError::InvalidPacketType(packet_type))?
        };
        let seq = data.pop_front()?;
        let count = usize::from(data.pop_front()?);
        let base_ts = data.read_u32_le()?;

        let actual = data.len() / SAMPLE_SIZE;
        if data.len() % SAMPLE_SIZE != 0 || actual != count {
            return Err(CodecError::SampleCountMismatch {
                declared: count,
                actual,
            });
        }

        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            let dt = data.read_u16_le()?;
            let red = data.read_u24_le()?;
            let ir = data.read_u24_le()?;
            samples.push(Sample::new(red, ir, u64::from(base_ts) + u64::from(dt)));
        }

        Ok(Self {
            packet_type,
            seq,
            base_ts,
            samples,
        })
    }

    fn create_packet(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(HEADER_SIZE + self.samples.len() * SAMPLE_SIZE);
        packet.push(self.packet_type.as_u8());
        packet.push(self.seq);
        packet.push(self.samples.len() as u8);
        packet.extend_from_slice(&self.base_ts.to_le_bytes());
        for sample in &self.samples {
            let dt = (sample.timestamp_ms - u64::from(self.base_ts)) as u16;
            packet.extend_from_slice(&dt.to_le_bytes());
            push_u24_le(&mut packet, sample.red);
            push_u24_le(&mut packet, sample.ir);
        }
        packet
    }

    fn crc8(data: &[u8]) -> u8 {
        let mut crc: u8 = 0;
        for &byte in data {
            crc ^= byte;
            for _ in 0..8 {
                if (crc & 0x80) != 0 {
                    crc = (crc << 1) ^ 0x07;
                } else {
                    crc <<= 1;
                }
            }
        }
        crc
    }

    fn crc32(data: &[u8]) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;
        for &byte in data {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                crc = if (crc & 1) != 0 {
                    (crc >> 1) ^ 0xEDB88320
                } else {
                    crc >> 1
                };
            }
        }
        !crc
    }

    pub fn framed_packet(&self) -> Vec<u8> {
        let pkt = self.create_packet();
        let length = pkt.len() as u16 + 4;
        let length_buffer = length.to_le_bytes();

        let mut framed_packet = Vec::with_capacity(4 + usize::from(length));
        framed_packet.push(SOF);
        framed_packet.extend_from_slice(&length_buffer);
        framed_packet.push(Self::crc8(&length_buffer));
        framed_packet.extend_from_slice(&pkt);
        framed_packet.extend_from_slice(&Self::crc32(&pkt).to_le_bytes());

        framed_packet
    }
}

impl fmt::Display for SampleFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SampleFrame {{\n\tType: {:?},\n\tSeq: {},\n\tBase: {},\n\tPayload: {}\n}}",
            self.packet_type,
            self.seq,
            self.base_ts,
            hex::encode(&self.create_packet()[HEADER_SIZE..])
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Sample> {
        vec![
            Sample::new(41_000, 80_000, 1_000),
            Sample::new(41_250, 80_500, 1_020),
            Sample::new(262_143, 262_143, 1_040),
        ]
    }

    #[test]
    fn frame_layout() {
        let frame = SampleFrame::new(7, samples()).unwrap();
        let framed = frame.framed_packet();

        assert_eq!(framed[0], SOF);
        let length = u16::from_le_bytes([framed[1], framed[2]]);
        assert_eq!(usize::from(length), HEADER_SIZE + 3 * SAMPLE_SIZE + 4);
        assert_eq!(framed.len(), 4 + usize::from(length));
        assert_eq!(framed[4], PacketType::Samples.as_u8());
        assert_eq!(framed[5], 7);
        assert_eq!(framed[6], 3);
        assert_eq!(&framed[7..11], &1_000u32.to_le_bytes());
        // First slot: dt 0, red 41000 (0x00A028), ir 80000 (0x013880)
        assert_eq!(hex::encode(&framed[11..19]), "000028a000803801");
    }

    #[test]
    fn parse_framed_packet() {
        let original = SampleFrame::new(3, samples()).unwrap();
        let parsed = SampleFrame::from_data(original.framed_packet()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn empty_frame_is_valid() {
        let frame = SampleFrame::new(0, Vec::new()).unwrap();
        let parsed = SampleFrame::from_data(frame.framed_packet()).unwrap();
        assert!(parsed.samples.is_empty());
        assert_eq!(parsed.base_ts, 0);
    }

    #[test]
    fn decoded_frame_reencodes_identically() {
        let framed = SampleFrame::new(5, samples()).unwrap().framed_packet();
        let parsed = SampleFrame::from_data(framed.clone()).unwrap();

        assert_eq!(parsed.packet_type(), PacketType::Samples);
        assert_eq!(parsed.seq(), 5);
        assert_eq!(parsed.base_ts(), 1_000);
        assert_eq!(parsed.samples(), samples().as_slice());
        assert_eq!(parsed.framed_packet(), framed);
    }

    #[test]
    fn full_frame_keeps_its_count() {
        let full: Vec<_> = (0..MAX_SAMPLES_PER_FRAME as u64)
            .map(|i| Sample::new(1, 2, 500 + i))
            .collect();
        let framed = SampleFrame::new(0, full).unwrap().framed_packet();
        assert_eq!(usize::from(framed[6]), MAX_SAMPLES_PER_FRAME);

        let parsed = SampleFrame::from_data(framed).unwrap();
        assert_eq!(parsed.into_samples().len(), MAX_SAMPLES_PER_FRAME);
    }

    #[test]
    fn with_seq_changes_seq() {
        let frame = SampleFrame::new(1, samples()).unwrap().with_seq(42);
        assert_eq!(frame.seq, 42);
        assert_eq!(frame.samples.len(), 3);
    }

    #[test]
    fn rejects_wide_values() {
        let result = SampleFrame::new(0, vec![Sample::new(MAX_CHANNEL_VALUE + 1, 0, 0)]);
        assert_eq!(result, Err(CodecError::SampleOutOfRange));
    }

    #[test]
    fn rejects_large_gap() {
        let result = SampleFrame::new(
            0,
            vec![Sample::new(1, 1, 0), Sample::new(1, 1, u64::from(u16::MAX) + 1)],
        );
        assert_eq!(result, Err(CodecError::SampleOutOfRange));
    }

    #[test]
    fn rejects_unordered_slots() {
        let result = SampleFrame::new(0, vec![Sample::new(1, 1, 10), Sample::new(1, 1, 5)]);
        assert_eq!(result, Err(CodecError::SampleOutOfRange));
    }

    #[test]
    fn too_many_samples() {
        let many = vec![Sample::new(1, 1, 0); MAX_SAMPLES_PER_FRAME + 1];
        assert_eq!(
            SampleFrame::new(0, many),
            Err(CodecError::TooManySamples(MAX_SAMPLES_PER_FRAME + 1))
        );
    }

    #[test]
    fn packet_too_short() {
        let result = SampleFrame::from_data(vec![0xAA, 0x01]);
        assert!(matches!(result, Err(CodecError::PacketTooShort)));
    }

    #[test]
    fn invalid_sof() {
        let result = SampleFrame::from_data(vec![0x00; 16]);
        assert!(matches!(result, Err(CodecError::InvalidSof)));
    }

    #[test]
    fn invalid_header_crc8() {
        let mut data = SampleFrame::new(0, samples()).unwrap().framed_packet();
        data[3] ^= 0xFF;
        let result = SampleFrame::from_data(data);
        assert!(matches!(result, Err(CodecError::InvalidHeaderCrc8)));
    }

    #[test]
    fn invalid_data_crc32() {
        let mut data = SampleFrame::new(0, samples()).unwrap().framed_packet();
        data[12] ^= 0x01;
        let result = SampleFrame::from_data(data);
        assert!(matches!(result, Err(CodecError::InvalidDataCrc32)));
    }

    #[test]
    fn truncated_frame() {
        let mut data = SampleFrame::new(0, samples()).unwrap().framed_packet();
        data.truncate(data.len() - 1);
        let result = SampleFrame::from_data(data);
        assert!(matches!(result, Err(CodecError::InvalidPacketLength)));
    }

    #[test]
    fn invalid_packet_type() {
        let frame = SampleFrame::new(0, samples()).unwrap();
        let mut pkt = frame.create_packet();
        pkt[0] = 0x99;
        let length = (pkt.len() as u16 + 4).to_le_bytes();

        let mut data = vec![SOF, length[0], length[1], SampleFrame::crc8(&length)];
        data.extend_from_slice(&pkt);
        data.extend_from_slice(&SampleFrame::crc32(&pkt).to_le_bytes());

        let result = SampleFrame::from_data(data);
        assert!(matches!(result, Err(CodecError::InvalidPacketType(0x99))));
    }

    #[test]
    fn count_mismatch() {
        let frame = SampleFrame::new(0, samples()).unwrap();
        let mut pkt = frame.create_packet();
        pkt[2] = 5;
        let length = (pkt.len() as u16 + 4).to_le_bytes();

        let mut data = vec![SOF, length[0], length[1], SampleFrame::crc8(&length)];
        data.extend_from_slice(&pkt);
        data.extend_from_slice(&SampleFrame::crc32(&pkt).to_le_bytes());

        let result = SampleFrame::from_data(data);
        assert_eq!(
            result,
            Err(CodecError::SampleCountMismatch {
                declared: 5,
                actual: 3
            })
        );
    }

    #[test]
    fn crc32_known_vector() {
        assert_eq!(SampleFrame::crc32(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn display_contains_payload_hex() {
        let frame = SampleFrame::new(9, samples()).unwrap();
        let shown = frame.to_string();
        assert!(shown.contains("Seq: 9"));
        assert!(shown.contains("000028a000803801"));
    }
}
