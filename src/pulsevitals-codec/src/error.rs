use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("{self:?}")]
pub enum CodecError {
    PacketTooShort,
    InvalidSof,
    InvalidHeaderCrc8,
    InvalidPacketLength,
    InvalidDataCrc32,
    InvalidIndexError,
    InvalidPacketType(u8),
    SampleCountMismatch { declared: usize, actual: usize },
    TooManySamples(usize),
    /// Channel value wider than 24 bits or timestamp outside the frame's range.
    SampleOutOfRange,
}
