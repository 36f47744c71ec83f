use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VitalsError {
    /// Not enough signal yet to produce a reading. Expected during warmup.
    #[error("insufficient data")]
    InsufficientData,
    /// A channel's DC level (or the IR AC swing) is zero, so no ratio exists.
    #[error("channel unavailable")]
    ChannelUnavailable,
    #[error("sample value {value} exceeds sensor full scale {max}")]
    OutOfRangeSample { value: u32, max: u32 },
    #[error("sample at {timestamp_ms} ms arrived after {previous_ms} ms")]
    OutOfOrderSample { previous_ms: u64, timestamp_ms: u64 },
    #[error("sample source disconnected")]
    SourceDisconnected,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
