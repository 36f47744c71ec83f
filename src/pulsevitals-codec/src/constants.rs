pub const SOF: u8 = 0xAA;

/// Bytes per encoded slot: dt u16, red u24, ir u24.
pub const SAMPLE_SIZE: usize = 8;

/// type, seq, count, base timestamp.
pub const HEADER_SIZE: usize = 7;

pub const MAX_SAMPLES_PER_FRAME: usize = u8::MAX as usize;

pub const MAX_CHANNEL_VALUE: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Samples = 0x51,
}

impl PacketType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x51 => Some(Self::Samples),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
