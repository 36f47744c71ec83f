use serde::{Deserialize, Serialize};

/// One acquisition slot. Both channels always come from the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub red: u32,
    pub ir: u32,
    pub timestamp_ms: u64,
}

impl Sample {
    pub fn new(red: u32, ir: u32, timestamp_ms: u64) -> Self {
        Self {
            red,
            ir,
            timestamp_ms,
        }
    }

    /// Clamps both channels to `max`, returning the first channel value that
    /// had to be clamped.
    pub fn clamp_to(&mut self, max: u32) -> Option<u32> {
        let mut clamped = None;
        for value in [&mut self.red, &mut self.ir] {
            if *value > max {
                clamped.get_or_insert(*value);
                *value = max;
            }
        }
        clamped
    }
}
