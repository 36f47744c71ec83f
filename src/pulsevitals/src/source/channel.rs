use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, sync_channel};

use pulsevitals_types::{Sample, VitalsError};

use crate::SampleSource;

/// Single-producer, single-consumer hand-off of whole acquisition slots.
///
/// `bound` caps how many samples may wait between two ticks; the producer
/// blocks once it is reached.
pub fn channel(bound: usize) -> (SampleSender, ChannelSource) {
    let (sender, receiver) = sync_channel(bound);
    (SampleSender { sender }, ChannelSource { receiver })
}

#[derive(Debug, Clone)]
pub struct SampleSender {
    sender: SyncSender<Sample>,
}

impl SampleSender {
    pub fn send(&self, sample: Sample) -> Result<(), VitalsError> {
        self.sender
            .send(sample)
            .map_err(|_| VitalsError::SourceDisconnected)
    }
}

#[derive(Debug)]
pub struct ChannelSource {
    receiver: Receiver<Sample>,
}

impl SampleSource for ChannelSource {
    /// Pulls until the channel is empty. A closed channel is only reported
    /// once everything queued before the close has been handed over.
    fn drain(&mut self, out: &mut Vec<Sample>) -> Result<usize, VitalsError> {
        let mut count = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(sample) => {
                    out.push(sample);
                    count += 1;
                }
                Err(TryRecvError::Empty) => return Ok(count),
                Err(TryRecvError::Disconnected) if count > 0 => return Ok(count),
                Err(TryRecvError::Disconnected) => return Err(VitalsError::SourceDisconnected),
            }
        }
    }
}
