mod frame;
pub use frame::SampleFrame;

mod error;
pub use error::CodecError;

pub mod constants;

mod helpers;

mod capture;
pub use capture::{FrameReader, decode_capture, encode_capture};
