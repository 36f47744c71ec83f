#[macro_use]
extern crate log;

mod controller;
pub use controller::VitalsController;

pub mod sink;
pub use sink::DisplaySink;

pub mod source;
pub use source::{ClockedSource, SampleSource};
