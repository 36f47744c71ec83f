use pulsevitals_types::VitalsSnapshot;

mod json;
pub use json::JsonSink;

mod terminal;
pub use terminal::TerminalSink;

/// Consumer of snapshots at the draw cadence. Sinks see only the snapshot,
/// never raw samples or pipeline buffers.
pub trait DisplaySink {
    fn show(&mut self, snapshot: &VitalsSnapshot<'_>);
}

impl<D: DisplaySink + ?Sized> DisplaySink for Box<D> {
    fn show(&mut self, snapshot: &VitalsSnapshot<'_>) {
        (**self).show(snapshot)
    }
}
