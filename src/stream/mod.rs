pub mod relay;
pub mod scan;
pub mod sse;
pub mod utf8;

pub use relay::{RelayState, StreamHandle, StreamRelay, RELAY_CHANNEL_CAPACITY};
pub use scan::{ObjectScanner, ScanState};
pub use utf8::Utf8StreamDecoder;

/// One unit of output produced by the response pipeline.
///
/// Emission order matches the order text was produced upstream; `Done` and
/// `Error` are both terminal, and exactly one of them ends a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaEvent {
    /// An incremental fragment of model-generated text.
    Text(String),
    /// Terminal completion marker.
    Done,
    /// Terminal error marker.
    Error(String),
}
