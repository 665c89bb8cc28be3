use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::observability;
use crate::protocol::gemini::delta::map_delta_events;
use crate::stream::scan::ObjectScanner;
use crate::stream::sse::encode_event_frame;
use crate::stream::utf8::Utf8StreamDecoder;
use crate::stream::DeltaEvent;

/// Bounded frame-channel capacity. Small, so inbound reads track the
/// consumer instead of buffering the upstream response.
pub const RELAY_CHANNEL_CAPACITY: usize = 16;

/// Relay lifecycle.
///
/// `Reading` pulls inbound chunks; `Draining` flushes decoder and scanner
/// leftovers once the upstream ends; `Closed` holds no reader and emits
/// nothing further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Open,
    Reading,
    Draining,
    Closed,
}

/// Pull side of the relay channel, handed back to the caller.
///
/// Dropping the handle is the cancellation path: the relay's next `send`
/// fails and it releases the inbound reader.
pub struct StreamHandle {
    rx: mpsc::Receiver<Bytes>,
}

impl StreamHandle {
    /// Create a bounded frame channel, returning the pull and push sides.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Sender<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { rx }, tx)
    }

    /// Receive the next serialized frame, or `None` once the relay closes.
    pub async fn next_frame(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

impl Stream for StreamHandle {
    type Item = Bytes;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Bytes>> {
        self.rx.poll_recv(cx)
    }
}

/// Drives decoder → scanner → mapper over an inbound byte stream, forwarding
/// serialized frames in arrival order.
///
/// One chunk is fully decoded, extracted, mapped, and forwarded before the
/// next read, which preserves ordering with no synchronization beyond the
/// sequential loop.
pub struct StreamRelay<S> {
    inbound: Option<S>,
    decoder: Utf8StreamDecoder,
    scanner: ObjectScanner,
    state: RelayState,
}

impl<S, E> StreamRelay<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    #[must_use]
    pub fn new(inbound: S) -> Self {
        Self {
            inbound: Some(inbound),
            decoder: Utf8StreamDecoder::new(),
            scanner: ObjectScanner::new(),
            state: RelayState::Open,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Run the relay to completion.
    ///
    /// A transport failure mid-read becomes a single terminal `Error` frame;
    /// frames already forwarded are never retracted and nothing is retried.
    /// `send` suspending on a full channel is the backpressure path.
    pub async fn relay(&mut self, outbound: mpsc::Sender<Bytes>) {
        if self.state != RelayState::Open {
            return;
        }
        self.state = RelayState::Reading;

        while self.state == RelayState::Reading {
            let Some(inbound) = self.inbound.as_mut() else {
                break;
            };
            match inbound.next().await {
                Some(Ok(chunk)) => {
                    let text = self.decoder.feed(&chunk);
                    if !forward_objects(&mut self.scanner, &text, &outbound).await {
                        self.close();
                        return;
                    }
                }
                Some(Err(err)) => {
                    let message = err.to_string();
                    tracing::warn!(error = %message, "inbound stream failed mid-read");
                    let frame = encode_event_frame(&DeltaEvent::Error(message));
                    let _ = outbound.send(frame).await;
                    self.close();
                    return;
                }
                None => self.state = RelayState::Draining,
            }
        }

        if self.state == RelayState::Draining {
            let tail = self.decoder.finish();
            if !tail.is_empty() && !forward_objects(&mut self.scanner, &tail, &outbound).await {
                self.close();
                return;
            }
            if !self.scanner.leftover().is_empty() {
                tracing::debug!(
                    leftover_len = self.scanner.leftover().len(),
                    "discarding incomplete stream leftover"
                );
            }
            let _ = outbound.send(encode_event_frame(&DeltaEvent::Done)).await;
        }
        self.close();
    }

    /// Release the inbound reader and stop emitting. Idempotent.
    pub fn close(&mut self) {
        if self.state == RelayState::Closed {
            return;
        }
        self.inbound = None;
        self.state = RelayState::Closed;
    }
}

/// Scan `text` for complete objects, map each to delta events, and forward
/// the encoded frames. Returns `false` once the consumer is gone.
async fn forward_objects(
    scanner: &mut ObjectScanner,
    text: &str,
    outbound: &mpsc::Sender<Bytes>,
) -> bool {
    for span in scanner.push(text) {
        let object: serde_json::Value = match serde_json::from_str(&span) {
            Ok(object) => object,
            Err(err) => {
                // Balanced but not valid JSON. Recoverable, never terminal.
                tracing::debug!(error = %err, span_len = span.len(), "skipping malformed fragment");
                continue;
            }
        };
        if let Some(usage) = object.get("usageMetadata") {
            observability::log_stream_usage(usage);
        }
        for event in map_delta_events(&object) {
            if outbound.send(encode_event_frame(&event)).await.is_err() {
                tracing::debug!("consumer disconnected; releasing inbound reader");
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::{RelayState, StreamHandle, StreamRelay};
    use bytes::Bytes;
    use futures_util::stream;

    type ChunkResult = Result<Bytes, std::io::Error>;

    #[tokio::test]
    async fn close_before_relay_prevents_any_output() {
        let inbound = stream::iter(Vec::<ChunkResult>::new());
        let (mut handle, outbound) = StreamHandle::channel(super::RELAY_CHANNEL_CAPACITY);
        let mut relay = StreamRelay::new(inbound);
        relay.close();
        relay.relay(outbound).await;
        assert_eq!(relay.state(), RelayState::Closed);
        assert!(handle.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let inbound = stream::iter(Vec::<ChunkResult>::new());
        let mut relay = StreamRelay::new(inbound);
        relay.close();
        relay.close();
        assert_eq!(relay.state(), RelayState::Closed);
    }
}
