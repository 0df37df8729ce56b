//! Error types for the outbound frame assembly core.

use core::fmt;

/// Failure modes of [`crate::queuer::queue_frames`].
///
/// Generic over `E`, the frame encoder's associated error type, so that
/// link-layer failures propagate verbatim rather than being boxed or
/// stringified.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueError<E> {
    /// Fragmentation is disabled (by configuration) and the datagram does
    /// not fit into a single frame.
    OversizeWithoutFragSupport {
        /// Bytes of payload that needed to be queued.
        buflen: usize,
        /// Bytes actually available after the MAC header and compressed
        /// dispatch were accounted for.
        available: usize,
    },

    /// The frame encoder failed while reporting the MAC header length it
    /// intends to write.
    MacHeaderQueryFailed(E),

    /// The frame encoder wrote a different number of bytes than it had
    /// previously reported via `send_hdrlen` for the same PAN id.
    MacHeaderMismatch { expected: usize, written: usize },

    /// The frame encoder failed while writing a MAC header.
    MacHeaderWriteFailed(E),

    /// The buffer pool could not supply another frame.
    AllocationExhausted,

    /// More fragments were required than the queue's capacity allows.
    TooManyFragments,
}

impl<E: fmt::Debug> fmt::Display for QueueError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::OversizeWithoutFragSupport { buflen, available } => write!(
                f,
                "datagram of {} bytes does not fit in {} available bytes and fragmentation is disabled",
                buflen, available
            ),
            QueueError::MacHeaderQueryFailed(e) => write!(f, "MAC header length query failed: {:?}", e),
            QueueError::MacHeaderMismatch { expected, written } => write!(
                f,
                "MAC header encoder wrote {} bytes, expected {}",
                written, expected
            ),
            QueueError::MacHeaderWriteFailed(e) => write!(f, "MAC header encoder failed: {:?}", e),
            QueueError::AllocationExhausted => write!(f, "frame buffer pool exhausted"),
            QueueError::TooManyFragments => write!(f, "datagram required more fragments than the queue can hold"),
        }
    }
}
