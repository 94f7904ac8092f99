//! Observability hooks.
//!
//! The encoder and parser report what they do through a [`FrameObserver`]
//! handed to them by the caller. Nothing in this crate installs a logger.

use crate::error::ProtocolError;
use crate::messages::InboundMessage;

/// Receives notifications about frames sent and messages parsed.
///
/// All methods default to doing nothing.
pub trait FrameObserver: Send + Sync {
    /// A frame was written and flushed to the transport.
    fn frame_sent(&self, _frame: &[u8], _written: usize, _sequence: u64) {}

    /// A raw buffer was parsed into a message.
    fn message_parsed(&self, _message: &InboundMessage) {}

    /// A raw buffer could not be parsed.
    fn parse_failed(&self, _raw: &[u8], _error: &ProtocolError) {}
}

/// Observer that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl FrameObserver for NoopObserver {}

/// Observer that forwards notifications to the `log` facade.
///
/// Records are only emitted if the application has installed a logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl FrameObserver for LogObserver {
    fn frame_sent(&self, frame: &[u8], written: usize, sequence: u64) {
        log::debug!(
            "sent frame #{}: {} of {} bytes written: {:?}",
            sequence,
            written,
            frame.len(),
            String::from_utf8_lossy(frame)
        );
        if written < frame.len() {
            log::warn!(
                "transport accepted {} of {} bytes for frame #{}",
                written,
                frame.len(),
                sequence
            );
        }
    }

    fn message_parsed(&self, message: &InboundMessage) {
        log::info!(
            "received {:?} from {:?}/{:?} at {}",
            message.kind,
            message.fleet_id,
            message.device_id,
            message.received_at
        );
    }

    fn parse_failed(&self, raw: &[u8], error: &ProtocolError) {
        log::warn!("failed to parse {:?}: {}", String::from_utf8_lossy(raw), error);
    }
}
