//! Splitting a serial byte stream into frames.
//!
//! A serial port hands back bytes in arbitrary chunks. Two shapes of frame
//! appear in the stream:
//!
//! ```text
//! 0x02 <body> 0x03          framed message, ends at the first ETX
//! $PK<fields>*hh\r\n        positioning sentence, ends at LF
//! ```

use bytes::{Buf, BytesMut};
use chrono::{DateTime, Utc};

use crate::constants::*;
use crate::error::ProtocolResult;
use crate::messages::{InboundMessage, Parser};

/// A codec for reading frames out of a byte stream.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Add received data to the buffer.
    ///
    /// Callers should drain with [`decode`](Self::decode) between pushes.
    /// Beyond [`MAX_BUFFERED_SIZE`] the oldest bytes are dropped.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > MAX_BUFFERED_SIZE {
            let excess = self.buffer.len() - MAX_BUFFERED_SIZE;
            log::warn!("receive buffer full, dropping {} oldest bytes", excess);
            self.buffer.advance(excess);
        }
    }

    /// Try to take one complete frame from the buffer.
    ///
    /// Returns the raw frame (STX..=ETX, or the sentence without its line
    /// terminator), or `None` if more data is needed. Bytes before a frame
    /// start are discarded, as is a partial frame that grows past
    /// [`MAX_FRAME_SIZE`] without a terminator. A sentence cut short by the
    /// next STX is returned as it stands.
    pub fn decode(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.buffer.iter().position(|&b| b == STX || b == b'$') {
                Some(start) => self.buffer.advance(start),
                None => {
                    self.buffer.clear();
                    return None;
                }
            }

            let end = if self.buffer[0] == STX {
                match self.buffer.iter().position(|&b| b == ETX) {
                    Some(end) => return Some(self.buffer.split_to(end + 1).to_vec()),
                    None => None,
                }
            } else {
                if !self.buffer.starts_with(POSITIONING_PREFIX) {
                    if POSITIONING_PREFIX.starts_with(&self.buffer) {
                        // "$" or "$P" at the end: wait for the rest.
                        return None;
                    }
                    self.buffer.advance(1);
                    continue;
                }
                self.buffer
                    .iter()
                    .skip(1)
                    .position(|&b| b == b'\n' || b == STX)
                    .map(|i| i + 1)
            };

            if let Some(end) = end {
                let line = self.buffer.split_to(end);
                if self.buffer.first() == Some(&b'\n') {
                    self.buffer.advance(1);
                }
                let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
                return Some(line.to_vec());
            }

            if self.buffer.len() < MAX_FRAME_SIZE {
                return None;
            }
            log::warn!(
                "discarding {} buffered bytes with no frame terminator",
                self.buffer.len()
            );
            self.buffer.advance(1);
        }
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Reads messages from a serial byte stream.
///
/// This can be fed from any byte source (serial port, capture file, etc.).
#[derive(Default)]
pub struct MessageReader {
    codec: FrameCodec,
    parser: Parser,
}

impl MessageReader {
    /// Create a reader using the default [`Parser`].
    pub fn new() -> Self {
        Self::with_parser(Parser::new())
    }

    /// Create a reader using a configured parser.
    pub fn with_parser(parser: Parser) -> Self {
        MessageReader {
            codec: FrameCodec::new(),
            parser,
        }
    }

    /// Feed received data into the decoder.
    pub fn feed(&mut self, data: &[u8]) {
        self.codec.push(data);
    }

    /// Try to decode the next message.
    ///
    /// Returns `Some(Ok(message))` for a parsed frame, `Some(Err(_))` for a
    /// complete frame that failed to parse, or `None` if more data is needed.
    /// A failed frame is consumed; the next call moves on.
    pub fn try_next(&mut self, received_at: DateTime<Utc>) -> Option<ProtocolResult<InboundMessage>> {
        let frame = self.codec.decode()?;
        Some(self.parser.parse(&frame, received_at))
    }

    /// Reset the reader state.
    pub fn reset(&mut self) {
        self.codec.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::messages::MessageKind;

    #[test]
    fn test_frame_codec_single() {
        let mut codec = FrameCodec::new();
        codec.push(b"\x02D2001814\x03");
        assert_eq!(codec.decode().expect("should decode frame"), b"\x02D2001814\x03");
        assert!(codec.decode().is_none());
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_frame_codec_partial() {
        let mut codec = FrameCodec::new();

        codec.push(b"\x02D200");
        assert!(codec.decode().is_none());

        codec.push(b"1814\x03");
        assert_eq!(codec.decode().expect("should decode frame"), b"\x02D2001814\x03");
    }

    #[test]
    fn test_frame_codec_multiple_and_garbage() {
        let mut codec = FrameCodec::new();
        codec.push(b"noise\x020\x03\r\n$PKLSH,1,N,2,E,000000,A,1,2\r\nxx\x02I020018142001814\x03");

        assert_eq!(codec.decode().unwrap(), b"\x020\x03");
        assert_eq!(codec.decode().unwrap(), b"$PKLSH,1,N,2,E,000000,A,1,2");
        assert_eq!(codec.decode().unwrap(), b"\x02I020018142001814\x03");
        assert!(codec.decode().is_none());
    }

    #[test]
    fn test_frame_codec_discards_oversized_frame() {
        let mut codec = FrameCodec::new();
        codec.push(&[STX]);
        codec.push(&vec![b'A'; MAX_FRAME_SIZE]);
        assert!(codec.decode().is_none());
        assert_eq!(codec.buffered_len(), 0);

        codec.push(b"\x020\x03");
        assert_eq!(codec.decode().unwrap(), b"\x020\x03");
    }

    #[test]
    fn test_frame_codec_skips_stray_dollar() {
        let mut codec = FrameCodec::new();
        codec.push(b"$\x020\x03$X$\x02D2001814\x03");

        assert_eq!(codec.decode().unwrap(), b"\x020\x03");
        assert_eq!(codec.decode().unwrap(), b"\x02D2001814\x03");
        assert!(codec.decode().is_none());
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_frame_codec_keeps_partial_prefix() {
        let mut codec = FrameCodec::new();

        codec.push(b"\x020\x03$");
        assert_eq!(codec.decode().unwrap(), b"\x020\x03");
        assert!(codec.decode().is_none());
        assert_eq!(codec.buffered_len(), 1);

        codec.push(b"P");
        assert!(codec.decode().is_none());
        assert_eq!(codec.buffered_len(), 2);

        codec.push(b"KLSH,1,N,2,E,000000,A,1,2\r\n");
        assert_eq!(codec.decode().unwrap(), b"$PKLSH,1,N,2,E,000000,A,1,2");
    }

    #[test]
    fn test_frame_codec_sentence_ends_at_stx() {
        let mut codec = FrameCodec::new();
        codec.push(b"$PKLSH,1,N,2\x020\x03");

        assert_eq!(codec.decode().unwrap(), b"$PKLSH,1,N,2");
        assert_eq!(codec.decode().unwrap(), b"\x020\x03");
        assert!(codec.decode().is_none());
    }

    #[test]
    fn test_frame_codec_bounds_undrained_buffer() {
        let mut codec = FrameCodec::new();
        for _ in 0..20 {
            codec.push(&vec![b'x'; MAX_FRAME_SIZE]);
        }
        assert_eq!(codec.buffered_len(), MAX_BUFFERED_SIZE);

        codec.push(b"\x020\x03");
        assert_eq!(codec.buffered_len(), MAX_BUFFERED_SIZE);
        assert_eq!(codec.decode().unwrap(), b"\x020\x03");
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_reader_after_stray_dollar() {
        let mut reader = MessageReader::new();
        let now = Utc::now();

        reader.feed(b"$\x020\x03\x02D2001814\x03");
        assert!(reader.try_next(now).unwrap().unwrap().acknowledged);
        assert_eq!(
            reader.try_next(now).unwrap().unwrap().kind,
            MessageKind::IdentificationD
        );
        assert!(reader.try_next(now).is_none());
    }

    #[test]
    fn test_message_reader() {
        let mut reader = MessageReader::new();
        let now = Utc::now();

        reader.feed(b"\x02D2001814\x03\x02FOO");
        let message = reader.try_next(now).unwrap().unwrap();
        assert_eq!(message.kind, MessageKind::IdentificationD);
        assert!(reader.try_next(now).is_none());

        reader.feed(b"\x03\x020\x03");
        assert!(matches!(
            reader.try_next(now),
            Some(Err(ProtocolError::UnknownMessageType { .. }))
        ));
        let message = reader.try_next(now).unwrap().unwrap();
        assert!(message.acknowledged);
        assert!(reader.try_next(now).is_none());
    }
}
