//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding, sending or parsing FleetSync frames.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Message body exceeds what the radio will transmit.
    #[error("message too long: {length} characters, maximum {max}")]
    MessageTooLong {
        /// Character count of the rejected body.
        length: usize,
        /// Largest accepted character count.
        max: usize,
    },

    /// An all-zero address was given without asking for a broadcast.
    #[error("fleet 000 and device 0000 are reserved for broadcast; set an address or enable broadcast")]
    AddressRequired,

    /// Fleet or device value does not fit its fixed-width field.
    #[error("{field} {value:?} does not fit in {width} digits")]
    AddressOutOfRange {
        /// Which field was rejected ("fleet" or "device").
        field: &'static str,
        /// The rejected value as supplied.
        value: String,
        /// Field width in digits.
        width: usize,
    },

    /// Buffer is neither STX/ETX framed nor a recognized sentence, or its
    /// fields could not be read.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Well-formed frame with a discriminator this crate does not know.
    #[error("unknown message type for message: {body:?}")]
    UnknownMessageType {
        /// Frame body with STX/ETX removed.
        body: String,
    },

    /// The positioning decoder rejected a `$PK` sentence.
    #[error("positioning sentence decode error: {0}")]
    PositioningDecode(#[from] PositioningError),

    /// Frame bytes are not valid text.
    #[error("invalid UTF-8 in frame: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The transport failed to accept or flush a frame.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl ProtocolError {
    /// Whether the failure came from the transport rather than the frame.
    ///
    /// Transport failures may succeed on another attempt or port; every
    /// other error will fail again for the same input.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProtocolError::Transport(_))
    }
}

/// Errors reported by a [`PositioningDecoder`](crate::PositioningDecoder).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositioningError {
    /// The sentence checksum does not match its contents.
    #[error("checksum mismatch: sentence says {expected:02X}, computed {actual:02X}")]
    ChecksumMismatch {
        /// Checksum carried by the sentence.
        expected: u8,
        /// Checksum computed over the sentence.
        actual: u8,
    },

    /// Sentence identifier this decoder does not handle.
    #[error("unsupported sentence: {0}")]
    UnsupportedSentence(String),

    /// A required field is absent or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but could not be interpreted.
    #[error("invalid {field}: {value:?}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Raw field text.
        value: String,
    },
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
