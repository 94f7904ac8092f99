//! Messages received from FleetSync radios.
//!
//! Inbound traffic is either an STX/ETX framed message, identified by its
//! first character, or an unframed `$PK` positioning sentence:
//!
//! | Body start | Kind                     | Address fields                  |
//! |------------|--------------------------|---------------------------------|
//! | `D`        | Identification (D)       | fleet `[1..4]`, device `[4..]`  |
//! | `I`        | Identification (I)       | fleet `[2..5]`, device `[5..9]` |
//! | `0`        | Acknowledgement          | none                            |
//! | `$PK`      | Proprietary positioning  | from the decoded sentence       |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::*;
use crate::observer::{FrameObserver, NoopObserver};
use crate::positioning::{PkSentenceDecoder, PositionReport, PositioningDecoder};
use crate::types::Address;

/// Kind of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageKind {
    /// A radio acknowledged the last command.
    Acknowledgement,
    /// `D` identification: fixed fleet, variable-width device.
    IdentificationD,
    /// `I` identification: subtype character, fleet, 4-digit device.
    IdentificationI,
    /// `$PK` GNSS sentence.
    ProprietaryPositioning,
    /// Not classified.
    #[default]
    Unknown,
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The radio acknowledged a command.
    pub acknowledged: bool,
    /// Sender's fleet, when the message carries one.
    pub fleet_id: Option<u64>,
    /// Sender's device, when the message carries one.
    pub device_id: Option<u64>,
    /// What kind of message this is.
    pub kind: MessageKind,
    /// Message text: the frame body without STX/ETX, or the whole sentence.
    pub raw_text: String,
    /// Decoded fix for positioning sentences.
    pub position: Option<PositionReport>,
    /// When the raw bytes were captured.
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    fn new(kind: MessageKind, raw_text: &str, received_at: DateTime<Utc>) -> Self {
        InboundMessage {
            acknowledged: false,
            fleet_id: None,
            device_id: None,
            kind,
            raw_text: raw_text.to_string(),
            position: None,
            received_at,
        }
    }

    /// Sender address, if the message carries one that fits the outbound
    /// field widths.
    pub fn address(&self) -> Option<Address> {
        let fleet = u16::try_from(self.fleet_id?).ok()?;
        let device = u16::try_from(self.device_id?).ok()?;
        Address::new(fleet, device).ok()
    }
}

/// Classifies and decodes raw inbound buffers.
///
/// Holds no mutable state; one parser can be shared between threads.
#[derive(Clone)]
pub struct Parser {
    decoder: Arc<dyn PositioningDecoder>,
    observer: Arc<dyn FrameObserver>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser using [`PkSentenceDecoder`] and no observer.
    pub fn new() -> Self {
        Parser {
            decoder: Arc::new(PkSentenceDecoder),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Use a different decoder for `$PK` sentences.
    pub fn with_decoder(mut self, decoder: impl PositioningDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Report every parse result to `observer`.
    pub fn with_observer(mut self, observer: impl FrameObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Parse one raw buffer captured at `received_at`.
    pub fn parse(&self, raw: &[u8], received_at: DateTime<Utc>) -> ProtocolResult<InboundMessage> {
        let result = self.classify(raw, received_at);
        match &result {
            Ok(message) => self.observer.message_parsed(message),
            Err(error) => self.observer.parse_failed(raw, error),
        }
        result
    }

    fn classify(&self, raw: &[u8], received_at: DateTime<Utc>) -> ProtocolResult<InboundMessage> {
        if raw.len() >= 2 && raw[0] == STX && raw[raw.len() - 1] == ETX {
            let body = std::str::from_utf8(&raw[1..raw.len() - 1])?;
            return decode_framed(body, received_at);
        }

        if raw.starts_with(POSITIONING_PREFIX) {
            let sentence = std::str::from_utf8(raw)?.trim_end_matches(['\r', '\n']);
            let report = self.decoder.decode(sentence)?;

            let mut message =
                InboundMessage::new(MessageKind::ProprietaryPositioning, sentence, received_at);
            message.fleet_id = Some(report.fleet_id.into());
            message.device_id = Some(report.device_id.into());
            message.position = Some(report);
            return Ok(message);
        }

        if raw.first() == Some(&STX) {
            Err(ProtocolError::MalformedFrame(
                "frame does not end with ETX".to_string(),
            ))
        } else {
            Err(ProtocolError::MalformedFrame(
                "message does not start with STX or $PK".to_string(),
            ))
        }
    }
}

/// Parse one raw buffer with the default parser.
pub fn parse(raw: &[u8], received_at: DateTime<Utc>) -> ProtocolResult<InboundMessage> {
    Parser::new().parse(raw, received_at)
}

fn decode_framed(body: &str, received_at: DateTime<Utc>) -> ProtocolResult<InboundMessage> {
    match body.chars().next() {
        Some(MSG_IDENTIFICATION_D) => {
            let mut message = InboundMessage::new(MessageKind::IdentificationD, body, received_at);
            message.fleet_id = Some(digits(body, 1, Some(4), "fleet")?);
            message.device_id = Some(digits(body, 4, None, "device")?);
            Ok(message)
        }

        Some(MSG_IDENTIFICATION_I) => {
            // body[1] is a subtype we do not interpret.
            let mut message = InboundMessage::new(MessageKind::IdentificationI, body, received_at);
            message.fleet_id = Some(digits(body, 2, Some(5), "fleet")?);
            message.device_id = Some(digits(body, 5, Some(9), "device")?);
            Ok(message)
        }

        Some(MSG_ACKNOWLEDGEMENT) => {
            let mut message = InboundMessage::new(MessageKind::Acknowledgement, body, received_at);
            message.acknowledged = true;
            Ok(message)
        }

        _ => Err(ProtocolError::UnknownMessageType {
            body: body.to_string(),
        }),
    }
}

/// Read `body[start..end]` (or `body[start..]`) as a decimal number.
fn digits(body: &str, start: usize, end: Option<usize>, field: &str) -> ProtocolResult<u64> {
    let end = end.unwrap_or(body.len());
    let text = body
        .get(start..end)
        .filter(|text| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| {
            ProtocolError::MalformedFrame(format!("missing or invalid {} field in {:?}", field, body))
        })?;
    text.parse().map_err(|_| {
        ProtocolError::MalformedFrame(format!("{} field {:?} out of range", field, text))
    })
}
