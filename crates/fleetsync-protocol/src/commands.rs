//! Commands that can be sent to a FleetSync radio.

use bytes::BufMut;

use crate::constants::*;
use crate::error::*;
use crate::types::*;

/// Commands that can be sent to the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    /// Send a text message to one unit, or to every unit.
    TextMessage {
        /// Recipient. Ignored when `broadcast` is set.
        address: Address,
        /// Address every unit instead of `address`.
        broadcast: bool,
        /// Message text.
        body: String,
    },

    /// Ask a unit to report its current GNSS position.
    GnssPoll {
        /// Unit to poll.
        address: Address,
    },
}

impl OutboundCommand {
    /// Build a text message command.
    pub fn text(body: impl Into<String>, address: Address, broadcast: bool) -> Self {
        OutboundCommand::TextMessage {
            address,
            broadcast,
            body: body.into(),
        }
    }

    /// Build a GNSS poll command.
    pub fn gnss_poll(address: Address) -> Self {
        OutboundCommand::GnssPoll { address }
    }

    /// The address the frame will carry on the wire.
    pub fn wire_address(&self) -> Address {
        match self {
            OutboundCommand::TextMessage {
                broadcast: true, ..
            } => Address::BROADCAST,
            OutboundCommand::TextMessage { address, .. } => *address,
            OutboundCommand::GnssPoll { address } => *address,
        }
    }

    /// Check that the command can be sent as-is.
    pub fn validate(&self) -> ProtocolResult<()> {
        match self {
            OutboundCommand::TextMessage {
                address,
                broadcast,
                body,
            } => {
                if !broadcast && address.is_broadcast() {
                    return Err(ProtocolError::AddressRequired);
                }
                classify_length(body)?;
                Ok(())
            }
            OutboundCommand::GnssPoll { .. } => Ok(()),
        }
    }

    /// Encode the command into a complete STX/ETX frame.
    ///
    /// When `sequence` is given it is appended to text messages as decimal
    /// digits before ETX. Radios ignore the field; GNSS polls never carry it.
    pub fn encode(&self, sequence: Option<u64>) -> ProtocolResult<Vec<u8>> {
        self.validate()?;

        let address = self.wire_address();
        let mut buf = Vec::new();
        buf.put_u8(STX);

        match self {
            OutboundCommand::TextMessage { body, .. } => {
                buf.put_u8(classify_length(body)?.code());
                address.write_fields(&mut buf);
                buf.put_slice(body.as_bytes());
                if let Some(sequence) = sequence {
                    buf.put_slice(sequence.to_string().as_bytes());
                }
            }

            OutboundCommand::GnssPoll { .. } => {
                buf.put_slice(CMD_GNSS_POLL);
                address.write_fields(&mut buf);
            }
        }

        buf.put_u8(ETX);
        Ok(buf)
    }
}
