//! Protocol constants
//!
//! Control bytes, discriminators and size limits shared by the encoder and
//! the parser.

// ============================================================================
// Framing
// ============================================================================

/// ASCII start-of-text, opens every framed message.
pub const STX: u8 = 0x02;
/// ASCII end-of-text, closes every framed message.
pub const ETX: u8 = 0x03;

/// Width of the fleet field in ASCII digits.
pub const FLEET_DIGITS: usize = 3;
/// Width of the device field in ASCII digits.
pub const DEVICE_DIGITS: usize = 4;

/// Largest fleet number that fits in its field.
pub const MAX_FLEET_ID: u16 = 999;
/// Largest device number that fits in its field.
pub const MAX_DEVICE_ID: u16 = 9999;

// ============================================================================
// Length Classes (host → radio)
// ============================================================================

/// Length code for short messages ('F').
pub const LENGTH_CODE_SHORT: u8 = 0x46;
/// Length code shared by long (1024) and extra-long (4096) messages ('G').
pub const LENGTH_CODE_LONG: u8 = 0x47;

/// Longest body, in characters, sent with the short length code.
pub const MAX_SHORT_LENGTH: usize = 48;
/// Longest body, in characters, the radio will transmit at all.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

// ============================================================================
// Command Discriminators (host → radio)
// ============================================================================

/// GNSS position poll command.
pub const CMD_GNSS_POLL: &[u8; 2] = b"R3";

// ============================================================================
// Message Discriminators (radio → host)
// ============================================================================

/// Identification beacon, fleet followed by a variable-width device.
pub const MSG_IDENTIFICATION_D: char = 'D';
/// Identification beacon with a one-character subtype before the address.
pub const MSG_IDENTIFICATION_I: char = 'I';
/// Acknowledgement of a previously sent command.
pub const MSG_ACKNOWLEDGEMENT: char = '0';

/// Prefix of the unframed proprietary positioning sentences.
pub const POSITIONING_PREFIX: &[u8; 3] = b"$PK";

/// Maximum size of a buffered inbound frame.
///
/// Large enough for an extra-long text body plus framing and address.
pub const MAX_FRAME_SIZE: usize = MAX_MESSAGE_LENGTH + 16;

/// Maximum number of bytes a frame splitter holds before dropping the oldest.
pub const MAX_BUFFERED_SIZE: usize = 16 * MAX_FRAME_SIZE;
