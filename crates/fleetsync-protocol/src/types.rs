//! Common types used in the protocol.

use std::fmt;

use crate::constants::*;
use crate::error::*;

/// A fleet/device address.
///
/// Both parts are bounds-checked on construction, so formatting always
/// yields exactly [`FLEET_DIGITS`] and [`DEVICE_DIGITS`] ASCII digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address {
    fleet: u16,
    device: u16,
}

impl Address {
    /// The all-zero address used for broadcasts.
    pub const BROADCAST: Address = Address { fleet: 0, device: 0 };

    /// Create an address from numeric fleet and device ids.
    pub fn new(fleet: u16, device: u16) -> ProtocolResult<Self> {
        if fleet > MAX_FLEET_ID {
            return Err(ProtocolError::AddressOutOfRange {
                field: "fleet",
                value: fleet.to_string(),
                width: FLEET_DIGITS,
            });
        }
        if device > MAX_DEVICE_ID {
            return Err(ProtocolError::AddressOutOfRange {
                field: "device",
                value: device.to_string(),
                width: DEVICE_DIGITS,
            });
        }
        Ok(Address { fleet, device })
    }

    /// Create an address from pre-formatted, zero-padded digit strings
    /// such as `"100"` and `"0042"`.
    pub fn parse(fleet: &str, device: &str) -> ProtocolResult<Self> {
        let fleet = parse_field("fleet", fleet, FLEET_DIGITS)?;
        let device = parse_field("device", device, DEVICE_DIGITS)?;
        Ok(Address { fleet, device })
    }

    /// Fleet number.
    pub fn fleet(&self) -> u16 {
        self.fleet
    }

    /// Device number within the fleet.
    pub fn device(&self) -> u16 {
        self.device
    }

    /// Whether this is the all-zero broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Address::BROADCAST
    }

    /// Append the zero-padded fleet and device fields to `buf`.
    pub fn write_fields(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(format!("{:03}{:04}", self.fleet, self.device).as_bytes());
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}-{:04}", self.fleet, self.device)
    }
}

fn parse_field(field: &'static str, text: &str, width: usize) -> ProtocolResult<u16> {
    let out_of_range = || ProtocolError::AddressOutOfRange {
        field,
        value: text.to_string(),
        width,
    };
    if text.len() != width || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(out_of_range());
    }
    text.parse().map_err(|_| out_of_range())
}

/// Length class announced in front of a text message.
///
/// The radio refuses to transmit a body longer than its class allows. Long
/// (1024) and extra-long (4096) share one code on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthClass {
    /// Up to 48 characters.
    Short,
    /// Up to 4096 characters.
    Long,
}

impl LengthClass {
    /// Wire code for this class.
    pub fn code(&self) -> u8 {
        match self {
            LengthClass::Short => LENGTH_CODE_SHORT,
            LengthClass::Long => LENGTH_CODE_LONG,
        }
    }

    /// Largest body, in characters, this class admits.
    pub fn max_length(&self) -> usize {
        match self {
            LengthClass::Short => MAX_SHORT_LENGTH,
            LengthClass::Long => MAX_MESSAGE_LENGTH,
        }
    }
}

impl From<LengthClass> for u8 {
    fn from(class: LengthClass) -> Self {
        class.code()
    }
}

/// Pick the length class for a message body.
///
/// Length is counted in characters, not bytes.
pub fn classify_length(body: &str) -> ProtocolResult<LengthClass> {
    let length = body.chars().count();
    if length <= MAX_SHORT_LENGTH {
        Ok(LengthClass::Short)
    } else if length <= MAX_MESSAGE_LENGTH {
        Ok(LengthClass::Long)
    } else {
        Err(ProtocolError::MessageTooLong {
            length,
            max: MAX_MESSAGE_LENGTH,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_fields_are_zero_padded() {
        let mut buf = Vec::new();
        Address::new(7, 42).unwrap().write_fields(&mut buf);
        assert_eq!(buf, b"0070042");
    }

    #[test]
    fn test_address_out_of_range() {
        assert!(matches!(
            Address::new(1000, 1),
            Err(ProtocolError::AddressOutOfRange { field: "fleet", .. })
        ));
        assert!(matches!(
            Address::new(1, 10000),
            Err(ProtocolError::AddressOutOfRange { field: "device", .. })
        ));
        assert!(Address::new(999, 9999).is_ok());
    }

    #[test]
    fn test_address_parse_requires_fixed_width() {
        let address = Address::parse("123", "0042").unwrap();
        assert_eq!(address.fleet(), 123);
        assert_eq!(address.device(), 42);

        assert!(Address::parse("12", "0042").is_err());
        assert!(Address::parse("123", "42").is_err());
        assert!(Address::parse("12a", "0042").is_err());
        assert!(Address::parse("+12", "0042").is_err());
    }

    #[test]
    fn test_broadcast_address() {
        assert!(Address::BROADCAST.is_broadcast());
        assert!(Address::parse("000", "0000").unwrap().is_broadcast());
        assert!(!Address::new(0, 1).unwrap().is_broadcast());
        assert_eq!(Address::BROADCAST.to_string(), "000-0000");
    }

    #[test]
    fn test_classify_length_boundaries() {
        assert_eq!(classify_length("").unwrap(), LengthClass::Short);
        assert_eq!(classify_length(&"A".repeat(48)).unwrap(), LengthClass::Short);
        assert_eq!(classify_length(&"A".repeat(49)).unwrap(), LengthClass::Long);
        assert_eq!(classify_length(&"A".repeat(1024)).unwrap(), LengthClass::Long);
        assert_eq!(classify_length(&"A".repeat(4096)).unwrap(), LengthClass::Long);
        assert!(matches!(
            classify_length(&"A".repeat(4097)),
            Err(ProtocolError::MessageTooLong { length: 4097, max: 4096 })
        ));
    }

    #[test]
    fn test_classify_length_counts_characters() {
        // 48 two-byte characters are still a short message.
        assert_eq!(classify_length(&"é".repeat(48)).unwrap(), LengthClass::Short);
    }

    #[test]
    fn test_length_codes() {
        assert_eq!(u8::from(LengthClass::Short), b'F');
        assert_eq!(u8::from(LengthClass::Long), b'G');
    }
}
