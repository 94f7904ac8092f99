//! FleetSync Serial Protocol
//!
//! This crate provides types and utilities for talking to FleetSync-capable
//! dispatch radios over their serial port. Frames are ASCII text wrapped in
//! STX/ETX control bytes, addressed by a 3-digit fleet and a 4-digit device.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → radio): text messages and GNSS position polls,
//!   built by [`OutboundCommand`] and sent through an [`Encoder`].
//! - **Messages** (radio → host): identification beacons and acknowledgements
//!   framed with STX/ETX, plus unframed `$PK` proprietary positioning
//!   sentences. Decoded by [`parse`] or a configured [`Parser`].
//!
//! ```text
//! +-----+--------------+----------+-----------+---------+-----+
//! | STX | length class | fleet(3) | device(4) | body    | ETX |
//! +-----+--------------+----------+-----------+---------+-----+
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use fleetsync_protocol::{Address, Encoder, IoTransport, parse};
//!
//! // Send a text message
//! let mut encoder = Encoder::new(IoTransport::new(port));
//! encoder.encode_text("Return to base", Address::new(100, 1000)?, false)?;
//!
//! // Parse a received frame
//! let message = parse(b"\x02D1001000\x03", chrono::Utc::now())?;
//! ```

mod commands;
mod constants;
mod encoder;
mod error;
mod frame;
mod messages;
mod observer;
mod positioning;
mod types;

pub use commands::*;
pub use constants::*;
pub use encoder::*;
pub use error::*;
pub use frame::*;
pub use messages::*;
pub use observer::*;
pub use positioning::*;
pub use types::*;
