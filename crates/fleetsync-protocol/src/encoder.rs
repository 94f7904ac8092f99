//! Sending commands over a serial transport.
//!
//! The [`Encoder`] owns the transport handle and the sequence counter. Every
//! send validates and builds the whole frame first, then writes it and
//! flushes, so a rejected command never puts a byte on the wire.

use std::io;

use serde::{Deserialize, Serialize};

use crate::commands::OutboundCommand;
use crate::error::*;
use crate::observer::{FrameObserver, LogObserver};
use crate::types::Address;

/// A byte-oriented port the encoder writes frames to.
///
/// Both calls are blocking. No timeout is imposed by the encoder.
pub trait Transport {
    /// Write a frame, returning the number of bytes the port accepted.
    fn write(&mut self, frame: &[u8]) -> io::Result<usize>;

    /// Push any buffered bytes out to the device.
    fn flush(&mut self) -> io::Result<()>;
}

/// Adapts any [`std::io::Write`] (serial device node, file, stdout) into a
/// [`Transport`].
#[derive(Debug)]
pub struct IoTransport<W> {
    inner: W,
}

impl<W: io::Write> IoTransport<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        IoTransport { inner }
    }

    /// Get a reference to the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap, returning the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Transport for IoTransport<W> {
    fn write(&mut self, frame: &[u8]) -> io::Result<usize> {
        self.inner.write(frame)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Append the sequence number to text frames before ETX.
    ///
    /// Some captured traffic carries it, some does not; radios ignore it.
    pub append_sequence: bool,
}

/// Encodes commands and writes them to a transport.
///
/// Sends take `&mut self`: one encoder serves one writer at a time.
pub struct Encoder<T> {
    transport: T,
    config: EncoderConfig,
    sequence: u64,
    observer: Box<dyn FrameObserver>,
}

impl<T: Transport> Encoder<T> {
    /// Create an encoder with default settings, logging through `log`.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, EncoderConfig::default())
    }

    /// Create an encoder with explicit settings.
    pub fn with_config(transport: T, config: EncoderConfig) -> Self {
        Encoder {
            transport,
            config,
            sequence: 0,
            observer: Box::new(LogObserver),
        }
    }

    /// Replace the observer notified after each send.
    pub fn with_observer(mut self, observer: impl FrameObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Send a text message, returning the number of bytes written.
    ///
    /// With `broadcast` set the frame is addressed to `000`/`0000` whatever
    /// `address` says. Without it, the broadcast address is rejected with
    /// [`ProtocolError::AddressRequired`].
    pub fn encode_text(
        &mut self,
        body: &str,
        address: Address,
        broadcast: bool,
    ) -> ProtocolResult<usize> {
        self.send(&OutboundCommand::text(body, address, broadcast))
    }

    /// Ask a unit to report its GNSS position, returning the number of bytes
    /// written.
    pub fn encode_gnss_poll(&mut self, address: Address) -> ProtocolResult<usize> {
        self.send(&OutboundCommand::gnss_poll(address))
    }

    /// Encode and send any command.
    pub fn send(&mut self, command: &OutboundCommand) -> ProtocolResult<usize> {
        let sequence = self.config.append_sequence.then_some(self.sequence);
        let frame = command.encode(sequence)?;

        let written = self.transport.write(&frame)?;
        self.transport.flush()?;

        self.observer.frame_sent(&frame, written, self.sequence);
        self.sequence += 1;
        Ok(written)
    }

    /// Number of frames sent successfully so far.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Current settings.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Unwrap, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}
