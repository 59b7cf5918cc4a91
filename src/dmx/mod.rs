//! DMX512 data model and link layer.
//!
//! A universe is 512 channels. Every packet on the wire is a break,
//! a mark-after-break byte, the start code and then the channel data.

pub(crate) mod color;
pub(crate) mod frame;
pub(crate) mod transmitter;
pub(crate) mod transport;

pub(crate) use color::{Color, ColorTable};
pub(crate) use frame::{ChannelMap, Frame};
pub(crate) use transmitter::{FrameTransmitter, TransmitterConfig};
pub(crate) use transport::{SerialTransport, Transport};

/// Channels in one universe.
pub(crate) const CHANNELS: usize = 512;

/// Highest offset an RGB triplet may start at.
pub(crate) const MAX_LAMP_OFFSET: usize = CHANNELS - 3;

pub(crate) const BAUD_RATE: u32 = 250_000;

/// Minimum break length that marks the start of a packet.
pub(crate) const BREAK_LEN: std::time::Duration = std::time::Duration::from_micros(68);

pub(crate) const MARK_AFTER_BREAK: u8 = 0x01;

/// Standard dimmer packet.
pub(crate) const START_CODE: u8 = 0x00;
