use std::fmt;

use super::{Color, CHANNELS, MAX_LAMP_OFFSET};
use crate::error::ConfigError;

/// One universe worth of channel values, channel 1 at index 0.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Frame(Box<[u8; CHANNELS]>);

impl Frame {
    /// All channels at zero, lamps off.
    pub(crate) fn blank() -> Self {
        Self(Box::new([0; CHANNELS]))
    }

    /// Write `color` into the three channels starting at `channel`.
    pub(crate) fn write_color(&mut self, channel: usize, color: Color) -> Result<(), ConfigError> {
        let upper = channel.saturating_add(3);
        if upper > CHANNELS {
            return Err(ConfigError::ColorOutOfBounds {
                channel,
                available: CHANNELS.saturating_sub(channel),
            });
        }
        self.0[channel..upper].copy_from_slice(&color.bytes());
        Ok(())
    }

    pub(crate) fn as_bytes(&self) -> &[u8; CHANNELS] {
        &self.0
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::blank()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the tail is almost always zero, keep logs readable
        write!(f, "Frame({:?}..)", &self.0[..16])
    }
}

/// Start offset of each lamp's RGB triplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChannelMap(Vec<usize>);

impl ChannelMap {
    pub(crate) fn new(offsets: Vec<usize>) -> Result<Self, ConfigError> {
        if offsets.is_empty() {
            return Err(ConfigError::EmptyChannelMap);
        }
        if let Some(&bad) = offsets.iter().find(|&&o| o > MAX_LAMP_OFFSET) {
            return Err(ConfigError::ChannelOutOfRange(bad));
        }
        Ok(Self(offsets))
    }

    /// The first `n` lamps, or all of them if there are fewer.
    pub(crate) fn take(&self, n: usize) -> Self {
        Self(self.0.iter().copied().take(n.max(1)).collect())
    }

    pub(crate) fn offsets(&self) -> &[usize] {
        &self.0
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self(vec![0, 8])
    }
}
