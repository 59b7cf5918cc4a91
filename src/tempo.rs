use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::ConfigError;

/// Beats per minute, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Tempo(u16);

impl Tempo {
    /// Keeps a single beat from taking ages.
    pub(crate) const MIN: u16 = 30;
    /// 40 Hz, safely below the ~44 Hz DMX refresh ceiling.
    pub(crate) const MAX: u16 = 2400;

    pub(crate) fn new(bpm: u32) -> Result<Self, ConfigError> {
        if (Self::MIN as u32..=Self::MAX as u32).contains(&bpm) {
            Ok(Self(bpm as u16))
        } else {
            Err(ConfigError::TempoOutOfRange {
                value: bpm,
                min: Self::MIN,
                max: Self::MAX,
            })
        }
    }

    pub(crate) fn bpm(self) -> u16 {
        self.0
    }

    /// Time between two beats, `60 / bpm` seconds.
    pub(crate) fn period(self) -> Duration {
        Duration::from_secs(60) / self.0 as u32
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(120)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

impl FromStr for Tempo {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bpm = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::NotANumber(s.to_string()))?;
        Self::new(bpm)
    }
}

/// Shared tempo slot. The control side writes it, the clock reads it once per beat.
#[derive(Debug, Clone, Default)]
pub(crate) struct TempoCell(Arc<RwLock<Tempo>>);

impl TempoCell {
    pub(crate) fn new(tempo: Tempo) -> Self {
        Self(Arc::new(RwLock::new(tempo)))
    }

    pub(crate) fn get(&self) -> Tempo {
        *self.0.read()
    }

    pub(crate) fn set(&self, tempo: Tempo) {
        *self.0.write() = tempo;
    }
}
