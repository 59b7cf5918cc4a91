use thiserror::Error;

/// Rejected construction of a tempo, colour, scene or chase.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConfigError {
    #[error("BPM should be between {min} and {max}, got {value}")]
    TempoOutOfRange { value: u32, min: u16, max: u16 },

    #[error("invalid hex colour \"{0}\": expected exactly 6 hex digits")]
    InvalidHex(String),

    #[error("unknown color \"{0}\"")]
    UnknownColor(String),

    #[error("color requires 3 channels, but only {available} channels available at offset {channel}")]
    ColorOutOfBounds { channel: usize, available: usize },

    #[error("lamp offset {0} is outside 0..=509")]
    ChannelOutOfRange(usize),

    #[error("channel map has no lamps")]
    EmptyChannelMap,

    #[error("chase has no scenes")]
    EmptyChase,

    #[error("scene count {value} is outside 1..={max}")]
    SceneCountOutOfRange { value: usize, max: usize },

    #[error("scene has {colors} colors for {lamps} lamps")]
    LampCountMismatch { lamps: usize, colors: usize },

    #[error("argument is not a number: \"{0}\"")]
    NotANumber(String),
}

/// Failure of the serial line underneath the transmitter.
#[derive(Error, Debug)]
pub(crate) enum TransportError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub(crate) enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0} queue is full")]
    Backpressure(&'static str),

    #[error("{0} channel disconnected")]
    Disconnected(&'static str),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("DMX link failed, restart required")]
    Faulted,

    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

/// A shell line that could not be turned into a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{0} needs an argument")]
    MissingArgument(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
