use crate::error::{CommandError, ConfigError};
use crate::tempo::Tempo;

pub(crate) const DEFAULT_RANDOM_SCENES: usize = 5;

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Empty,
    Help(Option<String>),
    Exit,
    Bpm(Tempo),
    /// `bpm` without an argument reports the current tempo.
    ShowTempo,
    Random(usize),
    Iso(String, Option<String>),
    Blackout,
    Mayday,
    Colorwheel,
}

impl Command {
    pub(crate) fn parse(line: &str) -> Result<Self, CommandError> {
        let mut args = line.split_whitespace();
        let Some(name) = args.next() else {
            return Ok(Command::Empty);
        };

        let command = match name {
            "help" | "?" => Command::Help(args.next().map(str::to_string)),
            "exit" | "quit" => Command::Exit,
            "bpm" => match args.next() {
                Some(bpm) => Command::Bpm(bpm.parse()?),
                None => Command::ShowTempo,
            },
            "random" => match args.next() {
                Some(n) => Command::Random(
                    n.parse()
                        .map_err(|_| ConfigError::NotANumber(n.to_string()))?,
                ),
                None => Command::Random(DEFAULT_RANDOM_SCENES),
            },
            "iso" => {
                let color1 = args.next().ok_or(CommandError::MissingArgument("iso"))?;
                Command::Iso(color1.to_string(), args.next().map(str::to_string))
            }
            "blackout" => Command::Blackout,
            "mayday" => Command::Mayday,
            "colorwheel" => Command::Colorwheel,
            // a bare number is a tempo
            n if n.chars().all(|c| c.is_ascii_digit()) => Command::Bpm(n.parse()?),
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}
