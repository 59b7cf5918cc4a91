use std::io::{self, BufRead, Write};

use crate::chase::{ChaseGenerator, ChaseSequence};
use crate::error::{CommandError, ConfigError, PipelineError};
use crate::message::Command;
use crate::pipeline::{PipelineHandle, PipelineState};

const HELP: [(&str, &str, &str); 8] = [
    ("blackout", "blackout", "Turn all lamps off."),
    ("colorwheel", "colorwheel", "Two lamps rotating through a colorwheel."),
    ("mayday", "mayday", "Two lamps alternating yellow and blue."),
    (
        "iso",
        "iso <color1> [color2]",
        "All lamps switch between <color1> and <color2> (default off). \
         A color is a name from the color table or a hex value like #ff7f00.",
    ),
    (
        "random",
        "random [scenes]",
        "A random chase of [scenes] scenes, 5 by default and at most 1024.",
    ),
    (
        "bpm",
        "bpm [number] | <number>",
        "Set the chase speed in beats per minute, or show it without a number.",
    ),
    ("help", "help [command]", "List all commands or describe one."),
    ("exit", "exit", "Stop the lights and leave."),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Exit,
}

/// Line-oriented operator console driving the pipeline.
pub(crate) struct Shell<W: Write> {
    generator: ChaseGenerator,
    pipeline: PipelineHandle,
    out: W,
}

impl<W: Write> Shell<W> {
    pub(crate) fn new(generator: ChaseGenerator, pipeline: PipelineHandle, out: W) -> Self {
        Self {
            generator,
            pipeline,
            out,
        }
    }

    /// Read commands until `exit` or end of input.
    pub(crate) fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        writeln!(self.out, "Welcome to light control!\n\nType \"help\" or \"?\" to list commands\n")?;
        self.prompt()?;
        for line in input.lines() {
            if self.execute(&line?)? == Flow::Exit {
                break;
            }
            self.prompt()?;
        }
        Ok(())
    }

    pub(crate) fn execute(&mut self, line: &str) -> io::Result<Flow> {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(CommandError::Unknown(name)) => {
                writeln!(self.out, "*** Unknown command: {name}")?;
                return Ok(Flow::Continue);
            }
            Err(e) => {
                writeln!(self.out, "*** ERROR: {e}")?;
                return Ok(Flow::Continue);
            }
        };

        match &command {
            Command::Empty => return Ok(Flow::Continue),
            Command::Exit => return Ok(Flow::Exit),
            Command::Help(topic) => {
                self.help(topic.as_deref())?;
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        // nothing reaches the lamps any more, so stop taking commands
        if self.pipeline.state() == PipelineState::Faulted {
            writeln!(self.out, "*** ERROR: {}", PipelineError::Faulted)?;
            return Ok(Flow::Exit);
        }

        let chase = match command {
            Command::Empty | Command::Exit | Command::Help(_) => return Ok(Flow::Continue),
            Command::ShowTempo => {
                writeln!(self.out, "tempo is {}", self.pipeline.tempo())?;
                return Ok(Flow::Continue);
            }
            Command::Bpm(tempo) => {
                self.pipeline.set_tempo(tempo);
                writeln!(self.out, "tempo set to {tempo}")?;
                return Ok(Flow::Continue);
            }
            Command::Blackout => Ok(self.generator.blackout()),
            Command::Mayday => self.generator.mayday(),
            Command::Colorwheel => self.generator.colorwheel(),
            Command::Iso(color1, color2) => self.generator.iso(&color1, color2.as_deref()),
            Command::Random(scenes) => self.generator.random(scenes, &mut rand::rng()),
        };
        self.request(chase)?;
        Ok(Flow::Continue)
    }

    fn request(&mut self, chase: Result<ChaseSequence, ConfigError>) -> io::Result<()> {
        let result = chase
            .map_err(PipelineError::from)
            .and_then(|chase| self.pipeline.request_chase(chase));
        if let Err(e) = result {
            writeln!(self.out, "*** ERROR: {e}")?;
        }
        Ok(())
    }

    fn help(&mut self, topic: Option<&str>) -> io::Result<()> {
        match topic {
            Some(topic) => match HELP.iter().find(|(name, _, _)| *name == topic) {
                Some((name, usage, text)) => {
                    writeln!(self.out, "usage: {usage}\n    {text}")?;
                    if *name == "iso" {
                        let names = self.generator.colors().names().join(", ");
                        writeln!(self.out, "    colors: {names}")?;
                    }
                }
                None => writeln!(self.out, "*** Unknown command: {topic}")?,
            },
            None => {
                writeln!(self.out, "Commands (type help <command>):")?;
                for (name, _, text) in HELP {
                    writeln!(self.out, "  {name:<12}{text}")?;
                }
            }
        }
        Ok(())
    }

    fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()
    }
}
