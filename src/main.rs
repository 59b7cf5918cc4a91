mod chase;
mod clock;
mod dmx;
mod error;
mod message;
mod pipeline;
mod shell;
mod tempo;

use std::io;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::chase::ChaseGenerator;
use crate::dmx::{ChannelMap, ColorTable, SerialTransport};
use crate::pipeline::{FramePipeline, PipelineConfig};
use crate::shell::Shell;
use crate::tempo::Tempo;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Serial port the DMX interface is on, e.g. /dev/ttyUSB0 or COM3
    #[clap(value_parser)]
    pub port: String,

    #[clap(short, long, value_parser, default_value = "120")]
    pub bpm: Tempo,

    /// First RGB channel of each lamp, 0-indexed
    #[clap(short, long, value_parser, value_delimiter = ',', default_values_t = [0usize, 8])]
    pub channels: Vec<usize>,
}

fn main() -> anyhow::Result<()> {
    // install tracing; stdout belongs to the shell
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::Layer::new().with_writer(io::stderr));
    tracing::subscriber::set_global_default(subscriber).context("unable to set a global collector")?;

    // run clap
    let args: Args = Args::parse();

    let channels = ChannelMap::new(args.channels).context("invalid lamp channels")?;
    let generator = ChaseGenerator::new(channels, ColorTable::default());

    let transport = SerialTransport::open(&args.port)
        .with_context(|| format!("unable to open serial port {}", args.port))?;

    let mut pipeline = FramePipeline::start(
        Box::new(transport),
        generator.blackout(),
        args.bpm,
        PipelineConfig::default(),
    )?;

    let mut shell = Shell::new(generator, pipeline.handle(), io::stdout());
    let session = shell.run(io::stdin().lock());

    let state = pipeline.state();
    let stopped = pipeline.stop();
    let stats = pipeline.stats();
    tracing::info!(
        ?state,
        beats = stats.beats,
        queued = stats.frames_queued,
        dropped = stats.frames_dropped,
        swaps = stats.chase_swaps,
        pulse_timeouts = stats.pulse_timeouts,
        "session ended"
    );
    stopped.context("light pipeline failed")?;
    session?;
    Ok(())
}
