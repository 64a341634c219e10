//! Decode EZBL handshakes from a text dump of UART packets and print the
//! annotations.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use ezbl::{Annotation, Decoder, Options};
use log::info;

mod capture;
mod output;

use output::Format;

/// Decode Microchip EZBL bootloader handshakes from a UART capture.
#[derive(Parser, Debug)]
#[command(name = "ezbl-dump")]
#[command(version)]
struct Args {
    /// Capture file, one packet per line. Reads stdin if missing or `-`.
    input: Option<PathBuf>,

    /// Treat the RX line as the host instead of TX.
    #[arg(long)]
    swap_directions: bool,

    /// Don't print warnings.
    #[arg(long)]
    hide_warnings: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) if path.as_os_str() != "-" => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening {}", path.display()))?,
        )),
        _ => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run(reader, &mut out, &args)?;
    out.flush()?;
    Ok(())
}

fn run(reader: impl BufRead, out: &mut impl Write, args: &Args) -> Result<()> {
    let mut decoder = Decoder::new(Options {
        swap_directions: args.swap_directions,
    });

    let mut pending: Vec<Annotation> = Vec::new();
    let mut packets = 0;
    let mut printed = 0;
    for packet in capture::read_packets(reader) {
        decoder.decode(&packet?, &mut pending);
        packets += 1;
        for annotation in pending.drain(..) {
            if args.hide_warnings && annotation.is_warning() {
                continue;
            }
            output::write_annotation(out, args.format, &annotation)?;
            printed += 1;
        }
    }

    info!(
        "Read {packets} packets, printed {printed} annotations, finished in {:?}",
        decoder.state()
    );
    Ok(())
}
