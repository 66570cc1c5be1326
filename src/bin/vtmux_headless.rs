//! vtmux headless runner
//!
//! Feeds a byte stream through one buffer's interpreter and prints the
//! resulting screen. Useful for checking how vtmux would display a captured
//! session without a PTY or a real terminal.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vtmux::core::Snapshot;
use vtmux::Terminal;

#[derive(Parser, Debug)]
#[command(name = "vtmux-headless")]
#[command(version)]
#[command(about = "Render a byte stream through the vtmux interpreter", long_about = None)]
struct Args {
    /// Input file (stdin when omitted)
    input: Option<PathBuf>,

    /// Screen rows
    #[arg(short, long, default_value_t = 24)]
    rows: usize,

    /// Screen columns
    #[arg(short, long, default_value_t = 80)]
    cols: usize,

    /// Scrollback lines to keep (unbounded when omitted)
    #[arg(long)]
    scrollback: Option<usize>,

    /// Feed the input in chunks of this many bytes
    #[arg(long, value_name = "BYTES")]
    chunk: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let input = match &args.input {
        Some(path) => match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading file {:?}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut data = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut data) {
                eprintln!("Error reading stdin: {}", e);
                return ExitCode::FAILURE;
            }
            data
        }
    };

    let mut terminal = Terminal::new(args.rows, args.cols, args.scrollback);
    match args.chunk {
        Some(size) if size > 0 => input.chunks(size).for_each(|chunk| terminal.process(chunk)),
        _ => terminal.process(&input),
    }

    let snapshot = Snapshot::from_screen(terminal.screen());
    match args.format {
        OutputFormat::Text => {
            println!(
                "Screen {}x{}, cursor ({}, {}), scrollback {}",
                snapshot.rows,
                snapshot.cols,
                snapshot.cursor.row,
                snapshot.cursor.col,
                snapshot.scrollback_lines
            );
            println!("---");
            print!("{}", snapshot.to_text());
            println!("---");
        }
        OutputFormat::Json => match snapshot.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing snapshot: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}
