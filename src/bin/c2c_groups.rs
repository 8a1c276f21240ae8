//! Group threads that share cache lines in a `perf c2c` report.
//!
//! This binary reads the text output of `perf c2c report --stdio`, extracts
//! the "Shared Cache Line Distribution Pareto" section and prints the
//! threads grouped by transitive cache line sharing.
//!
//! # Usage
//!
//! ```bash
//! perf c2c report --stdio > c2c_report.txt
//! c2c_groups c2c_report.txt
//! c2c_groups c2c_report.txt --format json -o groups.ndjson
//! ```

use c2c_groups::GroupReport;
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use log::info;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// One `g<n>: {tid, ...}` line per group
    Text,
    /// Newline-delimited JSON records
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "c2c_groups")]
#[command(about = "Group threads that share cache lines in a perf c2c report")]
#[command(version)]
struct Args {
    /// perf c2c report file (`perf c2c report --stdio` output)
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Log parsing details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn write_groups<W: Write>(report: &GroupReport, format: Format, writer: W) -> c2c_groups::Result<()> {
    match format {
        Format::Text => report.write_text(writer),
        Format::Json => report.write_ndjson(writer),
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let input_file = File::open(&args.input).map_err(|e| {
        format!(
            "Failed to open input file '{}': {}",
            args.input.display(),
            e
        )
    })?;

    let mut report = GroupReport::new()?;
    report.parse(BufReader::new(input_file))?;
    info!(
        "{}: {} cache lines, {} threads, {} groups",
        args.input.display(),
        report.cache_lines().len(),
        report.thread_count(),
        report.groups().len()
    );

    match args.output {
        Some(path) => {
            let output_file = File::create(&path).map_err(|e| {
                format!("Failed to create output file '{}': {}", path.display(), e)
            })?;
            let mut writer = BufWriter::new(output_file);
            write_groups(&report, args.format, &mut writer)?;
            writer.flush()?;
            eprintln!("Wrote {} groups to '{}'", report.groups().len(), path.display());
        }
        None => {
            let mut writer = BufWriter::new(io::stdout().lock());
            write_groups(&report, args.format, &mut writer)?;
            writer.flush()?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                // Usage problems go to stdout.
                print!("{}", e.render());
                return ExitCode::from(2);
            }
        },
    };

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
