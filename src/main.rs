use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::{error, info};
use mini::{Document, Section};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

#[derive(Parser)]
#[command(name = "mini", about = "Inspect the sections and keys of an INI file")]
struct Args {
    /// INI file to read
    path: PathBuf,

    /// Only show this section
    #[arg(short, long)]
    section: Option<String>,

    /// Print the value of this key (requires --section)
    #[arg(short, long, requires = "section")]
    key: Option<String>,

    /// Increase log output; repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let _ = TermLogger::init(level, log_config, TerminalMode::Stderr, ColorChoice::Auto);

    let data = match fs::read(&args.path) {
        Ok(data) => data,
        Err(e) => {
            error!("failed to read {}: {e}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let document = match mini::parse(args.path.display().to_string(), &data) {
        Ok(document) => document,
        Err(e) => {
            error!("failed to parse {}: {e}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    info!(
        "loaded {} section(s) from {}",
        document.section_count(),
        document.name()
    );

    match (args.section.as_deref(), args.key.as_deref()) {
        (Some(section), Some(key)) => match document.value_of(section, key) {
            Some(value) => println!("{value}"),
            None => {
                error!("[{section}] has no key {key:?}");
                return ExitCode::FAILURE;
            }
        },
        (Some(section), None) => match document.section(section) {
            Some(section) => print_section(section),
            None => {
                error!("no section named [{section}]");
                return ExitCode::FAILURE;
            }
        },
        (None, _) => print_document(&document),
    }

    ExitCode::SUCCESS
}

fn print_document(document: &Document) {
    for section in document.sections() {
        print_section(section);
        println!();
    }
}

fn print_section(section: &Section) {
    println!("[{}]", section.name());

    for entry in section.entries() {
        println!("{} = \"{}\"", entry.key(), entry.value());
    }
}
