//! `ra`: interactive relational algebra interpreter.
//!
//! ```text
//! ra [OPTIONS] [CONFIG]
//! ```
//!
//! `CONFIG` is a TOML file naming the database (see `ra_views::config`).
//! Without it, `--url` or the `RA_URL` environment variable must be set.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use ra_views::config::Config;
use ra_views::db::{self, Database};
use ra_views::dialect::Dialect;
use ra_views::shell::{EchoSource, EditorSource, LineSource, ReaderSource, Shell, Tee};
use ra_views::{RaError, Session};

#[derive(Parser)]
#[command(name = "ra", version, about = "Evaluate relational algebra against a SQL database")]
struct Args {
    /// TOML file with the connection settings.
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Read commands from FILE instead of standard input.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Save a transcript of the session in FILE.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print parsed and validated trees with their output schemas.
    #[arg(short, long)]
    verbose: bool,

    /// Database URL, overriding the one in CONFIG.
    #[arg(long, env = "RA_URL", value_name = "URL")]
    url: Option<String>,

    /// Generate SQL for this dialect instead of the backend's own.
    #[arg(long, value_name = "postgresql|sqlite|mysql|db2")]
    dialect: Option<Dialect>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), RaError> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .with_url(args.url.clone())
    .with_dialect(args.dialect);

    let db = db::connect(&config)?;
    let session = Session::new(db);

    match &args.output {
        Some(path) => {
            let transcript = File::create(path).map_err(|e| {
                RaError::Config(format!("cannot open output file {}: {e}", path.display()))
            })?;
            let out = Tee::new(io::stdout(), transcript.try_clone()?);
            let err = Tee::new(io::stderr(), transcript.try_clone()?);
            let shell = Shell::new(session, out, err, args.verbose);
            run_shell(shell, &args, Some(transcript))
        }
        None => {
            let shell = Shell::new(session, io::stdout(), io::stderr(), args.verbose);
            run_shell(shell, &args, None)
        }
    }
}

fn run_shell<D: Database, W: Write, E: Write>(
    mut shell: Shell<D, W, E>,
    args: &Args,
    transcript: Option<File>,
) -> Result<(), RaError> {
    shell.welcome()?;
    let source: Box<dyn LineSource> = match &args.input {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                RaError::Config(format!("cannot open input file {}: {e}", path.display()))
            })?;
            Box::new(ReaderSource::new(BufReader::new(file)))
        }
        None => Box::new(EditorSource::new()?),
    };
    match transcript {
        Some(file) => shell.run(&mut EchoSource::new(source, file)),
        None => {
            let mut source = source;
            shell.run(&mut source)
        }
    }
}
