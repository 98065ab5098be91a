use clap::Parser;
use clap::error::ErrorKind;
use crash_replay::{ReplayError, logging, normalize_args, replay_file};
use log::debug;
use std::io;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Replay an annotated PGN as UCI commands to reproduce an engine crash",
    long_about = None
)]
struct Cli {
    /// PGN file and side to replay (white or black), in either order
    #[arg(value_name = "PGN_FILE|COLOR", allow_hyphen_values = true)]
    args: Vec<String>,
}

fn run() -> Result<(), ReplayError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            debug!("argument parsing failed: {err}");
            return Err(ReplayError::Usage);
        }
    };

    let args = normalize_args(&cli.args)?;
    replay_file(&args.path, args.side, io::stdout().lock())?;
    Ok(())
}

fn main() -> ExitCode {
    logging::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is_user_error() => {
            println!("{err}");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
