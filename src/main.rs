use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use configger::{Config, Error};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Inspect or edit a configuration file.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the configuration file
    file: PathBuf,

    /// Log at debug level unless `CONFIGGER_LOG` says otherwise
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the file in canonical form, without comments
    Show,
    /// List section names
    Sections,
    /// List option names of a section
    Options { section: String },
    /// Print the value of an option
    Get {
        section: String,
        key: String,
        /// Expand %(name)s references
        #[arg(short, long)]
        interpolate: bool,
    },
    /// Print an option as `true` or `false`
    Bool { section: String, key: String },
    /// Set an option and save; without VALUE the option has no value
    Set {
        section: String,
        key: String,
        value: Option<String>,
    },
    /// Remove an option and save
    Unset { section: String, key: String },
    /// Remove a section and save
    RemoveSection { section: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("CONFIGGER_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Error> {
    let mut config = Config::load(&cli.file)?;

    match cli.command {
        Command::Show => print!("{config}"),
        Command::Sections => {
            for name in config.sections() {
                println!("{name}");
            }
        }
        Command::Options { section } => {
            for name in config.options(&section)? {
                println!("{name}");
            }
        }
        Command::Get {
            section,
            key,
            interpolate,
        } => {
            if interpolate {
                println!("{}", config.get_interpolated(&section, &key)?);
            } else if let Some(value) = config.get_str(&section, &key)? {
                println!("{value}");
            }
        }
        Command::Bool { section, key } => println!("{}", config.get_bool(&section, &key)?),
        Command::Set {
            section,
            key,
            value,
        } => {
            config.set(&section, &key, value)?;
            save(&config, &cli.file)?;
        }
        Command::Unset { section, key } => {
            config.remove_option(&section, &key)?;
            save(&config, &cli.file)?;
        }
        Command::RemoveSection { section } => {
            config.remove_section(&section)?;
            save(&config, &cli.file)?;
        }
    }

    Ok(())
}

fn save(config: &Config, path: &Path) -> Result<(), Error> {
    debug!(path = %path.display(), "writing changes");
    config.save(path)
}
