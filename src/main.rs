use chrono::Local;
use clap::{Parser, Subcommand};
use env_logger::{Builder, Target, WriteStyle};
use greenery::config::{AppConfig, DEFAULT_CONFIG_FILE};
use greenery::models::OutletState;
use greenery::Action;
use log::LevelFilter;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "greenery", version, about = "Greenhouse sensor polling and outlet scheduling")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Serial port, overriding the configuration file
    #[arg(short, long)]
    port: Option<String>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll every sensor once if this minute is on the polling interval
    Poll,
    /// Switch the outlets whose schedules fire this minute
    Schedule,
    /// Switch one outlet and store its new state
    Outlet { id: u32, state: OutletState },
    /// Send a raw RF channel code
    Transmit { channel: u32, state: OutletState },
    /// List the serial ports on this machine
    Ports,
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        match command {
            Command::Poll => Action::Poll,
            Command::Schedule => Action::Schedule,
            Command::Outlet { id, state } => Action::Outlet { id, state },
            Command::Transmit { channel, state } => Action::Transmit { channel, state },
            Command::Ports => Action::Ports,
        }
    }
}

fn init_logging(config: &AppConfig, verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        config.get_log_level()
    };

    let mut builder = Builder::new();
    builder
        .filter_level(level)
        .write_style(WriteStyle::Always)
        .format_timestamp_secs();

    if let Some(path) = &config.logging.file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder
                    .write_style(WriteStyle::Never)
                    .target(Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Failed to open log file {}: {}", path.display(), e),
        }
    }

    builder.init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration first (without logging)
    let mut config = match AppConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = cli.port {
        config.serial.port = port;
    }

    init_logging(&config, cli.verbose);

    let now = Local::now().naive_local();
    match greenery::run(&cli.command.into(), &config, now) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
