//! trpc CLI application entry point
//!
//! Selects torrents on a Transmission daemon by id, path or filter
//! expression and prints them.
//!
//! # Usage
//!
//! ```bash
//! # List every torrent with a total line (default command)
//! trpc
//! trpc list
//!
//! # Incomplete torrents larger than 1 GiB, biggest first
//! trpc list -i -f 'size > 1_073_741_824' --sort size -r
//!
//! # Which torrent owns a file on disk
//! trpc which ~/downloads/Show/ep01.mkv
//!
//! # Files of the torrent owning a directory
//! trpc files ~/downloads/Show
//!
//! # Torrents the daemon reports an error for
//! trpc errors
//!
//! # Pause everything still downloading, showing what would happen first
//! trpc --dry-run stop -i
//! trpc stop -i
//!
//! # Remove a torrent and its data
//! trpc rm --nuke 12
//! ```
//!
//! # Configuration
//!
//! Read from the user's config directory (`~/.config/trpc/config.toml` on
//! Linux). `TR_HOST` and `TR_AUTH` override the daemon address and
//! credentials.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use tracing::debug;
use trpc::{
    TrpcError,
    cli::{Cli, Commands},
    commands::{self, OutputStyle, rm::RemoveOptions},
    config::TrpcConfig,
    logging,
    rpc::TransmissionClient,
};

type Result<T> = std::result::Result<T, TrpcError>;

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => TrpcConfig::load_at(path)?,
        None => TrpcConfig::load()?,
    };
    logging::init(&config.log_level, cli.verbose);

    let client = TransmissionClient::new(&config.rpc)?;
    debug!(url = client.url(), "connecting");

    let stdout = io::stdout();
    let style = OutputStyle {
        quiet: cli.quiet,
        color: stdout.is_terminal(),
    };
    let mut out = stdout.lock();

    let command = cli.get_command();
    match &command {
        Commands::List {
            torrents,
            filter,
            no_totals,
            ..
        } => commands::list(
            &client,
            &config,
            torrents,
            filter,
            command.get_sort(),
            *no_totals,
            style,
            &mut out,
        ),
        Commands::Which { paths, missing } => commands::which(&client, paths, *missing, &mut out),
        Commands::Errors { torrents, filter } => {
            commands::errors(&client, &config, torrents, filter, &mut out)
        }
        Commands::Files { torrents, filter } => {
            commands::files(&client, &config, torrents, filter, style, &mut out)
        }
        Commands::Info { torrents, filter } => {
            commands::info(&client, &config, torrents, filter, style, &mut out)
        }
        Commands::Start {
            torrents,
            filter,
            now,
        } => commands::start(&client, &config, torrents, filter, *now, cli.dry_run, &mut out),
        Commands::Stop { torrents, filter } => {
            commands::stop(&client, &config, torrents, filter, cli.dry_run, &mut out)
        }
        Commands::Verify {
            torrents,
            filter,
            force_all,
        } => commands::verify(&client, &config, torrents, filter, *force_all, cli.dry_run, &mut out),
        Commands::Rm {
            torrents,
            filter,
            force_all,
            nuke,
        } => {
            let options = RemoveOptions {
                force_all: *force_all,
                nuke: *nuke,
                dry_run: cli.dry_run,
            };
            commands::rm(&client, &config, torrents, filter, options, &mut out)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
