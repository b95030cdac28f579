//! Binary entrypoint for `redmine-export`.

use std::env;
use std::process::ExitCode;

use clap::Parser;
use redmine_export::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mode = cli.mode().unwrap_or_else(|err| err.exit());

    let default_level = if cli.verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .format_timestamp_millis()
    .try_init();

    let command_line = env::args().collect::<Vec<_>>().join(" ");
    redmine_export::run(&cli, mode, &command_line).await
}
