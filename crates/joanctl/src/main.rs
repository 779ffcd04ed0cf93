mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use joan_api::VisionectClient;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a server connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "joanctl", &mut std::io::stdout());
            Ok(())
        }

        // All other commands require a connected client
        cmd => {
            let client = connect(&cli.global).await?;
            tracing::debug!(mode = client.auth_mode().as_str(), "connected");
            commands::dispatch(cmd, &client, &cli.global).await
        }
    }
}

/// Build the client config from profile + flags and resolve auth.
async fn connect(global: &cli::GlobalOpts) -> Result<VisionectClient, CliError> {
    let cfg = joan_config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    let client_config = config::build_client_config(global)?;

    VisionectClient::connect(client_config)
        .await
        .map_err(|err| match err {
            joan_api::Error::Authentication { .. } => CliError::AuthFailed {
                profile: profile_name,
                source: err,
            },
            other => CliError::from_api(other, None),
        })
}
