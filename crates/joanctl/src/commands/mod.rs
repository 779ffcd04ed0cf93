//! Command dispatch: bridges CLI args -> API calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod session;

use joan_api::VisionectClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &VisionectClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Ping => ping(client, global).await,
        Command::Devices(args) => devices::handle(client, args, global).await,
        Command::Session(args) => session::handle(client, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

async fn ping(client: &VisionectClient, global: &GlobalOpts) -> Result<(), CliError> {
    // Connecting already resolved auth, so reaching this point means the
    // server answered; report the mode it accepted.
    if client.test_authentication().await {
        output::print_success(
            &format!(
                "{} is up (auth: {})",
                client.endpoint(),
                client.auth_mode().as_str()
            ),
            global.quiet,
        );
        Ok(())
    } else {
        Err(CliError::ConnectionFailed {
            source: joan_api::Error::Authentication {
                message: "ping rejected after successful setup".into(),
            },
        })
    }
}
