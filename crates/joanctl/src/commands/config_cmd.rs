//! `joanctl config` -- inspect configuration and manage keyring secrets.

use joan_config::KEYRING_SERVICE;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, SecretKind};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => {
            println!("{}", joan_config::config_path().display());
            Ok(())
        }
        ConfigCommand::SetSecret { kind } => set_secret(kind, global),
    }
}

/// Print the merged configuration with secrets blanked out.
fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = joan_config::load_config_or_default();
    for profile in cfg.profiles.values_mut() {
        if profile.api_secret.is_some() {
            profile.api_secret = Some("<redacted>".into());
        }
        if profile.password.is_some() {
            profile.password = Some("<redacted>".into());
        }
    }

    let rendered = toml::to_string_pretty(&cfg).map_err(joan_config::ConfigError::from)?;
    output::print_output(rendered.trim_end(), global.quiet);
    Ok(())
}

/// Prompt for a secret and store it under the active profile's keyring
/// entry. Plaintext config values are never written here.
fn set_secret(kind: SecretKind, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = joan_config::load_config_or_default();
    let profile = crate::config::active_profile_name(global, &cfg);

    let (label, key) = match kind {
        SecretKind::ApiSecret => ("API secret", format!("{profile}/api-secret")),
        SecretKind::Password => ("password", format!("{profile}/password")),
    };

    let secret = rpassword::prompt_password(format!("Enter {label} for profile '{profile}': "))?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: label.to_owned(),
            reason: "must not be empty".into(),
        });
    }

    keyring::Entry::new(KEYRING_SERVICE, &key)
        .and_then(|entry| entry.set_password(&secret))
        .map_err(|e| CliError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })?;

    output::print_success(
        &format!("{label} stored in keyring for profile '{profile}'"),
        global.quiet,
    );
    Ok(())
}
