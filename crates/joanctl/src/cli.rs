//! Clap derive structures for the `joanctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// joanctl -- manage Joan e-ink tablets through a Visionect server
#[derive(Debug, Parser)]
#[command(
    name = "joanctl",
    version,
    about = "Manage Joan e-ink tablets from the command line",
    long_about = "A CLI for the Visionect device-management API.\n\n\
        Authentication is resolved automatically: HMAC request signing is\n\
        tried first, then HTTP Basic, then cookie-session login.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "JOAN_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server address (overrides profile; port 8081 assumed)
    #[arg(long, short = 's', env = "JOAN_SERVER", global = true)]
    pub server: Option<String>,

    /// API key for HMAC / Basic auth
    #[arg(long, env = "JOAN_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// API secret paired with --api-key
    #[arg(long, env = "JOAN_API_SECRET", global = true, hide_env = true)]
    pub api_secret: Option<String>,

    /// Username for cookie-session login
    #[arg(long, env = "JOAN_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "JOAN_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "JOAN_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "JOAN_TIMEOUT", default_value = "15", global = true)]
    pub timeout: u64,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check server reachability and report the resolved auth mode
    Ping,

    /// Manage devices (list, content, rotation, power)
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Inspect and restart device sessions
    #[command(alias = "s")]
    Session(SessionArgs),

    /// Manage joanctl configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all devices
    #[command(alias = "ls")]
    List,

    /// Show one device record
    Show {
        /// Device UUID
        uuid: String,
    },

    /// Show the merged device + session view
    Data {
        /// Device UUID
        uuid: String,
    },

    /// Point devices at a URL (forces the HTML backend)
    SetUrl {
        /// Target URL
        #[arg(long)]
        url: String,

        /// Device UUIDs (at least one)
        #[arg(required = true)]
        uuids: Vec<String>,
    },

    /// Set display rotation (0-3 quarter turns)
    Rotate {
        /// Device UUID
        uuid: String,

        /// Rotation in quarter turns
        rotation: i64,
    },

    /// Reboot devices (one round trip for multiple UUIDs)
    Reboot {
        /// Device UUIDs (at least one)
        #[arg(required = true)]
        uuids: Vec<String>,
    },

    /// Restart the sessions of devices (faster than a full reboot)
    Restart {
        /// Device UUIDs (at least one)
        #[arg(required = true)]
        uuids: Vec<String>,
    },

    /// Clear the webkit cache of devices
    ClearCache {
        /// Device UUIDs (at least one)
        #[arg(required = true)]
        uuids: Vec<String>,
    },

    /// Set one key in a device's Options map
    SetOption {
        /// Device UUID
        uuid: String,

        /// Option key
        key: String,

        /// Option value
        value: String,
    },

    /// Save the current screen rendering as a PNG
    Screenshot {
        /// Device UUID
        uuid: String,

        /// Output file path
        #[arg(long, short = 'f', default_value = "screen.png")]
        file: PathBuf,
    },
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Show one session record
    Show {
        /// Device UUID
        uuid: String,
    },

    /// Restart sessions (one round trip for multiple UUIDs)
    Restart {
        /// Device UUIDs (at least one)
        #[arg(required = true)]
        uuids: Vec<String>,
    },

    /// Set session encoding/dithering options
    SetOptions {
        /// Device UUID
        uuid: String,

        /// Default encoding (e.g. "4bpp")
        #[arg(long)]
        encoding: Option<String>,

        /// Default dithering (e.g. "bayer", "none")
        #[arg(long)]
        dithering: Option<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the loaded configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,

    /// Store a secret in the system keyring
    SetSecret {
        /// Which secret to store
        #[arg(value_enum)]
        kind: SecretKind,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SecretKind {
    /// API secret paired with the profile's api_key
    ApiSecret,
    /// Password for cookie-session login
    Password,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
