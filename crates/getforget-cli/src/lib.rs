pub mod client;
pub mod commands;
pub mod error;
pub mod output;

pub use client::{DEFAULT_SERVER_URL, DaemonClient};
pub use commands::{
    ChatCommand, ForgetCommand, ListCommand, RecallCommand, RememberCommand, ShowCommand,
    StatsCommand,
};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, format_timestamp, truncate_string};
