pub mod chat;
pub mod memory;
pub mod stats;

pub use chat::ChatCommand;
pub use memory::{ForgetCommand, ListCommand, RecallCommand, RememberCommand, ShowCommand};
pub use stats::StatsCommand;
