use clap::{Parser, Subcommand};
use getforget_cli::commands::{
    ChatCommand, ForgetCommand, ListCommand, RecallCommand, RememberCommand, ShowCommand,
    StatsCommand,
};
use getforget_cli::error::CliResult;
use getforget_cli::output::OutputFormat;
use getforget_cli::{DEFAULT_SERVER_URL, DaemonClient};

#[derive(Parser)]
#[command(name = "getforget-cli")]
#[command(about = "getforget CLI - Talk to a running getforget daemon")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(
        long,
        short = 's',
        global = true,
        default_value = DEFAULT_SERVER_URL,
        help = "Base URL of the daemon"
    )]
    pub server: String,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Send a chat message and see what it recalls")]
    Chat(ChatCommand),

    #[clap(about = "Remember a piece of text")]
    Remember(RememberCommand),

    #[clap(about = "Search memories related to some text")]
    Recall(RecallCommand),

    #[clap(about = "List memories by current importance")]
    List(ListCommand),

    #[clap(about = "Show one memory")]
    Show(ShowCommand),

    #[clap(about = "Forget a memory now")]
    Forget(ForgetCommand),

    #[clap(about = "Show store and forgetting statistics")]
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let client = DaemonClient::new(&cli.server)?;

    match &cli.command {
        Command::Chat(cmd) => cmd.execute(&client, format).await,
        Command::Remember(cmd) => cmd.execute(&client, format).await,
        Command::Recall(cmd) => cmd.execute(&client, format).await,
        Command::List(cmd) => cmd.execute(&client, format).await,
        Command::Show(cmd) => cmd.execute(&client, format).await,
        Command::Forget(cmd) => cmd.execute(&client, format).await,
        Command::Stats(cmd) => cmd.execute(&client, format).await,
    }
}
