use clap::Parser;

use crate::client::DaemonClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, truncate_string};

#[derive(Parser)]
pub struct ChatCommand {
    #[clap(help = "Message to send")]
    pub text: String,
}

impl ChatCommand {
    pub async fn execute(&self, client: &DaemonClient, format: OutputFormat) -> CliResult<()> {
        let reply = client.chat(&self.text).await?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            }
            OutputFormat::Table => {
                println!("{}", reply.message.content);
                println!();
                println!("Memories ({}):", reply.memories.len());
                for (key, entry) in &reply.memories {
                    println!(
                        "  {key:<16} uses={:<4} {}",
                        entry.uses(),
                        truncate_string(&entry.content, 50)
                    );
                }
            }
        }

        Ok(())
    }
}
