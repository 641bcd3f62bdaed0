use chrono::Utc;
use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use getforget::memory::importance::calculate_importance;

use crate::client::DaemonClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, format_importance, format_timestamp, truncate_string};

#[derive(Parser)]
pub struct RememberCommand {
    #[clap(help = "Text to remember under its keywords")]
    pub text: String,
}

#[derive(Parser)]
pub struct RecallCommand {
    #[clap(help = "Text whose keywords to search for")]
    pub query: String,
}

#[derive(Parser)]
pub struct ListCommand {
    #[clap(
        long,
        short,
        default_value = "20",
        help = "Maximum number of memories to display"
    )]
    pub limit: usize,

    #[clap(
        long,
        help = "Decay constant in hours used to compute importance [default: the daemon's]"
    )]
    pub decay_hours: Option<f64>,
}

#[derive(Parser)]
pub struct ShowCommand {
    #[clap(help = "Keyword the memory is stored under")]
    pub key: String,

    #[clap(
        long,
        help = "Decay constant in hours used to compute importance [default: the daemon's]"
    )]
    pub decay_hours: Option<f64>,
}

async fn resolve_decay_hours(client: &DaemonClient, flag: Option<f64>) -> CliResult<f64> {
    match flag {
        Some(hours) => Ok(hours),
        None => client.decay_hours().await,
    }
}

#[derive(Parser)]
pub struct ForgetCommand {
    #[clap(help = "Keyword to forget")]
    pub key: String,
}

impl RememberCommand {
    pub async fn execute(&self, client: &DaemonClient, format: OutputFormat) -> CliResult<()> {
        let stored = client.remember(&self.text).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stored)?),
            OutputFormat::Table => {
                println!("Remembered under '{}'", stored.key);
                if !stored.entry.keywords.is_empty() {
                    let keywords: Vec<&str> =
                        stored.entry.keywords.iter().map(String::as_str).collect();
                    println!("  Keywords:   {}", keywords.join(", "));
                }
                println!("  Importance: {}", format_importance(stored.entry.base_importance));
                println!("  Uses:       {}", stored.entry.uses());
            }
        }

        Ok(())
    }
}

impl RecallCommand {
    pub async fn execute(&self, client: &DaemonClient, format: OutputFormat) -> CliResult<()> {
        let matches = client.recall(&self.query).await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&matches)?),
            OutputFormat::Table => {
                if matches.is_empty() {
                    println!("Nothing came to mind.");
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Key", "Importance", "Uses", "Content"]);

                for m in &matches {
                    table.add_row([
                        m.key.clone(),
                        format_importance(m.importance),
                        m.entry.uses().to_string(),
                        truncate_string(&m.entry.content, 60),
                    ]);
                }

                println!("{table}");
            }
        }

        Ok(())
    }
}

impl ListCommand {
    pub async fn execute(&self, client: &DaemonClient, format: OutputFormat) -> CliResult<()> {
        let snapshot = client.list().await?;
        let decay_hours = resolve_decay_hours(client, self.decay_hours).await?;
        let now = Utc::now();

        let mut rows: Vec<_> = snapshot
            .into_iter()
            .map(|(key, entry)| {
                let importance = calculate_importance(&entry, now, decay_hours);
                (key, entry, importance)
            })
            .collect();
        rows.sort_by(|a, b| b.2.total_cmp(&a.2));
        let total = rows.len();
        rows.truncate(self.limit);

        match format {
            OutputFormat::Json => {
                let output: Vec<_> = rows
                    .iter()
                    .map(|(key, entry, importance)| {
                        serde_json::json!({
                            "key": key,
                            "content": &entry.content,
                            "importance": importance,
                            "initialImportance": entry.base_importance,
                            "useCount": entry.uses(),
                            "timestamp": entry.created_at.to_rfc3339(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                if rows.is_empty() {
                    println!("No memories.");
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Key", "Importance", "Uses", "Created", "Content"]);

                for (key, entry, importance) in &rows {
                    table.add_row([
                        key.clone(),
                        format_importance(*importance),
                        entry.uses().to_string(),
                        format_timestamp(&entry.created_at),
                        truncate_string(&entry.content, 50),
                    ]);
                }

                println!("{table}");
                println!("\nShowing {} of {} memories", rows.len(), total);
            }
        }

        Ok(())
    }
}

impl ShowCommand {
    pub async fn execute(&self, client: &DaemonClient, format: OutputFormat) -> CliResult<()> {
        let Some(stored) = client.show(&self.key).await? else {
            return Err(format!("No memory for '{}'", self.key).into());
        };
        let decay_hours = resolve_decay_hours(client, self.decay_hours).await?;
        let importance = calculate_importance(&stored.entry, Utc::now(), decay_hours);

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stored)?),
            OutputFormat::Table => {
                println!("Key:                {}", stored.key);
                println!("Content:            {}", stored.entry.content);
                println!("Created:            {}", format_timestamp(&stored.entry.created_at));
                println!(
                    "Initial importance: {}",
                    format_importance(stored.entry.base_importance)
                );
                println!("Importance now:     {}", format_importance(importance));
                println!("Uses:               {}", stored.entry.uses());
            }
        }

        Ok(())
    }
}

impl ForgetCommand {
    pub async fn execute(&self, client: &DaemonClient, format: OutputFormat) -> CliResult<()> {
        let existed = client.forget(&self.key).await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({ "key": &self.key, "forgotten": existed });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table if existed => println!("Forgot '{}'", self.key),
            OutputFormat::Table => println!("Nothing remembered under '{}'", self.key),
        }

        Ok(())
    }
}
