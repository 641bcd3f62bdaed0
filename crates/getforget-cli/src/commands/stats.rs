use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::client::DaemonClient;
use crate::error::CliResult;
use crate::output::{OutputFormat, format_importance, format_timestamp};

#[derive(Parser)]
pub struct StatsCommand {}

impl StatsCommand {
    pub async fn execute(&self, client: &DaemonClient, format: OutputFormat) -> CliResult<()> {
        let stats = client.stats().await?;

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            OutputFormat::Table => {
                println!("getforget Statistics");
                println!("====================\n");

                let last_cycle = stats
                    .forgetting
                    .last_cycle_at
                    .as_ref()
                    .map(format_timestamp)
                    .unwrap_or_else(|| "never".to_string());
                let state = serde_json::to_value(stats.forgetting.state)?
                    .as_str()
                    .unwrap_or_default()
                    .to_string();

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Metric", "Value"]);

                table.add_row(["Memories".to_string(), stats.store.count.to_string()]);
                table.add_row([
                    "Mean importance".to_string(),
                    format_importance(stats.store.mean_importance),
                ]);
                table.add_row(["Forgetting state".to_string(), state]);
                table.add_row([
                    "Forgetting cycles".to_string(),
                    stats.forgetting.cycles.to_string(),
                ]);
                table.add_row([
                    "Total forgotten".to_string(),
                    stats.forgetting.total_forgotten.to_string(),
                ]);
                table.add_row(["Last cycle".to_string(), last_cycle]);

                println!("{table}");
            }
        }

        Ok(())
    }
}
