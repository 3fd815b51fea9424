use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use tlnk::config::JobConfig;
use tlnk::job::Job;
use tlnk::utils::date::{format_date, ISO_DATE};
use tlnk::{logging, HtmlParser, HttpClient, JsonParser};

#[derive(Parser)]
#[command(name = "tlnk")]
#[command(about = "Fetch, extract and clean tabular records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a cleaning job described by a TOML config
    Run {
        /// Path to the job config
        #[arg(long, short)]
        config: PathBuf,
        /// Overrides [output].path from the config
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Fetch a URL and print its records as JSON
    Fetch {
        url: String,
        /// Read an HTML table matching this selector instead of JSON
        #[arg(long)]
        table: Option<String>,
        /// Dotted path to the record array in a JSON response
        #[arg(long, default_value = "")]
        json_path: String,
    },
    /// Normalize a date string
    Date {
        value: String,
        /// strftime-style output format
        #[arg(long, default_value = ISO_DATE)]
        format: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            let mut config = JobConfig::load(&config)?;
            if output.is_some() {
                config.output.path = output;
            }
            let print_records = config.output.path.is_none();
            match Job::new(config).run().await {
                Ok(result) => {
                    info!("Job finished");
                    eprintln!("\n📊 Job results:");
                    eprintln!("   Original: {}", result.summary.original_count);
                    eprintln!("   Cleaned: {}", result.summary.cleaned_count);
                    eprintln!("   Dropped: {}", result.summary.dropped);
                    eprintln!("   Columns: {}", result.summary.columns.join(", "));
                    if print_records {
                        println!("{}", serde_json::to_string_pretty(&result.records)?);
                    }
                }
                Err(e) => {
                    error!("Job failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Fetch {
            url,
            table,
            json_path,
        } => {
            let client = HttpClient::new()?;
            let body = client.get_text(&url, &[]).await?;
            let records = match table {
                Some(selector) => HtmlParser::new(&body)?.find_table(&selector)?,
                None => JsonParser::from_slice(body.as_bytes())?.records(&json_path)?,
            };
            info!("Fetched {} records from {}", records.len(), url);
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Date { value, format } => match format_date(&value, &format) {
            Some(date) => println!("{date}"),
            None => anyhow::bail!("No known date format matches {value:?}"),
        },
    }
    Ok(())
}
