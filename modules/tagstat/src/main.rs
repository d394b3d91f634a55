use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kommo_client::KommoClient;
use tagstat::config::LEAD_CAP;
use tagstat::{Config, Credentials, FilterParams, RefreshInterval, RefreshTask, TagStatsService};

#[derive(Parser)]
#[command(name = "tagstat")]
#[command(about = "Lead tag statistics for a Kommo account")]
#[command(version)]
struct Cli {
    /// Kommo account domain (overrides KOMMO_DOMAIN)
    #[arg(long, global = true)]
    domain: Option<String>,

    /// Kommo API key (overrides KOMMO_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ranked tag statistics for a time window
    Stats {
        /// day, yesterday, week, month or custom
        #[arg(long)]
        period: Option<String>,

        #[arg(long = "type")]
        lead_type: Option<String>,

        #[arg(long)]
        date_from: Option<String>,

        #[arg(long)]
        date_to: Option<String>,

        /// Keep recomputing until interrupted
        #[arg(long)]
        watch: bool,

        /// Refresh interval in seconds for --watch (30-3600)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Full tag catalog
    Tags,

    /// Tags whose name contains QUERY (case-insensitive)
    Search { query: String },

    /// Raw leads with their tags
    Leads {
        #[arg(long, default_value_t = LEAD_CAP)]
        limit: usize,
    },
}

#[derive(Serialize)]
struct LeadsOutput<'a> {
    leads: &'a [kommo_client::Lead],
    count: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tagstat=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let (credentials, config) = match (cli.domain, cli.api_key) {
        (Some(domain), Some(api_key)) => (Credentials { domain, api_key }, None),
        (domain, api_key) => {
            let config = Config::from_env()?;
            config.log_redacted();
            let credentials = Credentials {
                domain: domain.unwrap_or_default(),
                api_key: api_key.unwrap_or_default(),
            }
            .or_else(&config);
            (credentials, Some(config))
        }
    };

    let client = KommoClient::new(&credentials.domain, &credentials.api_key)?;
    let service = TagStatsService::new(client);

    match cli.command {
        Command::Stats {
            period,
            lead_type,
            date_from,
            date_to,
            watch,
            interval,
        } => {
            let filters = FilterParams {
                period,
                lead_type,
                date_from,
                date_to,
            };
            if !watch {
                let stats = service.compute_statistics(&filters).await?;
                print_json(&stats)?;
                return Ok(());
            }

            let interval = match interval {
                Some(secs) => RefreshInterval::new(secs)?,
                None => config.map(|c| c.refresh_interval).unwrap_or_default(),
            };
            watch_statistics(service, filters, interval).await?;
        }
        Command::Tags => {
            let tags = service.list_tags().await?;
            print_json(&serde_json::json!({ "tags": tags }))?;
        }
        Command::Search { query } => {
            let tags = service.search_tags(&query).await?;
            print_json(&serde_json::json!({ "tags": tags }))?;
        }
        Command::Leads { limit } => {
            let leads = service.list_leads(limit).await?;
            print_json(&LeadsOutput {
                leads: &leads,
                count: leads.len(),
            })?;
        }
    }

    Ok(())
}

async fn watch_statistics(
    service: TagStatsService<KommoClient>,
    filters: FilterParams,
    interval: RefreshInterval,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(4);
    let mut task = RefreshTask::start(Arc::new(service), filters, interval, tx);

    loop {
        tokio::select! {
            Some(result) = rx.recv() => match result {
                Ok(stats) => print_json(&stats)?,
                Err(e) => error!(error = %e, "Refresh failed"),
            },
            stopped = task.stopped() => {
                match stopped {
                    Err(e) => anyhow::bail!("Refresh loop crashed: {e}"),
                    Ok(()) => anyhow::bail!("Refresh loop stopped unexpectedly"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping refresh");
                task.cancel();
                break;
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
