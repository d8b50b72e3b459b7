use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use scout_core::report::{Report, ResearchType};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scout_client::api::{ApiClient, ResearchApi};
use scout_client::config::{normalize_base_url, ClientConfig};
use scout_client::dashboard::{Connectivity, Dashboard};
use scout_client::poller::{PollOutcome, PollerConfig};

/// Command-line front end for the research server.
#[derive(Parser, Debug)]
#[command(name = "scout", version)]
struct Cli {
    /// Research server base URL (overrides RESEARCH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Status poll interval in milliseconds (overrides RESEARCH_POLL_INTERVAL_MS)
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the research server is reachable
    Health,
    /// Queue a new research report
    Generate {
        /// Research topic or question
        #[arg(short, long)]
        topic: String,
        /// academic, market_analysis, competitive_intelligence, technology_review
        #[arg(short = 'r', long = "type", default_value = "academic")]
        research_type: ResearchType,
        /// Optional id of the requesting user
        #[arg(long)]
        user_id: Option<String>,
        /// Poll until the report finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// Show the current status of a report
    Status { report_id: String },
    /// Poll a report until it finishes
    Watch { report_id: String },
    /// List all reports
    Reports,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scout_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config.api_url = normalize_base_url(url);
    }
    if let Some(ms) = cli.interval_ms {
        config.poll_interval = Duration::from_millis(ms.max(1));
    }
    tracing::debug!(api_url = %config.api_url, "Loaded client configuration");

    let client = ApiClient::new(&config).context("failed to build HTTP client")?;
    let api: Arc<dyn ResearchApi> = Arc::new(client);
    let dashboard = Dashboard::new(Arc::clone(&api), PollerConfig::from(&config));

    match cli.command {
        Command::Health => match dashboard.check_health().await {
            Connectivity::Online => println!("online ({})", config.api_url),
            _ => bail!("offline: {}", config.api_url),
        },
        Command::Generate {
            topic,
            research_type,
            user_id,
            watch,
        } => {
            let report_id = dashboard
                .submit(&topic, research_type.as_str(), user_id.as_deref())
                .await?;
            println!("queued {report_id}");
            if watch {
                follow(&dashboard, &report_id).await?;
            } else {
                dashboard.shutdown().await;
            }
        }
        Command::Status { report_id } => {
            let report = api.get_report_status(&report_id).await?;
            print_report(&report);
        }
        Command::Watch { report_id } => follow(&dashboard, &report_id).await?,
        Command::Reports => {
            let reports = dashboard.refresh_reports().await?;
            if reports.is_empty() {
                println!("no reports");
            }
            for report in &reports {
                println!(
                    "{}  {:<10} {:>3}%  {}",
                    report.id, report.status, report.progress, report.topic
                );
            }
        }
    }

    Ok(())
}

/// Print progress for a watched report until it finishes or Ctrl-C.
async fn follow(dashboard: &Dashboard, report_id: &str) -> anyhow::Result<()> {
    let mut updates = dashboard.watch(report_id).await;
    let mut last_progress = None;

    loop {
        let finished = {
            let snapshot = updates.borrow_and_update();
            if let Some(report) = &snapshot.report {
                if last_progress != Some((report.status, report.progress)) {
                    println!("{}  {} {}%", report.id, report.status, report.progress);
                    last_progress = Some((report.status, report.progress));
                }
            }
            snapshot.outcome.is_some()
        };
        if finished {
            break;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                dashboard.shutdown().await;
            }
        }
    }

    match dashboard.wait(report_id).await {
        Some(PollOutcome::Completed(report)) => {
            print_report(&report);
            Ok(())
        }
        Some(PollOutcome::Failed(report)) => {
            print_report(&report);
            bail!(
                "report failed: {}",
                report.error_message.as_deref().unwrap_or("unknown error")
            )
        }
        Some(PollOutcome::Transport(e)) => bail!("lost contact with research server: {e}"),
        Some(PollOutcome::TimedOut(elapsed)) => {
            bail!("gave up after {} seconds", elapsed.as_secs())
        }
        Some(PollOutcome::Cancelled) | None => {
            println!("cancelled");
            Ok(())
        }
    }
}

fn print_report(report: &Report) {
    println!("id:        {}", report.id);
    println!("topic:     {}", report.topic);
    println!("type:      {}", report.research_type);
    println!("status:    {} ({}%)", report.status, report.progress);
    println!("created:   {}", report.created_at);
    if let Some(result) = &report.result {
        println!("title:     {}", result.title);
        println!("words:     {}", result.word_count);
        println!();
        println!("{}", result.executive_summary);
    }
    if let Some(message) = &report.error_message {
        println!("error:     {message}");
    }
}
