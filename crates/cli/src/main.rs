//! SiteBatch CLI - Command-line client for the SiteBatch daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "sitebatch")]
#[command(about = "SiteBatch bulk website creation CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "SITEBATCH_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a pending job from a batch file (JSON)
    Create {
        /// Path to the batch specification
        #[arg(short, long)]
        file: PathBuf,

        /// Start the job right after creating it
        #[arg(long)]
        start: bool,
    },

    /// Start a pending job
    Start { job_id: String },

    /// Pause a running job
    Pause { job_id: String },

    /// Resume a paused job
    Resume { job_id: String },

    /// Cancel and remove a job
    Cancel { job_id: String },

    /// Show one job in detail
    Status {
        job_id: String,

        /// Also list created sites and failed items
        #[arg(short, long)]
        verbose: bool,
    },

    /// List jobs
    List {
        /// Only jobs in this state (pending, running, paused, completed, failed)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Estimate how long a batch takes under a scheduling mode
    Estimate {
        /// Number of websites
        #[arg(short, long)]
        total: u64,

        #[arg(short, long, value_enum, default_value_t = Mode::Immediate)]
        mode: Mode,

        /// per-interval: websites per interval
        #[arg(long)]
        items_per_interval: Option<u32>,

        /// per-interval: days between intervals
        #[arg(long)]
        interval_days: Option<u32>,

        /// distribute-over: total days
        #[arg(long)]
        total_days: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Immediate,
    PerInterval,
    DistributeOver,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// Job as returned by the daemon
#[derive(Deserialize)]
struct JobSummary {
    job_id: String,
    name: String,
    status: String,
    scheduling: String,
    completed: usize,
    failed: usize,
    total: usize,
    percent: f64,
    current_item: Option<String>,
    created_at: i64,
}

#[derive(Tabled)]
struct JobRow {
    id: String,
    name: String,
    status: String,
    scheduling: String,
    progress: String,
    created: String,
}

impl From<&JobSummary> for JobRow {
    fn from(job: &JobSummary) -> Self {
        Self {
            id: job.job_id.clone(),
            name: job.name.clone(),
            status: job.status.clone(),
            scheduling: job.scheduling.clone(),
            progress: progress_text(job),
            created: format_timestamp(job.created_at),
        }
    }
}

#[derive(Deserialize)]
struct JobDetail {
    #[serde(flatten)]
    summary: JobSummary,
    category: String,
    error: Option<String>,
    artifacts: Vec<ArtifactRow>,
    failures: Vec<FailureRow>,
}

#[derive(Deserialize, Tabled)]
struct ArtifactRow {
    keyword: String,
    domain: String,
    url: String,
    template_name: String,
}

#[derive(Deserialize, Tabled)]
struct FailureRow {
    keyword: String,
    attempts: u32,
    reason: String,
}

#[derive(Deserialize)]
struct EstimateResult {
    days: u64,
    completion_date: i64,
    items_per_period: u64,
    period_days: u64,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

async fn call_job(url: &str, method: &str, job_id: &str) -> Result<JobSummary> {
    let result = call_rpc(url, method, json!({ "job_id": job_id })).await?;
    serde_json::from_value(result).context("Unexpected job payload")
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn progress_text(job: &JobSummary) -> String {
    let mut text = format!("{}/{} ({:.0}%)", job.completed, job.total, job.percent);
    if job.failed > 0 {
        text.push_str(&format!(", {} failed", job.failed));
    }
    text
}

fn colored_status(status: &str) -> colored::ColoredString {
    match status {
        "running" => status.cyan(),
        "paused" => status.yellow(),
        "completed" => status.green(),
        "failed" => status.red(),
        _ => status.normal(),
    }
}

/// Scheduling policy JSON for the chosen mode
fn scheduling_params(
    mode: Mode,
    items_per_interval: Option<u32>,
    interval_days: Option<u32>,
    total_days: Option<u32>,
) -> Result<serde_json::Value> {
    let policy = match mode {
        Mode::Immediate => json!({ "mode": "immediate" }),
        Mode::PerInterval => json!({
            "mode": "per_interval",
            "items_per_interval": items_per_interval
                .context("--items-per-interval is required for per-interval")?,
            "interval_days": interval_days
                .context("--interval-days is required for per-interval")?,
        }),
        Mode::DistributeOver => json!({
            "mode": "distribute_over",
            "total_days": total_days.context("--total-days is required for distribute-over")?,
        }),
    };
    Ok(policy)
}

fn print_job(message: &str, job: &JobSummary) {
    println!("{}", message.green().bold());
    println!();
    println!("  {} {}", "Job:".bold(), job.job_id);
    println!("  {} {}", "Name:".bold(), job.name);
    println!("  {} {}", "Status:".bold(), colored_status(&job.status));
    println!("  {} {}", "Progress:".bold(), progress_text(job));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Create { file, start } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Cannot read {}", file.display()))?;
            let spec: serde_json::Value =
                serde_json::from_str(&raw).context("Invalid JSON batch file")?;

            let result = call_rpc(&cli.rpc_url, "jobs.create.v1", json!({ "spec": spec })).await?;
            let job: JobSummary = serde_json::from_value(result)?;
            print_job("✓ Job created", &job);

            if start {
                let job = call_job(&cli.rpc_url, "jobs.start.v1", &job.job_id).await?;
                println!();
                print_job("✓ Job started", &job);
            }
        }

        Commands::Start { job_id } => {
            let job = call_job(&cli.rpc_url, "jobs.start.v1", &job_id).await?;
            print_job("✓ Job started", &job);
        }

        Commands::Pause { job_id } => {
            let job = call_job(&cli.rpc_url, "jobs.pause.v1", &job_id).await?;
            print_job("✓ Job paused", &job);
        }

        Commands::Resume { job_id } => {
            let job = call_job(&cli.rpc_url, "jobs.resume.v1", &job_id).await?;
            print_job("✓ Job resumed", &job);
        }

        Commands::Cancel { job_id } => {
            let result = call_rpc(&cli.rpc_url, "jobs.cancel.v1", json!({ "job_id": job_id })).await?;

            if result["cancelled"].as_bool().unwrap_or(false) {
                println!("{}", format!("✓ Job {} cancelled", job_id).green().bold());
            } else {
                println!("{}", format!("○ No job {}", job_id).yellow());
            }
        }

        Commands::Status { job_id, verbose } => {
            let result = call_rpc(&cli.rpc_url, "jobs.get.v1", json!({ "job_id": job_id })).await?;
            let detail: JobDetail = serde_json::from_value(result)?;
            let job = &detail.summary;

            println!("{}", format!("Job {}", job.job_id).cyan().bold());
            println!();
            println!("  {} {}", "Name:".bold(), job.name);
            if !detail.category.is_empty() {
                println!("  {} {}", "Category:".bold(), detail.category);
            }
            println!("  {} {}", "Status:".bold(), colored_status(&job.status));
            println!("  {} {}", "Scheduling:".bold(), job.scheduling);
            println!("  {} {}", "Progress:".bold(), progress_text(job));
            if let Some(current) = &job.current_item {
                println!("  {} {}", "Current:".bold(), current);
            }
            println!("  {} {}", "Created:".bold(), format_timestamp(job.created_at));
            if let Some(error) = &detail.error {
                println!("  {} {}", "Error:".bold(), error.red());
            }

            if verbose {
                if !detail.artifacts.is_empty() {
                    println!();
                    println!("{}", Table::new(&detail.artifacts));
                }
                if !detail.failures.is_empty() {
                    println!();
                    println!("{}", Table::new(&detail.failures));
                }
            }
        }

        Commands::List { status } => {
            let params = match status {
                Some(status) => json!({ "status": status }),
                None => json!({}),
            };
            let result = call_rpc(&cli.rpc_url, "jobs.list.v1", params).await?;
            let jobs: Vec<JobSummary> = serde_json::from_value(result["jobs"].clone())?;

            if jobs.is_empty() {
                println!("{}", "No jobs".yellow());
            } else {
                let rows: Vec<JobRow> = jobs.iter().map(JobRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Estimate {
            total,
            mode,
            items_per_interval,
            interval_days,
            total_days,
        } => {
            let scheduling = scheduling_params(mode, items_per_interval, interval_days, total_days)?;
            let params = json!({ "total_items": total, "scheduling": scheduling });

            let result = call_rpc(&cli.rpc_url, "schedule.estimate.v1", params).await?;
            let estimate: EstimateResult = serde_json::from_value(result)?;

            println!("{}", "Schedule estimate".cyan().bold());
            println!();
            println!("  {} {}", "Websites:".bold(), total);
            println!(
                "  {} {} per {} day(s)",
                "Release rate:".bold(),
                estimate.items_per_period,
                estimate.period_days
            );
            println!("  {} {}", "Days:".bold(), estimate.days);
            println!(
                "  {} {}",
                "Completion:".bold(),
                format_timestamp(estimate.completion_date)
            );
        }
    }

    Ok(())
}
