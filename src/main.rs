//! # Paceline — Multi-Actor Action Scheduler
//!
//! Schedules engagement actions (like, comment, connect) across sender
//! accounts, under daily/weekly quotas, cross-sender cooldowns, work
//! hours, and human-paced delays.
//!
//! Usage:
//!   paceline sender add "Avery" avery@example.com
//!   paceline list create "Warm leads"
//!   paceline campaign create "Q3 outreach" --list 1 --sender 1 --kind like
//!   paceline run                     # Daemon: drive active campaigns

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use paceline_core::types::{ActionKind, SenderStatus};
use paceline_core::PacelineConfig;
use paceline_scheduler::{ActuatorSet, DryRunActuator, SchedulerRuntime, WeeklyPlanner};
use paceline_store::Store;

#[derive(Parser)]
#[command(name = "paceline", version, about = "Multi-actor action scheduler")]
struct Cli {
    /// Database path (defaults to ~/.paceline/paceline.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file path (defaults to ~/.paceline/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage sender accounts
    Sender {
        #[command(subcommand)]
        command: SenderCommand,
    },
    /// Manage target lists
    List {
        #[command(subcommand)]
        command: ListCommand,
    },
    /// Manage campaigns
    Campaign {
        #[command(subcommand)]
        command: CampaignCommand,
    },
    /// Preview the weekly budget plan for a sender
    Plan {
        sender: i64,
        #[arg(value_enum, default_value = "like")]
        kind: KindArg,
    },
    /// Tail the activity feed
    Activity {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Set an operator override (e.g. daily_like_limit, cooldown_hours)
    Set { key: String, value: String },
    /// Run the scheduler daemon, resuming active campaigns
    Run,
}

#[derive(Subcommand)]
enum SenderCommand {
    /// Register a sender account
    Add { name: String, account_ref: String },
    /// List senders with today's counters
    List,
    /// Set a sender's status (active, paused, disabled)
    Toggle { id: i64, status: String },
    /// Override per-kind caps for a sender
    Limits {
        id: i64,
        #[arg(value_enum)]
        kind: KindArg,
        #[arg(long)]
        daily: Option<u32>,
        #[arg(long)]
        weekly: Option<u32>,
    },
}

#[derive(Subcommand)]
enum ListCommand {
    /// Create a target list
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Add a target to a list (duplicate URLs are ignored)
    AddTarget { list: i64, name: String, url: String },
    /// Show a list's targets
    Show { list: i64 },
}

#[derive(Subcommand)]
enum CampaignCommand {
    /// Create a draft campaign over a list
    Create {
        name: String,
        #[arg(long)]
        list: i64,
        #[arg(long)]
        sender: i64,
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Per-item payload (e.g. comment text or connection note)
        #[arg(long)]
        note: Option<String>,
    },
    /// Start (or resume) a campaign
    Start { id: i64 },
    /// Pause an active campaign
    Pause { id: i64 },
    /// Cancel a campaign, skipping all remaining items
    Cancel { id: i64 },
    /// List campaigns
    List,
    /// Show one campaign and its queue
    Show { id: i64 },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum KindArg {
    Like,
    Comment,
    Connect,
}

impl From<KindArg> for ActionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Like => ActionKind::Like,
            KindArg::Comment => ActionKind::Comment,
            KindArg::Connect => ActionKind::Connect,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "paceline=debug" } else { "paceline=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => PacelineConfig::load_from(path)?,
        None => PacelineConfig::load()?,
    };
    let config = Arc::new(config);
    let db_path = cli.db.clone().unwrap_or_else(PacelineConfig::default_db_path);
    let store = Arc::new(Store::open(&db_path)?);

    let now = || paceline_core::clock::local_now(config.utc_offset_minutes);

    match cli.command {
        Command::Sender { command } => match command {
            SenderCommand::Add { name, account_ref } => {
                let id = store.add_sender(&name, &account_ref, now())?;
                println!("sender {id} created: {name}");
            }
            SenderCommand::List => {
                let today = paceline_core::clock::today_str(config.utc_offset_minutes);
                for sender in store.list_senders()? {
                    let counts = store.day_counts(&today, sender.id)?;
                    println!(
                        "{:>4}  {:<24} {:<10} today: {} likes, {} comments, {} connects",
                        sender.id,
                        sender.name,
                        sender.status,
                        counts.likes,
                        counts.comments,
                        counts.connects
                    );
                }
            }
            SenderCommand::Toggle { id, status } => {
                let status: SenderStatus = status.parse()?;
                store.set_sender_status(id, status)?;
                println!("sender {id} is now {status}");
            }
            SenderCommand::Limits { id, kind, daily, weekly } => {
                store.update_sender_limits(id, kind.into(), daily, weekly)?;
                println!("sender {id} limits updated");
            }
        },
        Command::List { command } => match command {
            ListCommand::Create { name, description } => {
                let id = store.create_list(&name, &description, now())?;
                println!("list {id} created: {name}");
            }
            ListCommand::AddTarget { list, name, url } => {
                store.add_target(list, &name, &url, now())?;
                println!("target added to list {list}");
            }
            ListCommand::Show { list } => {
                for target in store.list_targets(list)? {
                    let mut flags = Vec::new();
                    if target.is_liked {
                        flags.push("liked");
                    }
                    if target.is_commented {
                        flags.push("commented");
                    }
                    if target.is_connected {
                        flags.push("connected");
                    }
                    println!("{:>4}  {:<24} {}  [{}]", target.id, target.name, target.url, flags.join(", "));
                }
            }
        },
        Command::Campaign { command } => {
            let runtime = SchedulerRuntime::new(
                store.clone(),
                config.clone(),
                ActuatorSet::uniform(Arc::new(DryRunActuator)),
            );
            match command {
                CampaignCommand::Create { name, list, sender, kind, note } => {
                    let id = runtime
                        .lifecycle()
                        .create(&name, list, sender, kind.into(), note.as_deref())?;
                    println!("campaign {id} created (draft)");
                }
                CampaignCommand::Start { id } => {
                    runtime.start_campaign(id).await?;
                    println!("campaign {id} started");
                    runtime.wait_for(id).await;
                }
                CampaignCommand::Pause { id } => {
                    runtime.lifecycle().pause(id)?;
                    println!("campaign {id} paused");
                }
                CampaignCommand::Cancel { id } => {
                    let skipped = runtime.lifecycle().cancel(id)?;
                    println!("campaign {id} cancelled, {skipped} items skipped");
                }
                CampaignCommand::List => {
                    for c in store.list_campaigns()? {
                        println!(
                            "{:>4}  {:<24} {:<8} {:<10} {}/{} done ({} ok, {} failed, {} skipped)",
                            c.id, c.name, c.kind, c.status, c.processed, c.total, c.successful,
                            c.failed, c.skipped
                        );
                    }
                }
                CampaignCommand::Show { id } => {
                    let Some(c) = store.get_campaign(id)? else {
                        anyhow::bail!("no campaign with id {id}");
                    };
                    println!("{} — {} {} ({})", c.id, c.name, c.kind, c.status);
                    println!(
                        "  {}/{} processed: {} ok, {} failed, {} skipped",
                        c.processed, c.total, c.successful, c.failed, c.skipped
                    );
                    for item in store.items_for_campaign(id)? {
                        let detail = item.error_detail.as_deref().unwrap_or("");
                        println!("  {:>4}  {:<10} {:<24} {}", item.id, item.status, item.target_name, detail);
                    }
                }
            }
        }
        Command::Plan { sender, kind } => {
            let kind: ActionKind = kind.into();
            let limiter = paceline_scheduler::RateLimiter::new(store.clone(), config.clone());
            let decision = limiter.check(sender, kind)?;
            let planner = WeeklyPlanner::new(store.clone(), config.clone());
            let plan = planner.plan_week(sender, kind, decision.weekly_limit)?;
            println!(
                "weekly {kind} budget for sender {sender}: {} used of {}",
                decision.weekly_used, decision.weekly_limit
            );
            for (day, count) in plan {
                println!("  {day}  {count}");
            }
        }
        Command::Activity { limit } => {
            for entry in store.recent_activity(limit)? {
                println!(
                    "{}  {:<8} {:<10} {:<20} {} {}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    entry.kind,
                    entry.status,
                    entry.sender_name,
                    entry.target_url,
                    entry.detail
                );
            }
        }
        Command::Set { key, value } => {
            store.set_setting(&key, &value)?;
            println!("{key} = {value}");
        }
        Command::Run => {
            let runtime = SchedulerRuntime::new(
                store.clone(),
                config.clone(),
                ActuatorSet::uniform(Arc::new(DryRunActuator)),
            );
            let resumed = runtime.resume_active_campaigns().await?;
            println!("scheduler running, {resumed} campaigns resumed (ctrl-c to stop)");
            tokio::signal::ctrl_c().await?;
            println!("shutting down");
        }
    }

    Ok(())
}
