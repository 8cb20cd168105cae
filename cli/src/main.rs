//! Boostly CLI: operator entry point for the student credit ledger.

mod commands;
mod config;
mod error;
mod roster;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use boostly_ledger::LedgerEngine;
use boostly_store_lmdb::LmdbStore;
use boostly_types::Timestamp;
use boostly_utils::LogFormat;

use crate::commands::{Commands, Output};
use crate::config::BoostlyConfig;
use crate::roster::Roster;

#[derive(Parser)]
#[command(name = "boostly", about = "Boostly student credit ledger", version)]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// flags and env vars override them.
    #[arg(long, env = "BOOSTLY_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for ledger storage.
    #[arg(long, env = "BOOSTLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[arg(long, env = "BOOSTLY_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "BOOSTLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Print command results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the effective configuration as TOML.
    Config,

    /// Create or update students from a roster file.
    Seed {
        #[arg(long)]
        roster: PathBuf,
    },

    /// Register one student with an opening account.
    Onboard {
        #[arg(long)]
        name: String,
        #[arg(long)]
        roll: String,
        #[arg(long)]
        email: Option<String>,
    },

    /// Change a student's display name.
    Rename {
        #[arg(long)]
        roll: String,
        #[arg(long)]
        name: String,
    },

    /// List every student.
    Students,

    /// Show a student's balances and activity counts.
    Stats {
        #[arg(long)]
        roll: String,
    },

    /// Send credits from one student to another.
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
        #[arg(long)]
        message: Option<String>,
    },

    /// Endorse another student.
    Endorse {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        recognition: Option<String>,
    },

    /// Redeem received credits for vouchers.
    Redeem {
        #[arg(long)]
        roll: String,
        #[arg(long, allow_negative_numbers = true)]
        vouchers: i64,
        #[arg(long, allow_negative_numbers = true)]
        credits_per_voucher: i64,
        /// Currency value per credit; defaults to `ledger.voucher_rate`.
        #[arg(long)]
        rate: Option<u64>,
    },

    /// Show transfers and voucher purchases, newest first.
    History {
        #[arg(long)]
        roll: String,
        /// Maximum voucher purchases to show.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a student's notification feed, newest first.
    Notifications {
        #[arg(long)]
        roll: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        unread: bool,
    },

    /// Mark one notification as read.
    MarkRead {
        #[arg(long)]
        id: String,
    },

    /// Change a student's monthly send limit for the current month.
    SetLimit {
        #[arg(long)]
        roll: String,
        #[arg(long, allow_negative_numbers = true)]
        limit: i64,
    },

    /// Open the current period, carrying balances forward. Applies to every
    /// student unless --roll is given.
    Rollover {
        #[arg(long)]
        roll: Option<String>,
        /// Period as YYYY-MM; must be the current month if given.
        #[arg(long)]
        period: Option<String>,
    },

    /// Check the ledger invariants across every student.
    Audit,
}

fn load_config(cli: &Cli) -> anyhow::Result<BoostlyConfig> {
    let mut config = match &cli.config {
        Some(path) => BoostlyConfig::from_toml_file(path)?,
        None => BoostlyConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    boostly_utils::init_logging(config.log_format, &config.log_level)?;

    let text = match &cli.command {
        Command::Config => config.to_toml_string()?,
        command => run(command, &config, cli.json)?,
    };
    println!("{}", text.trim_end());
    Ok(())
}

fn run(command: &Command, config: &BoostlyConfig, json: bool) -> anyhow::Result<String> {
    let store = LmdbStore::open(&config.data_dir, config.map_size_bytes())
        .with_context(|| format!("opening ledger at {}", config.data_dir.display()))?;
    let engine = LedgerEngine::new(store, config.ledger.clone());
    let output = if json { Output::Json } else { Output::Human };
    let cmd = Commands::new(&engine, output, Timestamp::now());

    let text = match command {
        Command::Config => config.to_toml_string()?,
        Command::Seed { roster: path } => {
            let entries = Roster::from_toml_file(path)?;
            let report = roster::seed(&engine, &entries)?;
            if json {
                serde_json::to_string_pretty(&report)?
            } else {
                format!(
                    "{} created, {} updated, {} skipped",
                    report.created, report.updated, report.skipped
                )
            }
        }
        Command::Onboard { name, roll, email } => cmd.onboard(name, roll, email.as_deref())?,
        Command::Rename { roll, name } => cmd.rename(roll, name)?,
        Command::Students => cmd.students()?,
        Command::Stats { roll } => cmd.stats(roll)?,
        Command::Send {
            from,
            to,
            amount,
            message,
        } => cmd.send(from, to, *amount, message.as_deref())?,
        Command::Endorse {
            from,
            to,
            recognition,
        } => cmd.endorse(from, to, recognition.as_deref())?,
        Command::Redeem {
            roll,
            vouchers,
            credits_per_voucher,
            rate,
        } => cmd.redeem(roll, *vouchers, *credits_per_voucher, *rate)?,
        Command::History { roll, limit } => cmd.history(roll, *limit)?,
        Command::Notifications {
            roll,
            limit,
            unread,
        } => cmd.notifications(roll, *limit, *unread)?,
        Command::MarkRead { id } => cmd.mark_read(id)?,
        Command::SetLimit { roll, limit } => cmd.set_limit(roll, *limit)?,
        Command::Rollover { roll, period } => cmd.rollover(roll.as_deref(), period.as_deref())?,
        Command::Audit => {
            let (text, clean) = cmd.audit()?;
            if !clean {
                println!("{text}");
                anyhow::bail!("ledger audit found invariant violations");
            }
            text
        }
    };
    Ok(text)
}
