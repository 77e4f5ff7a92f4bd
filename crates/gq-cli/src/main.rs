use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "gq")]
#[command(about = "Rules-based backtest and walk-forward CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay one bar file through the engine and write run artifacts
    Backtest {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Rolling in-sample / out-of-sample evaluation over one bar file
    WalkForward {
        #[command(flatten)]
        run: RunArgs,

        /// Evaluate windows one at a time even if the config enables parallelism
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> profile -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Verify the hash chain of an audit JSONL file
    AuditVerify {
        /// Path to audit.jsonl
        path: String,
    },

    /// Rolling beta of one bar file's close returns against another's
    Beta {
        /// Asset bar CSV
        #[arg(long)]
        asset: String,

        /// Benchmark bar CSV
        #[arg(long)]
        benchmark: String,

        /// Rolling window, in returns
        #[arg(long, default_value_t = 60)]
        window: usize,
    },
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Layered config paths in merge order
    #[arg(long = "config", required = true)]
    pub config_paths: Vec<String>,

    /// Bar CSV file (ts,open,high,low,close[,volume])
    #[arg(long)]
    pub data: String,

    /// Root directory for exports/<run_id>/
    #[arg(long, default_value = "exports")]
    pub exports: String,

    /// Override execution.seed from the config
    #[arg(long)]
    pub seed: Option<u64>,

    /// What to do with config keys this mode never reads
    #[arg(long = "unused-keys", value_enum, default_value_t = UnusedKeys::Warn)]
    pub unused_keys: UnusedKeys,

    /// Skip the hash-chained audit trail
    #[arg(long = "no-audit", default_value_t = false)]
    pub no_audit: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum UnusedKeys {
    Warn,
    Fail,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Backtest { run } => commands::backtest::run_backtest(run),
        Commands::WalkForward { run, sequential } => {
            commands::walk_forward::run_walk_forward(run, sequential)
        }
        Commands::ConfigHash { paths } => {
            let loaded = gq_config::load_layered_yaml(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
            Ok(())
        }
        Commands::AuditVerify { path } => commands::audit_verify(&path),
        Commands::Beta {
            asset,
            benchmark,
            window,
        } => commands::beta(&asset, &benchmark, window),
    }
}

/// Logs go to stderr; stdout carries only `key=value` results.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
