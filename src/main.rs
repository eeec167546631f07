use chrono::Utc;
use clap::Parser;
use mimalloc::MiMalloc;
use slotbot::cli::{Cli, Commands, CronCommand, SessionsCommand, UserFilter};
use slotbot::config::Config;
use slotbot::cron::{CronTable, FileCrontab, SystemCrontab};
use slotbot::db::Store;
use slotbot::engine::{BulkSummary, RunMode, RunReport};
use slotbot::notify::{Notifier, TracingNotifier, WebhookNotifier};
use slotbot::providers::ChainRegistry;
use slotbot::types::ChainId;
use slotbot::utils::init_tracing;
use slotbot::Engine;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = Arc::new(Config::load()?);
    init_tracing(&cfg.basic.loglevel);
    info!(
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        cron_prefix = %cfg.cron.prefix,
        cron_timezone = %cfg.cron.timezone.map(|tz| tz.name().to_string()).unwrap_or_else(|| "<local>".to_string()),
        webhook = %cfg.notify.webhook_url.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        "Configuration loaded"
    );

    let store: Arc<dyn Store> = Arc::new(slotbot::db::spawn(&cfg.basic.database_url).await?);
    let chains = ChainRegistry::from_config(&cfg)?;

    let notifier: Arc<dyn Notifier> = match cfg.notify.webhook_url.clone() {
        Some(url) => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()?;
            Arc::new(WebhookNotifier::new(client, url))
        }
        None => Arc::new(TracingNotifier),
    };
    let crontab: Arc<dyn CronTable> = match cfg.cron.crontab_path.clone() {
        Some(path) => Arc::new(FileCrontab::new(path)),
        None => Arc::new(SystemCrontab),
    };

    let engine = Engine::new(cfg, chains, store, notifier, crontab);
    let now = Utc::now();

    match cli.command {
        Commands::Book {
            chain,
            user,
            booking_id,
            check,
        } => {
            let mode = if check { RunMode::Precheck } else { RunMode::Book };
            let report = engine
                .run_booking(&ChainId::new(chain), user, booking_id, mode, now)
                .await?;
            Ok(exit_for(&report))
        }
        Commands::Cancel {
            chain,
            user,
            class_id,
        } => {
            let report = engine
                .cancel_class(&ChainId::new(chain), user, &class_id, now)
                .await?;
            Ok(exit_for(&report))
        }
        Commands::Sessions {
            command: SessionsCommand::Pull { filter },
        } => {
            let (chain, user) = split(filter);
            let summary = engine.pull_sessions(chain, user, now).await?;
            Ok(exit_for_bulk(&summary))
        }
        Commands::Cron {
            command: CronCommand::Refresh { filter },
        } => {
            let (chain, user) = split(filter);
            let summary = engine.refresh_cron(chain, user, now).await?;
            Ok(exit_for_bulk(&summary))
        }
        Commands::Remind => {
            engine.remind(now).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn split(filter: UserFilter) -> (Option<ChainId>, Option<i64>) {
    (filter.chain.map(ChainId::new), filter.user)
}

fn exit_for(report: &RunReport) -> ExitCode {
    let class_id = report.class.as_ref().map(|c| c.id.as_str()).unwrap_or("-");
    if report.state.is_failed() {
        error!(state = %report.state, class_id, error = report.error.as_deref().unwrap_or("-"), "Run failed");
        ExitCode::FAILURE
    } else {
        info!(state = %report.state, class_id, "Run finished");
        ExitCode::SUCCESS
    }
}

fn exit_for_bulk(summary: &BulkSummary) -> ExitCode {
    if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
