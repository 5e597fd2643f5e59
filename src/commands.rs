//! Subcommand handlers for rangecron.

use std::sync::Arc;

use tracing::info;

use rangecron_config::Config;
use rangecron_core::{EndDateTimeMode, Invocation, RecurringJobRecord, encode_instant};
use rangecron_scheduler::{
    CancellationToken, RecurringJobManager, RecurringJobOptions, RecurringJobScheduler,
};
use rangecron_storage::{FileStorage, JobStorage};

use crate::cli::AddArgs;
use crate::factory::LoggingJobFactory;

async fn open_storage(config: &Config) -> Result<Arc<dyn JobStorage>, Box<dyn std::error::Error>> {
    let storage = FileStorage::new(&config.storage.path).await?;
    Ok(Arc::new(storage))
}

async fn manager(config: &Config) -> Result<RecurringJobManager, Box<dyn std::error::Error>> {
    let storage = open_storage(config).await?;
    Ok(
        RecurringJobManager::new(storage, Arc::new(LoggingJobFactory))
            .with_cron_format(config.scheduler.cron_format),
    )
}

/// Run the scheduler until Ctrl-C.
pub(crate) async fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting rangecron v{}", env!("CARGO_PKG_VERSION"));
    info!("Job store: {}", config.storage.path.display());

    let storage = open_storage(config).await?;
    let scheduler =
        RecurringJobScheduler::new(storage, Arc::new(LoggingJobFactory), config.scheduler.clone());

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down...");
        }
        shutdown.cancel();
    });

    scheduler.run(&cancel).await;
    Ok(())
}

/// Add or update a recurring job.
pub(crate) async fn add(config: &Config, args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let invocation = args
        .args
        .iter()
        .fold(Invocation::new(args.job_type, args.method), |invocation, arg| {
            invocation.with_arg(parse_arg(arg))
        });

    let mode = if args.end_date_only {
        EndDateTimeMode::DateOnly
    } else if args.end_exact {
        EndDateTimeMode::Exact
    } else {
        EndDateTimeMode::Default
    };

    let options = RecurringJobOptions {
        recurring_job_id: args.id,
        invocation: Some(invocation),
        cron_expression: args.cron,
        time_zone: args.time_zone,
        queue: args.queue,
        start: args.start,
        end: args.end,
        end_date_time_mode: mode,
    };

    manager(config).await?.add_or_update(&options).await?;
    println!("Recurring job '{}' saved.", options.recurring_job_id);
    Ok(())
}

/// Remove a recurring job.
pub(crate) async fn remove(config: &Config, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    manager(config).await?.remove_if_exists(id).await?;
    println!("Recurring job '{}' removed.", id);
    Ok(())
}

/// Trigger a recurring job now.
pub(crate) async fn trigger(config: &Config, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    match manager(config).await?.trigger(id).await? {
        Some(job_id) => println!("Recurring job '{}' triggered as job {}.", id, job_id),
        None => println!("Recurring job '{}' was not triggered.", id),
    }
    Ok(())
}

/// List registered recurring jobs.
pub(crate) async fn list(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let jobs = manager(config).await?.list().await?;
    if jobs.is_empty() {
        println!("No recurring jobs found.");
        return Ok(());
    }

    println!(
        "{:<20} {:<16} {:<20} {:<24} {}",
        "ID", "CRON", "TIME ZONE", "NEXT EXECUTION", "LAST EXECUTION"
    );
    println!("{}", "-".repeat(106));
    for (id, record) in jobs {
        println!("{}", format_row(&id, &record));
    }
    Ok(())
}

fn format_row(id: &str, record: &RecurringJobRecord) -> String {
    let instant = |value: Option<chrono::DateTime<chrono::Utc>>| {
        value.map(encode_instant).unwrap_or_else(|| "-".to_string())
    };
    format!(
        "{:<20} {:<16} {:<20} {:<24} {}",
        id,
        record.cron,
        record.time_zone_id.as_deref().unwrap_or("UTC"),
        instant(record.next_execution),
        instant(record.last_execution)
    )
}

/// JSON when it parses, otherwise the raw text.
fn parse_arg(arg: &str) -> serde_json::Value {
    serde_json::from_str(arg).unwrap_or_else(|_| serde_json::Value::String(arg.to_string()))
}
