use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

use loopkit::{
    CancelGroup, CancellationToken, Exit, FailurePolicy, LoopBuilder, LoopConfig, LoopHandle, LoopReport, hyper,
    sleepy_at, sleepy_reinterrupt_at,
};

mod cli;

use cli::Cli;
use cli::commands::{Commands, Strategy};

fn setup_logging(config: &LoopConfig) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loopkit")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("loopkit.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Unit of work for the demos: counts calls, optionally failing on one of them.
///
/// The count is published through `seen` so a terminator can read it.
fn counter(seen: Arc<AtomicU64>, fail_on: Option<u64>) -> impl FnMut() -> std::result::Result<u64, String> + Send + 'static {
    move || {
        let n = seen.load(Ordering::SeqCst) + 1;
        if Some(n) == fail_on {
            return Err(format!("counter refused to reach {}", n));
        }
        seen.store(n, Ordering::SeqCst);
        Ok(n)
    }
}

/// Cancel `token` on Ctrl-C, or after `after` if given.
fn spawn_canceller(token: CancellationToken, after: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let deadline = async {
            match after {
                Some(after) => tokio::time::sleep(after).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Ctrl-C received, cancelling loop"),
            _ = deadline => info!("Cancel deadline reached"),
        }
        token.signal();
    })
}

/// Run a handle on a blocking worker, the host for the loop.
async fn host(handle: LoopHandle<u64>, token: CancellationToken) -> Result<LoopReport<u64>> {
    let report = tokio::task::spawn_blocking(move || handle.run(&token))
        .await
        .context("Loop worker panicked")??;
    Ok(report)
}

fn print_report(name: &str, report: &LoopReport<u64>) {
    let exit = match &report.exit {
        Exit::Terminated => report.exit.to_string().green(),
        Exit::Cancelled => report.exit.to_string().yellow(),
        Exit::Failed(_) => report.exit.to_string().red(),
    };
    println!(
        "{:<12} {} value={} iterations={} elapsed={}ms",
        name.cyan(),
        exit,
        report.value,
        report.iterations,
        report.elapsed.as_millis()
    );
}

#[allow(clippy::too_many_arguments)]
async fn handle_run_command(
    strategy: Strategy,
    timeout_ms: Option<u64>,
    until: Option<u64>,
    interval_ms: Option<u64>,
    cancel_after_ms: Option<u64>,
    fail_on: Option<u64>,
    propagate: bool,
    json: bool,
    config: &LoopConfig,
) -> Result<()> {
    info!("Running {:?} counter loop", strategy);

    let seen = Arc::new(AtomicU64::new(0));
    let mut builder = LoopBuilder::new(counter(Arc::clone(&seen), fail_on)).with_config(config);

    builder = match (strategy, interval_ms.map(Duration::from_millis)) {
        (Strategy::Busy, _) => builder.busy(),
        (Strategy::Throttled, Some(interval)) => builder.throttled_at(interval),
        (Strategy::Throttled, None) => builder.throttled(),
        (Strategy::Reinterrupt, Some(interval)) => builder.throttled_reinterrupt_at(interval),
        (Strategy::Reinterrupt, None) => builder.throttled_reinterrupt(),
    };
    if let Some(limit) = until {
        builder = builder.until(move || seen.load(Ordering::SeqCst) >= limit);
    }
    if let Some(timeout_ms) = timeout_ms {
        builder = builder.timeout(Duration::from_millis(timeout_ms));
    }
    if propagate {
        builder = builder.failure_policy(FailurePolicy::Propagate);
    }

    let token = CancellationToken::new();
    let canceller = spawn_canceller(token.clone(), cancel_after_ms.map(Duration::from_millis));
    let result = host(builder.build(), token).await;
    canceller.abort();

    let report = result?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to encode report")?);
    } else {
        print_report("counter", &report);
    }
    Ok(())
}

async fn handle_group_command(after_ms: u64, interval_ms: u64, threshold: u64) -> Result<()> {
    info!("Running group demo, cancelling after {}ms", after_ms);
    println!("{}", "Starting one counter per strategy...".cyan());

    let group = Arc::new(CancelGroup::new());
    let interval = Duration::from_millis(interval_ms);
    let horizon = interval * 20;

    let busy_seen = Arc::new(AtomicU64::new(0));
    let busy_count = Arc::clone(&busy_seen);
    let busy = hyper(counter(busy_seen, None))
        .until(move || busy_count.load(Ordering::SeqCst) >= threshold)
        .build();

    let throttled = sleepy_at(counter(Arc::new(AtomicU64::new(0)), None), interval)
        .timeout(horizon)
        .build();

    let reinterrupt = sleepy_reinterrupt_at(counter(Arc::new(AtomicU64::new(0)), None), interval)
        .timeout(horizon)
        .build();

    let cancel_all = Arc::clone(&group);
    let canceller = sleepy_at(counter(Arc::new(AtomicU64::new(0)), None), interval / 2)
        .timeout(Duration::from_millis(after_ms))
        .on_finish(move || {
            info!("Canceller finished, stopping every counter");
            cancel_all.cancel_all();
        })
        .build();

    let runs = vec![
        ("busy", tokio::spawn(host(busy, group.token()))),
        ("throttled", tokio::spawn(host(throttled, group.token()))),
        ("reinterrupt", tokio::spawn(host(reinterrupt, group.token()))),
        ("canceller", tokio::spawn(host(canceller, CancellationToken::new()))),
    ];

    for (name, run) in runs {
        let report = run.await.context("Host task panicked")??;
        print_report(name, &report);
    }
    Ok(())
}

async fn run_application(cli: Cli, config: &LoopConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match cli.command {
        Commands::Run {
            strategy,
            timeout_ms,
            until,
            interval_ms,
            cancel_after_ms,
            fail_on,
            propagate,
            json,
        } => {
            handle_run_command(
                strategy,
                timeout_ms,
                until,
                interval_ms,
                cancel_after_ms,
                fail_on,
                propagate,
                json,
                config,
            )
            .await
        }
        Commands::Group {
            after_ms,
            interval_ms,
            threshold,
        } => handle_group_command(after_ms, interval_ms, threshold).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before the logger exists, so its own log lines are dropped
    let config = LoopConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(cli, &config).await.context("Application failed")?;

    Ok(())
}
