mod cli;
mod commands;
mod config;

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::Parser;
use parking_lot::Mutex;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use ekslogs_aws::{ClusterApi, EksLogsClient};
use ekslogs_logs::{
    LogEntry, RetrievalRequest, Retriever, TailOptions, Tailer, combine_patterns, parse_time,
};
use ekslogs_output::{ColorMode, Printer};

use cli::{Cli, Command, LogsArgs, Settings, apply_preset};
use commands::PresetListing;
use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.logs.verbose) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Some(Command::Version) => {
            print!("{}", commands::version());
            Ok(())
        }
        Some(Command::Logtypes) => {
            print!("{}", commands::log_types());
            Ok(())
        }
        Some(Command::Presets { advanced, all }) => {
            let color = ColorMode::Auto.enabled(&io::stdout());
            print!(
                "{}",
                commands::presets(PresetListing::from_flags(advanced, all), color)
            );
            Ok(())
        }
        None => {
            let cancel = CancellationToken::new();
            tokio::spawn(cancel_on_shutdown(cancel.clone()));
            tokio::select! {
                result = run(cli.logs, &cancel) => result,
                _ = cancel.cancelled() => Ok(()),
            }
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr; RUST_LOG is honored, `-v` enables debug output
fn init_tracing(verbose: bool) -> Result<()> {
    let mut filter = EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into());
    if verbose {
        for directive in ["ekslogs=debug", "ekslogs_aws=debug", "ekslogs_logs=debug"] {
            filter = filter.add_directive(directive.parse()?);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
    Ok(())
}

/// Cancel the shared token on SIGINT or SIGTERM
async fn cancel_on_shutdown(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    debug!("shutdown signal received");
    cancel.cancel();
}

async fn run(args: LogsArgs, cancel: &CancellationToken) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    let settings = Settings::resolve(&args, &config);
    let Some(cluster_name) = args.cluster.clone() else {
        bail!("a cluster name is required");
    };

    let (includes, log_types, preset) =
        apply_preset(args.preset.as_deref(), args.include, args.log_types)?;
    if let Some(preset) = preset {
        debug!(
            preset = preset.name,
            pattern_type = %preset.pattern_type,
            "using preset"
        );
    }

    // Parse times before any network call so bad input fails fast
    let now = Utc::now();
    let start = parse_time(args.start_time.as_deref().unwrap_or_default(), now)
        .context("failed to parse start time")?;
    let end = parse_time(args.end_time.as_deref().unwrap_or_default(), now)
        .context("failed to parse end time")?;

    let client = EksLogsClient::new(settings.region.clone())
        .await
        .context("failed to create client")?;
    let requested_types = if log_types.is_empty() {
        "all".to_string()
    } else {
        log_types.join(", ")
    };
    debug!(
        cluster = %cluster_name,
        region = client.region(),
        log_types = %requested_types,
        "starting"
    );

    let cluster = match client
        .describe_cluster(&cluster_name)
        .await
        .context("failed to get cluster info")?
    {
        Some(cluster) => cluster,
        None => return Err(cluster_not_found(&client, &cluster_name).await),
    };
    debug!(
        status = %cluster.status,
        version = cluster.version.as_deref().unwrap_or("unknown"),
        enabled_log_types = ?cluster.enabled_log_types,
        "cluster found"
    );

    let pattern = combine_patterns(&includes, &args.exclude);
    let request = RetrievalRequest::new(cluster.name)
        .with_log_types(log_types)
        .with_filter_pattern(Some(pattern));

    let printer = Mutex::new(Printer::stdout(
        settings.output,
        settings.message_only,
        settings.color,
    ));
    let sink = |entry: LogEntry| {
        if let Err(e) = printer.lock().print(&entry) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                cancel.cancel();
            } else {
                warn!(error = %e, "failed to write log entry");
            }
        }
    };

    let retriever = Retriever::new(Arc::new(client));

    if args.follow {
        let options = TailOptions {
            interval: settings.interval,
            tick_limit: settings.tail_limit,
            ..Default::default()
        };
        Tailer::new(retriever, options)
            .run(&request, cancel, sink)
            .await?;
        return Ok(());
    }

    let request = request
        .with_window(start, end)
        .with_limit(args.limit.unwrap_or(0));
    retriever.retrieve(&request, cancel, sink).await?;
    Ok(())
}

/// Build the not-found error, suggesting the clusters that do exist
async fn cluster_not_found(client: &EksLogsClient, name: &str) -> anyhow::Error {
    match client.list_clusters().await {
        Ok(clusters) if !clusters.is_empty() => anyhow::anyhow!(
            "cluster '{}' not found. Available clusters: [{}]",
            name,
            clusters.join(", ")
        ),
        Ok(_) => anyhow::anyhow!("cluster '{}' not found", name),
        Err(e) => {
            debug!(error = %e, "failed to list clusters");
            anyhow::anyhow!("cluster '{}' not found", name)
        }
    }
}
