mod args;

use std::{process::ExitCode, sync::atomic::Ordering, time::Duration};

use air_quality::{
    forward::http::HttpSink,
    link::{
        LinkConfig,
        serial::{SerialConnector, list_ports},
    },
    pipeline::{Pipeline, PipelineConfig},
};
use anyhow::{Context as _, Result, anyhow};
use args::Args;
use clap::Parser as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    if args.list_ports {
        let ports = list_ports().context("failed to enumerate serial ports")?;
        for port in ports {
            println!("{}\t{:?}", port.port_name, port.port_type);
        }
        return Ok(());
    }

    let port = args.port.ok_or_else(|| anyhow!("no serial port given"))?;

    let sink = HttpSink::new(
        args.sink_url.as_str(),
        Duration::from_millis(args.forward_timeout_ms),
    )
    .context("failed to create sink")?;

    let connector = SerialConnector::new(port.as_str(), args.baud_rate)
        .with_read_timeout(Duration::from_millis(args.read_timeout_ms));

    let config = PipelineConfig {
        link: LinkConfig {
            connect_attempts: args.connect_attempts,
            retry_delay: Duration::from_millis(args.retry_delay_ms),
        },
        max_buffer_bytes: args.max_buffer_bytes,
        timezone: args.timezone,
    };

    let mut pipeline = Pipeline::new(connector, sink, config);

    let shutdown = pipeline.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current read");
            shutdown.store(true, Ordering::SeqCst);
        }
    });

    info!(
        port = port.as_str(),
        baud_rate = args.baud_rate,
        sink = args.sink_url.as_str(),
        "listening for <DATA> packets"
    );

    let stats = tokio::task::spawn_blocking(move || pipeline.run())
        .await
        .context("ingestion task panicked")?
        .with_context(|| format!("failed to ingest from {port}"))?;

    info!(
        packets = stats.packets,
        readings = stats.readings,
        forwarded = stats.forwarded,
        "done"
    );

    Ok(())
}
