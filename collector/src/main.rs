use std::{future::Future, path::PathBuf};

use anyhow::{Context, Result};
use argh::FromArgs;
use log::{error, info};

use crate::config::Config;
use crate::influx::InfluxClient;
use crate::poller::Poller;
use crate::weather::WeatherClient;

mod config;
mod error;
mod influx;
mod poller;
#[cfg(test)]
mod testutil;
mod weather;

// One positional argument and no options of our own; argh only adds `--help`.
/// Samples the current weather at one location and writes it to InfluxDB.
#[derive(FromArgs)]
struct Args {
    /// path to the YAML config file
    #[argh(positional)]
    config: PathBuf,
}

// nothing here touches the network
fn startup(args: &Args) -> error::Result<(Config, WeatherClient, InfluxClient)> {
    let config = Config::load(&args.config)?;
    let source = WeatherClient::new(&config.source)?;
    let sink = InfluxClient::new(&config.sink)?;
    Ok((config, source, sink))
}

#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        info!("received {name}, terminating");
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("received ctrl-c, terminating");
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    let shutdown = shutdown_signal().context("installing signal handlers")?;

    let (config, source, sink) = match startup(&args) {
        Ok(parts) => parts,
        Err(err) => {
            error!("startup failed: kind={} error={}", err.kind(), err);
            std::process::exit(1);
        }
    };
    info!("initialized with config: {config}");

    Poller::new(source, sink, config.interval)
        .run(shutdown)
        .await;

    Ok(())
}
