use std::{future::Future, time::Duration};

use common::{Conditions, Measurement};
use log::{debug, error, info};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::{Error, Result};

/// Where conditions come from, once per cycle.
#[allow(async_fn_in_trait)]
pub trait Source {
    async fn fetch(&self) -> Result<Conditions>;
}

/// Where measurements go, once per successful fetch.
#[allow(async_fn_in_trait)]
pub trait Sink {
    async fn write(&self, mes: &Measurement) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Working,
    Terminated,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub ticks: u64,
    pub written: u64,
    pub failed: u64,
}

/// Drives fetch + write cycles on a fixed period until shut down.
///
/// The first tick fires one `interval` after `run` starts. A cycle that overruns the
/// interval is followed immediately by one catch-up cycle, further missed ticks are dropped.
/// Shutdown is only observed between cycles, so an in-flight write always completes.
pub struct Poller<S, K> {
    source: S,
    sink: K,
    interval: Duration,
    state: State,
    stats: Stats,
}

impl<S: Source, K: Sink> Poller<S, K> {
    pub fn new(source: S, sink: K, interval: Duration) -> Self {
        Self {
            source,
            sink,
            interval,
            state: State::Idle,
            stats: Stats::default(),
        }
    }

    pub async fn run<F: Future<Output = ()>>(mut self, shutdown: F) -> Stats {
        tokio::pin!(shutdown);

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.state != State::Terminated {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    self.transition(State::Terminated);
                }
                _ = ticker.tick() => {
                    self.transition(State::Working);
                    if let Err(err) = self.cycle().await {
                        error!("{}", failure_line(&err));
                    }
                    self.transition(State::Idle);
                }
            }
        }

        info!(
            "poller stopped: ticks={} written={} failed={}",
            self.stats.ticks, self.stats.written, self.stats.failed
        );
        self.stats
    }

    fn transition(&mut self, to: State) {
        debug!("poller {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    async fn cycle(&mut self) -> Result<()> {
        self.stats.ticks += 1;
        let res = self.fetch_and_write().await;
        match res {
            Ok(()) => self.stats.written += 1,
            Err(_) => self.stats.failed += 1,
        }
        res
    }

    async fn fetch_and_write(&self) -> Result<()> {
        let conditions = self.source.fetch().await?;
        let mes = Measurement::observed_now(conditions);
        self.sink.write(&mes).await
    }
}

/// Log line for a failed cycle.
pub fn failure_line(err: &Error) -> String {
    format!("cycle failed: kind={} error={}", err.kind(), err)
}
