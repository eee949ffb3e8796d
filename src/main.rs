use std::time::{
    Duration,
    Instant,
};

use chrono::{
    DateTime,
    Utc,
};
use eyre::WrapErr;
use structopt::StructOpt as _;
use tokio::time::MissedTickBehavior;

use message::{
    ids,
    AckStatus,
    RebootCommand,
    RestartMode,
};
use runtime::{
    CorrelatorError,
    SerialSession,
};
use util::build;

pub use crate::options::{
    Command,
    Options,
};

mod options;
mod trace;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    util::bootstrap!(
        "starting {} {} ({}, built at {} with rustc {})",
        build::PACKAGE,
        build::VERSION,
        build::COMMIT_HASH,
        build::BUILD_TIMESTAMP,
        build::RUSTC_COMMIT_HASH,
    );

    let options = Options::from_args();

    trace::init();

    tracing::info!(
        application = build::PACKAGE,
        version = build::VERSION,
        build_commit = build::COMMIT_HASH,
        built_at = build::BUILD_TIMESTAMP,
        using_rustc = build::RUSTC_COMMIT_HASH,
        "tracing subsystem initialized"
    );

    let timeout = options.timeout();

    let mut session = runtime::connect_serial(&options.serial_port, options.baud)
        .wrap_err_with(|| format!("opening serial port {}", options.serial_port))?;

    match options.command {
        Command::QueryTime {
            interval_ms,
            settle_ms,
            count,
        } => {
            let interval = Duration::from_millis(interval_ms);
            let settle = Duration::from_millis(settle_ms);

            poll_time(&mut session, timeout, interval, settle, count).await
        },

        Command::Reboot {
            mode,
        } => reboot(&mut session, mode, timeout).await,
    }
}

/// Query the receiver once per `interval`. Timeouts and rejected queries are
/// logged and retried on the next tick; losing the port ends the loop.
#[tracing::instrument(skip(session), err)]
async fn poll_time(
    session: &mut SerialSession,
    timeout: Duration,
    interval: Duration,
    settle: Duration,
    count: Option<usize>,
) -> eyre::Result<()> {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut queries = 0;

    while count.map_or(true, |count| queries < count) {
        ticker.tick().await;
        queries += 1;

        session.settle(settle, interval).await.wrap_err("waiting for the line to settle")?;

        let start = Utc::now();
        let result = session.query_time(timeout).await;
        let end = Utc::now();

        match result {
            Ok(time) => {
                let (secs, nanos) = time.to_epoch();
                println!("start={} end={} gps={secs}.{nanos:09}", micros(start), micros(end));
            },
            Err(e) if e.is_fatal() => return Err(e).wrap_err("querying receiver time"),
            other => util::trace_catch!(other, "time query failed, retrying next interval"),
        }
    }

    Ok(())
}

/// Restart the receiver. Replies for other commands do not end the wait; the
/// whole exchange shares one `timeout`.
#[tracing::instrument(skip(session), err)]
async fn reboot(session: &mut SerialSession, mode: RestartMode, timeout: Duration) -> eyre::Result<()> {
    let deadline = Instant::now() + timeout;

    let command = RebootCommand::now(mode);
    println!("{}", hex::encode(command.to_frame().to_bytes()));

    let mut result = session.reboot(command, timeout).await;

    loop {
        let ack = match result {
            Ok(ack) => ack,
            Err(CorrelatorError::Mismatched {
                ..
            }) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                result = session.wait_for_ack(ids::SYSTEM_RESTART, remaining).await;
                continue;
            },
            Err(e) => return Err(e).wrap_err("restarting receiver"),
        };

        return match ack.status {
            AckStatus::Ack => {
                println!("ack");
                Ok(())
            },
            AckStatus::Nack => {
                println!("nack");
                Err(eyre::eyre!("receiver rejected {mode} restart"))
            },
        };
    }
}

#[inline]
fn micros(t: DateTime<Utc>) -> String {
    format!("{}.{:06}", t.timestamp(), t.timestamp_subsec_micros())
}
