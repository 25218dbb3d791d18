mod channel;
mod coordinator;
mod logger;
mod worker;

use clap::Parser;
use coordinator::{Coordinator, RunConfig};
use log::{LevelFilter, info};
use std::error::Error;
use std::io;
use std::process::ExitCode;
use std::time::Duration;
use tokio::signal;

/// Broadcast numbered messages to a pool of prime-counting listeners for a
/// fixed window, then shut them down by closing their channels.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Duration of the broadcast window in seconds
    #[arg(long, default_value_t = 15)]
    duration: u64,

    /// Number of listeners to create
    #[arg(long = "numListeners", visible_alias = "num-listeners", default_value_t = 8)]
    num_listeners: usize,

    /// Upper bound of each listener's prime search
    #[arg(
        long = "maxCheckForPrimes",
        visible_alias = "max-check-for-primes",
        default_value_t = 100_000,
        allow_negative_numbers = true
    )]
    max_check_for_primes: i64,

    /// Pause between broadcast passes, in milliseconds
    #[arg(long = "passIntervalMs", visible_alias = "pass-interval-ms", default_value_t = 100)]
    pass_interval_ms: u64,

    /// Delay after the last listener finishes, in milliseconds
    #[arg(long = "graceMs", visible_alias = "grace-ms", default_value_t = 1000)]
    grace_ms: u64,

    /// Diagnostic log level written to stderr
    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

impl From<&Args> for RunConfig {
    fn from(args: &Args) -> Self {
        Self {
            duration: Duration::from_secs(args.duration),
            num_listeners: args.num_listeners,
            max_check_for_primes: args.max_check_for_primes,
            pass_interval: Duration::from_millis(args.pass_interval_ms),
            grace: Duration::from_millis(args.grace_ms),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.log_level);

    match run(&args).await {
        Ok(_) => ExitCode::SUCCESS,
        // Output piped into something like `head` that stopped reading.
        Err(err) if is_broken_pipe(err.as_ref()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(2)
        }
    }
}

/// Whether any error in the `source` chain is a broken pipe.
fn is_broken_pipe(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(cause) = current {
        if let Some(ioerr) = cause.downcast_ref::<io::Error>() {
            if ioerr.kind() == io::ErrorKind::BrokenPipe {
                return true;
            }
        }
        current = cause.source();
    }
    false
}

async fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let coordinator = Coordinator::new(RunConfig::from(args));

    tokio::select! {
        res = coordinator.run() => {
            let summary = res?;
            info!(
                "Run finished: {} listeners, {} messages broadcast",
                summary.completions.len(),
                summary.broadcast.total()
            );
        }
        _ = signal::ctrl_c() => {
            println!("\nShutting down gracefully...");
        }
    }

    Ok(())
}
