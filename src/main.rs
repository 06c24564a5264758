use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::{error, info};

use stream_emitter::{
    Arg, Config, EmitterError, EmitterMediator, EventEmitter, LegacySource, ObservableEmitter,
    listener,
};

/// Command line arguments for the demo
#[derive(Parser, Debug)]
#[command(author, version, about = "Moves a classic emitter's listeners onto a stream mediator")]
struct Args {
    /// Number of tick events to emit after migration
    #[arg(short, long, default_value = "3")]
    ticks: usize,

    /// Attach a listener that always fails, to show fault reporting
    #[arg(short, long)]
    fail: bool,

    /// Override EMITTER_FAULT_POLICY (collect | fail-fast)
    #[arg(long)]
    fault_policy: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::try_from_env().context("failed to load emitter config")?;
    if let Some(policy) = &args.fault_policy {
        config.fault_policy = policy.parse().map_err(|e: String| anyhow!(e))?;
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .init();

    info!(
        error_event = %config.error_event,
        fault_policy = %config.fault_policy,
        source = %config.source,
        "Starting stream emitter demo"
    );

    // Listeners registered the old way, before the mediator exists
    let ticks_seen = Arc::new(AtomicUsize::new(0));
    let legacy = EventEmitter::with_config(&config);
    {
        let ticks_seen = Arc::clone(&ticks_seen);
        legacy.on(
            "tick",
            listener(move |payload| {
                let n = ticks_seen.fetch_add(1, Ordering::SeqCst) + 1;
                info!(count = n, ?payload, "tick");
                Ok(())
            }),
        )?;
    }
    legacy
        .on("data", listener(|payload| {
            info!(arity = payload.arity(), "data listener A");
            Ok(())
        }))?
        .on("data", listener(|payload| {
            info!(arity = payload.arity(), "data listener B");
            Ok(())
        }))?;
    if args.fail {
        legacy.on("data", listener(|_| Err(anyhow!("listener refused payload"))))?;
    }

    let mediator = Arc::new(EmitterMediator::with_config(config));
    let emitter = ObservableEmitter::new(Arc::clone(&mediator), Some(&legacy));
    let report = emitter.migration_report();
    info!(
        events = report.events_migrated,
        listeners = report.listeners_migrated,
        legacy_events_left = legacy.event_names().len(),
        "Migration finished"
    );

    for i in 0..args.ticks {
        emitter.emit("tick", vec![Arg::from(i as u64)])?;
    }

    match emitter.emit("data", vec![Arg::from("left"), Arg::from("right")]) {
        Ok(delivered) => info!(delivered, "data emitted"),
        Err(EmitterError::ListenerFault(faults)) => {
            for fault in &faults.faults {
                error!(event = %faults.event, %fault, "Listener fault");
            }
        }
        Err(err) => return Err(err.into()),
    }

    let delivered = emitter.emit("unheard", vec![])?;
    info!(delivered, "emit on an event nobody registered for");

    if let Err(err) = emitter.emit("error", vec![Arg::from("demo failure")]) {
        info!(%err, "error event surfaced as a fault");
    }

    info!(
        channels = mediator.channel_count(),
        ticks = ticks_seen.load(Ordering::SeqCst),
        "Demo finished"
    );
    Ok(())
}
