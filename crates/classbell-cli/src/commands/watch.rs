use clap::Args;
use classbell_core::{next_tick_delay, Clock, Event};
use tracing::info;

use super::CliResult;

#[derive(Args)]
pub struct WatchArgs {
    /// Never ring; only print state
    #[arg(long)]
    silent: bool,
    /// Also print a state snapshot every tick
    #[arg(long)]
    snapshots: bool,
    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,
}

fn emit(event: &Event) -> CliResult {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

pub fn run(args: WatchArgs) -> CliResult {
    let mut bell = super::bell()?;
    for event in bell.startup_events()? {
        emit(&event)?;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async {
        info!("bell running");
        let mut ticks = 0u64;
        loop {
            let outcome = bell.tick(!args.silent);
            for event in outcome.events() {
                let is_snapshot = matches!(event, Event::StateSnapshot { .. });
                if !is_snapshot || args.snapshots {
                    emit(&event)?;
                }
            }

            ticks += 1;
            if args.ticks.is_some_and(|limit| ticks >= limit) {
                break;
            }
            tokio::time::sleep(next_tick_delay(bell.clock().now())).await;
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
