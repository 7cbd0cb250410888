use anyhow::Result;

use snapkeep::{CaptureOutcome, Tier};

use crate::cli::StoreArgs;
use crate::util::open_manager;

pub fn exec(store: StoreArgs, description: String) -> Result<()> {
    let mgr = open_manager(&store)?;
    report(mgr.create_manual_snapshot(&description)?);
    Ok(())
}

pub fn exec_tier(store: StoreArgs, tier: Tier) -> Result<()> {
    let mgr = open_manager(&store)?;
    report(mgr.capture(tier)?);
    Ok(())
}

fn report(outcome: CaptureOutcome) {
    match outcome {
        CaptureOutcome::Captured(e) => println!("CREATED {} ({} B)", e.key, e.size),
        CaptureOutcome::NoActiveProject => println!("SKIPPED: no active project"),
    }
}
