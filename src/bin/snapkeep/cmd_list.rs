use anyhow::Result;

use snapkeep::util::{human_size, rfc3339_utc};
use snapkeep::Tier;

use crate::cli::StoreArgs;
use crate::util::open_manager;

pub fn exec(store: StoreArgs, tier: Option<Tier>, json: bool) -> Result<()> {
    let mgr = open_manager(&store)?;
    let entries = mgr.list_snapshots(tier)?;

    if json {
        println!("{}", serde_json::to_string(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("(no snapshots)");
        return Ok(());
    }
    for e in &entries {
        println!(
            "{:<44} {:<8} {}  {:>10}  {}",
            e.key,
            e.tier.as_str(),
            rfc3339_utc(e.timestamp),
            human_size(e.size),
            e.description
        );
    }
    Ok(())
}
