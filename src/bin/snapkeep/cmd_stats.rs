use anyhow::Result;

use snapkeep::metrics;

use crate::cli::StoreArgs;
use crate::util::open_manager;

pub fn exec(store: StoreArgs, json: bool) -> Result<()> {
    let mgr = open_manager(&store)?;
    let stats = mgr.get_stats()?;

    if json {
        println!("{}", serde_json::to_string(&stats)?);
        return Ok(());
    }
    println!("store:       {}", store.path.display());
    println!("{}", stats);
    println!("config:      {}", mgr.config());

    let m = metrics::snapshot();
    if m.captures_total > 0 || m.evictions_total > 0 {
        println!(
            "session:     captures={} evictions={} avg={:.0} B",
            m.captures_total,
            m.evictions_total,
            m.avg_capture_bytes()
        );
    }
    Ok(())
}
