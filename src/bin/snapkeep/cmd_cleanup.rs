use anyhow::Result;

use crate::cli::StoreArgs;
use crate::util::open_manager;

pub fn exec(store: StoreArgs) -> Result<()> {
    let mgr = open_manager(&store)?;
    let evicted = mgr.cleanup()?;
    for k in &evicted {
        println!("EVICTED {}", k);
    }
    println!("cleanup: {} snapshot(s) evicted", evicted.len());
    Ok(())
}
