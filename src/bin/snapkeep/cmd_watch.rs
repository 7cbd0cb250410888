use anyhow::Result;
use log::info;
use std::io::Read;
use std::time::Duration;

use crate::cli::StoreArgs;
use crate::util::open_manager;

pub fn exec(store: StoreArgs, seconds: u64) -> Result<()> {
    let mgr = open_manager(&store)?;
    mgr.init()?;
    info!("watch: {}", mgr.config());

    if seconds > 0 {
        std::thread::sleep(Duration::from_secs(seconds));
    } else {
        // block until stdin reaches EOF
        let mut sink = Vec::new();
        let _ = std::io::stdin().read_to_end(&mut sink);
    }

    mgr.shutdown();
    let stats = mgr.get_stats()?;
    println!("{}", stats);
    Ok(())
}
