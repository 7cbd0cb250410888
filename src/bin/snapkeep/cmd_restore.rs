use anyhow::Result;

use crate::cli::StoreArgs;
use crate::util::{open_manager, state_path};

pub fn exec(store: StoreArgs, key: String) -> Result<()> {
    let mgr = open_manager(&store)?;
    mgr.restore_snapshot(&key)?;
    println!("RESTORED '{}' into {}", key, state_path(&store).display());
    Ok(())
}
