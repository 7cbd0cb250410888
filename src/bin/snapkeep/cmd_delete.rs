use anyhow::Result;

use crate::cli::StoreArgs;
use crate::util::open_manager;

pub fn exec(store: StoreArgs, key: String) -> Result<()> {
    let mgr = open_manager(&store)?;
    mgr.delete_snapshot(&key)?;
    println!("DELETED '{}'", key);
    Ok(())
}
