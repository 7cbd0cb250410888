use anyhow::Result;
use std::path::PathBuf;

use crate::cli::StoreArgs;
use crate::util::open_manager;

pub fn exec(store: StoreArgs, file: PathBuf) -> Result<()> {
    let mgr = open_manager(&store)?;
    let entry = mgr.import_from_path(&file)?;
    println!(
        "IMPORTED {} as {} ({} B, \"{}\")",
        file.display(),
        entry.key,
        entry.size,
        entry.description
    );
    Ok(())
}
