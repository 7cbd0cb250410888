use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use crate::cli::StoreArgs;
use crate::util::open_manager;

pub fn exec(store: StoreArgs, key: String, out: Option<PathBuf>) -> Result<()> {
    let mgr = open_manager(&store)?;

    if out.as_deref().map(|p| p.as_os_str() == "-").unwrap_or(false) {
        let bytes = mgr.export_snapshot(&key)?;
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes).context("write stdout")?;
        stdout.flush().context("flush stdout")?;
        return Ok(());
    }

    let dest = out.unwrap_or_else(|| PathBuf::from("."));
    let written = mgr.export_to_path(&key, &dest)?;
    println!("EXPORTED '{}' -> {}", key, written.display());
    Ok(())
}
