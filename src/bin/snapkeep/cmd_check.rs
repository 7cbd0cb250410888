use anyhow::{anyhow, Result};

use crate::cli::StoreArgs;
use crate::util::open_manager;

/// Exits non-zero when any issue is found.
pub fn exec(store: StoreArgs, json: bool) -> Result<()> {
    let mgr = open_manager(&store)?;
    let report = mgr.check_integrity()?;

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("checked: {} snapshot(s)", report.checked);
        for issue in &report.issues {
            println!("  {}", issue);
        }
        if report.is_valid {
            println!("OK");
        }
    }
    if report.is_valid {
        Ok(())
    } else {
        Err(anyhow!("integrity check found {} issue(s)", report.issues.len()))
    }
}
