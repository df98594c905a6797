//! Catalog command: print the file listing of a resource, one record per line.

use anyhow::Result;
use xnat_core::{CurlSession, Transport};

pub async fn run_catalog(session: CurlSession, parent: &str) -> Result<()> {
    let parent = parent.to_string();
    let records = tokio::task::spawn_blocking(move || {
        let job = session.get(&parent)?;
        session.sync_fetch(job)
    })
    .await??;

    if records.is_empty() {
        println!("(empty catalog)");
        return Ok(());
    }
    for record in &records {
        let line: Vec<String> = record.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        println!("{}", line.join("  "));
    }
    Ok(())
}
