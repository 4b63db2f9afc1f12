use std::path::Path;

use super::{CmdResult, Context};

/// Merge a snapshot file (browser export or a previous `vocadrill` snapshot)
/// into the stored learning state. Newer records win.
pub fn run(ctx: &Context, file: &Path) -> CmdResult {
    let raw = std::fs::read_to_string(file)?;

    let db = ctx.open_db()?;
    let mut ledger = ctx.load_ledger(&db)?;
    let merged = ledger.import_legacy(&raw)?;
    ledger.save(&db)?;

    tracing::info!(file = %file.display(), merged, "snapshot imported");
    println!("imported {merged} records");
    Ok(())
}
