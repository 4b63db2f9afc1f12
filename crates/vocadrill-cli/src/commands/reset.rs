use super::{CmdResult, Context};

/// Erase all learning state. The config file is left alone.
pub fn run(ctx: &Context) -> CmdResult {
    let db = ctx.open_db()?;
    if db.kv_delete(db.snapshot_key())? {
        println!("learning state erased");
    } else {
        println!("nothing to erase");
    }
    Ok(())
}
