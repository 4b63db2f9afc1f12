use serde::Serialize;

use super::{print_json, CmdResult, Context};

#[derive(Serialize)]
struct CategoryRow<'a> {
    id: &'a str,
    name: &'a str,
    known: usize,
    total: usize,
}

pub fn run(ctx: &Context, json: bool) -> CmdResult {
    let db = ctx.open_db()?;
    let ledger = ctx.load_ledger(&db)?;

    let rows: Vec<CategoryRow> = ctx
        .catalog
        .categories
        .iter()
        .map(|c| {
            let progress = ledger.category_progress(c);
            CategoryRow {
                id: &c.id,
                name: &c.name,
                known: progress.known,
                total: progress.total,
            }
        })
        .collect();

    if json {
        return print_json(&rows);
    }
    let width = rows.iter().map(|r| r.id.len()).max().unwrap_or(0);
    for row in &rows {
        println!(
            "{:<width$}  {:>3}/{:<3}  {}",
            row.id, row.known, row.total, row.name
        );
    }
    Ok(())
}
