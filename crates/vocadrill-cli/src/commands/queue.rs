use chrono::{DateTime, Local};
use serde::Serialize;
use vocadrill_core::{now_ms, scheduler, SessionError};

use super::{print_json, CmdResult, Context};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueRow<'a> {
    position: usize,
    token: &'a str,
    display_text: &'a str,
    priority: f64,
    score: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RestingRow<'a> {
    token: &'a str,
    dormant_until: i64,
}

#[derive(Serialize)]
struct Preview<'a> {
    category: &'a str,
    queue: Vec<QueueRow<'a>>,
    resting: Vec<RestingRow<'a>>,
}

fn local_time(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Show the order the next `drill` would use. Nothing is saved.
pub fn run(ctx: &Context, category_id: &str, json: bool) -> CmdResult {
    let category = ctx
        .catalog
        .category(category_id)
        .ok_or_else(|| SessionError::UnknownCategory(category_id.to_string()))?;
    let db = ctx.open_db()?;
    let mut ledger = ctx.load_ledger(&db)?;
    let now = now_ms();

    let queue = scheduler::build_queue(&category.items, &mut ledger, now);
    let rows: Vec<QueueRow> = queue
        .entries()
        .iter()
        .enumerate()
        .map(|(position, entry)| QueueRow {
            position,
            token: &entry.item.token,
            display_text: &entry.item.display_text,
            priority: entry.priority,
            score: ledger.get_record(&entry.item.key()).score,
        })
        .collect();
    let resting: Vec<RestingRow> = category
        .items
        .iter()
        .filter_map(|item| {
            let record = ledger.get_record(&item.key());
            record.is_dormant(now).then_some(RestingRow {
                token: &item.token,
                dormant_until: record.dormant_until,
            })
        })
        .collect();

    if json {
        return print_json(&Preview {
            category: &category.id,
            queue: rows,
            resting,
        });
    }

    if rows.is_empty() {
        println!("nothing due in {}", category.id);
    }
    for row in &rows {
        println!(
            "{:>3}  {:>6.2}  score {}  {}",
            row.position + 1,
            row.priority,
            row.score,
            row.token
        );
    }
    if !resting.is_empty() {
        println!("resting:");
        for row in &resting {
            println!("     {} until {}", row.token, local_time(row.dormant_until));
        }
    }
    Ok(())
}
