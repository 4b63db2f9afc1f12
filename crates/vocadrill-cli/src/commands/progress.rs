use serde::Serialize;
use vocadrill_core::now_ms;

use super::{print_json, CmdResult, Context};

const BAR_WIDTH: usize = 20;

#[derive(Serialize)]
struct CategoryProgress<'a> {
    id: &'a str,
    known: usize,
    total: usize,
    percent: u32,
}

#[derive(Serialize)]
struct Report<'a> {
    known: usize,
    total: usize,
    percent: u32,
    /// Items currently resting after mastery.
    resting: usize,
    categories: Vec<CategoryProgress<'a>>,
}

fn bar(percent: u32) -> String {
    let filled = (percent as usize * BAR_WIDTH / 100).min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

pub fn run(ctx: &Context, json: bool) -> CmdResult {
    let db = ctx.open_db()?;
    let ledger = ctx.load_ledger(&db)?;
    let now = now_ms();

    let overall = ledger.progress(&ctx.catalog);
    let report = Report {
        known: overall.known,
        total: overall.total,
        percent: overall.percent(),
        resting: ledger.iter().filter(|(_, r)| r.is_dormant(now)).count(),
        categories: ctx
            .catalog
            .categories
            .iter()
            .map(|c| {
                let p = ledger.category_progress(c);
                CategoryProgress {
                    id: &c.id,
                    known: p.known,
                    total: p.total,
                    percent: p.percent(),
                }
            })
            .collect(),
    };

    if json {
        return print_json(&report);
    }
    println!(
        "overall: {}/{} known ({}%), {} resting",
        report.known, report.total, report.percent, report.resting
    );
    let width = report.categories.iter().map(|c| c.id.len()).max().unwrap_or(0);
    for c in &report.categories {
        println!("  {:<width$}  [{}] {:>3}%", c.id, bar(c.percent), c.percent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_is_fixed_width() {
        assert_eq!(bar(0), ".".repeat(BAR_WIDTH));
        assert_eq!(bar(100), "#".repeat(BAR_WIDTH));
        assert_eq!(bar(50).chars().filter(|c| *c == '#').count(), BAR_WIDTH / 2);
    }
}
