//! Interactive drill on stdin.
//!
//! Each item shows its token first. Enter reveals the translation. After
//! that, Enter, `y` or the right arrow means recalled; `n` or the left arrow
//! means forgotten. `q` or end of input leaves the session; progress made so
//! far is kept.

use std::io::{self, BufRead, Write};

use vocadrill_core::{now_ms, Event, Item, Outcome, SessionObserver, SessionRunner};

use super::{CmdResult, Context};

const ARROW_RIGHT: &str = "\x1b[C";
const ARROW_LEFT: &str = "\x1b[D";

/// Prints session callbacks for a human. Silent in `--json` mode, where the
/// returned events are printed instead.
struct TerminalObserver {
    quiet: bool,
}

impl SessionObserver for TerminalObserver {
    fn on_item_presented(&mut self, item: &Item) {
        if !self.quiet {
            println!();
            println!("  {}", item.token);
        }
    }

    fn on_session_complete(&mut self, category_id: &str) {
        if !self.quiet {
            println!();
            println!("{category_id}: nothing left to review");
        }
    }

    fn on_progress_changed(&mut self, _category_id: &str, known: usize, total: usize) {
        if !self.quiet {
            println!("  [{known}/{total} known]");
        }
    }
}

fn reveal(item: &Item) {
    println!("  = {}", item.display_text);
    if let Some(example) = &item.example_text {
        println!("    {example}");
    }
}

/// Read answers for `item` until a judgment or a quit. `None` means quit.
fn ask<I>(lines: &mut I, item: &Item, quiet: bool) -> io::Result<Option<Outcome>>
where
    I: Iterator<Item = io::Result<String>>,
{
    let mut revealed = false;
    loop {
        if !quiet {
            if revealed {
                print!("  knew it? [Enter/y/\u{2192}] yes, [n/\u{2190}] no, [q] quit ");
            } else {
                print!("  [Enter] reveal, [q] quit ");
            }
            io::stdout().flush()?;
        }
        let Some(line) = lines.next().transpose()? else {
            return Ok(None);
        };
        match line.trim() {
            "q" => return Ok(None),
            "y" | ARROW_RIGHT => return Ok(Some(Outcome::Recalled)),
            "n" | ARROW_LEFT => return Ok(Some(Outcome::Forgotten)),
            "" if revealed => return Ok(Some(Outcome::Recalled)),
            "" => {
                revealed = true;
                if !quiet {
                    reveal(item);
                }
            }
            _ => {}
        }
    }
}

fn emit(events: &[Event], json: bool) -> CmdResult {
    if json {
        for event in events {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(())
}

pub fn run(ctx: &Context, category_id: &str, json: bool) -> CmdResult {
    let db = ctx.open_db()?;
    let ledger = ctx.load_ledger(&db)?;
    let mut runner = SessionRunner::new(ledger, db, TerminalObserver { quiet: json })
        .with_autosave(ctx.config.storage.autosave);

    emit(&runner.start_in(&ctx.catalog, category_id, now_ms())?, json)?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while let Some(item) = runner.current().cloned() {
        match ask(&mut lines, &item, json)? {
            Some(outcome) => emit(&runner.judge(outcome, now_ms())?, json)?,
            None => {
                emit(&runner.abandon(now_ms()), json)?;
                if !json {
                    println!();
                    println!("progress saved");
                }
                break;
            }
        }
    }
    Ok(())
}
