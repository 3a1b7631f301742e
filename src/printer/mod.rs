//! Console summaries (owo-colors).

use std::path::Path;

use owo_colors::OwoColorize;

use crate::execution::BatchSummary;

pub struct TextPrinter {
    pub color: Option<&'static str>,
}

impl TextPrinter {
    pub fn print(&self, text: &str) {
        if let Some(c) = self.color {
            match c {
                "green" => println!("{}", text.green()),
                "red" => println!("{}", text.red()),
                "cyan" => println!("{}", text.cyan()),
                "yellow" => println!("{}", text.yellow()),
                _ => println!("{}", text),
            }
        } else {
            println!("{}", text);
        }
    }
}

/// One line per finished stage: how many records were added and where the
/// whole array now lives.
pub fn stage_done(stage: &str, added: usize, total: usize, path: &Path) {
    println!(
        "{} {} new record(s), {} total -> {}",
        format!("{stage}:").cyan(),
        added,
        total,
        path.display()
    );
}

pub fn batch_summary(summary: BatchSummary) {
    let runnable = TextPrinter { color: Some("green") };
    let failed = TextPrinter {
        color: if summary.failed > 0 { Some("red") } else { None },
    };
    runnable.print(&format!("runnable: {}", summary.runnable));
    failed.print(&format!("failed:   {}", summary.failed));
}
