use std::sync::Mutex;
use std::time::Duration;

use btrfs_backup_core::planner::{Action, OperationPlan};
use btrfs_backup_core::{Error, ProgressReporter};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// CLI progress reporter: one spinner per running action, and a line on
/// stderr once it finishes.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

impl ProgressReporter for CliReporter {
    fn on_action_start(&self, index: usize, total: usize, action: &Action) {
        self.set_bar(spinner(format!("[{}/{}] {}", index + 1, total, action)));
    }

    fn on_action_complete(&self, _index: usize, action: &Action, duration_secs: f64) {
        self.finish_bar();
        eprintln!("  {} {} in {:.2}s", "✓".green(), action, duration_secs);
    }

    fn on_action_failed(&self, _index: usize, action: &Action, error: &Error) {
        self.finish_bar();
        eprintln!("  {} {}: {}", "✗".red(), action, error);
    }

    fn on_plan_complete(&self, plan: &OperationPlan, duration_secs: f64) {
        self.finish_bar();
        if !plan.is_empty() {
            eprintln!(
                "  {} {} for '{}' complete: {} action(s) in {:.2}s",
                "✓".green(),
                plan.operation(),
                plan.pair(),
                plan.len(),
                duration_secs
            );
        }
    }
}
