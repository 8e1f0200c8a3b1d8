use std::io::{self, Write};

use btrfs_backup_core::executor::command_line;
use btrfs_backup_core::planner::OperationPlan;
use btrfs_backup_core::snapshot::NameFormat;
use btrfs_backup_core::{PairListing, Presence, RunSummary};
use chrono::NaiveDateTime;
use colored::*;

pub fn write_plan<W: Write>(out: &mut W, plan: &OperationPlan) -> io::Result<()> {
    writeln!(
        out,
        "{} {} for pair '{}': {} action(s)",
        "Plan:".bold(),
        plan.operation(),
        plan.pair(),
        plan.len()
    )?;
    for (index, action) in plan.actions().iter().enumerate() {
        writeln!(out, "  {:>2}. {}", index + 1, action)?;
        writeln!(out, "      {}", command_line(action).dimmed())?;
    }
    for warning in plan.warnings() {
        writeln!(out, "  {} {}", "warning:".yellow(), warning)?;
    }
    Ok(())
}

fn presence_label(presence: Presence) -> ColoredString {
    match presence {
        Presence::Both => "both".green(),
        Presence::SourceOnly => "source only".yellow(),
        Presence::TargetOnly => "target only".cyan(),
    }
}

pub fn write_listing<W: Write>(
    out: &mut W,
    listing: &PairListing,
    now: NaiveDateTime,
) -> io::Result<()> {
    writeln!(out, "{} '{}'", "Pair".bold(), listing.pair)?;
    writeln!(
        out,
        "  source: {} ({} snapshots)",
        listing.source.location.display(),
        listing.source.snapshots.len()
    )?;
    writeln!(
        out,
        "  target: {} ({} snapshots)",
        listing.target.location.display(),
        listing.target.snapshots.len()
    )?;

    for (snapshot, presence) in listing.entries() {
        let age = (now - snapshot.timestamp()).num_days();
        let legacy = match snapshot.format() {
            NameFormat::LegacyDateOnly => " (date only)",
            NameFormat::PreciseTimestamp => "",
        };
        writeln!(
            out,
            "  {:<40} {:>5}d  {}{}",
            snapshot.raw_name(),
            age,
            presence_label(presence),
            legacy
        )?;
    }

    for (side, outcome) in [("source", &listing.source), ("target", &listing.target)] {
        for rejected in &outcome.rejected {
            writeln!(out, "  {} {} entry '{}'", "not a snapshot:".red(), side, rejected.0)?;
        }
    }
    Ok(())
}

pub fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(
        out,
        "{} {} pair(s), {} action(s), {} full transfer(s), {} warning(s) in {}",
        "Done:".bold(),
        summary.pairs,
        summary.actions,
        summary.full_transfers,
        summary.warnings,
        format!("{:.2}s", summary.duration.as_secs_f64()).green()
    )
}
