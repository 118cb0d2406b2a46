//! Run report rendering.
//!
//! The human report is plain text so it can be diffed and asserted on. The
//! JSON form is the serialized [`SyncOutcome`] wrapped by the CLI.

use std::fmt::Write as _;

use crate::core::{
    Classification, Diagnostic, Presence, Proposal, Severity, SkillClassification, SkillCounts,
    SyncChange, TagAction,
};
use crate::engine::{IndexWrite, SyncOutcome};

/// The whole report of a run with nothing to sync and nothing to propose.
pub const NO_UPDATES: &str = "Synchronization verified. No updates required.";

const APPROVAL: &str = "(approval required)";

/// Render the human-readable report.
#[must_use]
pub fn render(outcome: &SyncOutcome) -> String {
    let mut out = String::new();

    if outcome.is_noop() {
        if !outcome.diagnostics.is_empty() {
            render_diagnostics(&mut out, &outcome.diagnostics);
            out.push('\n');
        }
        out.push_str(NO_UPDATES);
        return out;
    }

    render_header(&mut out, outcome);
    if !outcome.diagnostics.is_empty() {
        out.push('\n');
        render_diagnostics(&mut out, &outcome.diagnostics);
    }

    let classification = &outcome.classification;
    if !classification.skills.is_empty() {
        out.push('\n');
        for skill in &classification.skills {
            render_skill(&mut out, skill);
        }
    }

    out.push('\n');
    render_summary(&mut out, classification, outcome);
    out
}

fn render_header(out: &mut String, outcome: &SyncOutcome) {
    out.push_str("Skill sync\n");
    for source in &outcome.sources {
        let status = if source.available {
            format!("{} skill(s)", source.skills)
        } else {
            "unavailable".to_string()
        };
        let _ = writeln!(
            out,
            "  {:<7} {} ({status})",
            source.kind.as_str(),
            source.root.display()
        );
    }

    let counts = &outcome.classification.counts;
    let _ = writeln!(out, "Counts: {}", counts_line(&counts.after));
    if counts.is_changed() {
        let _ = writeln!(out, "  previously: {}", counts_line(&counts.before));
    }
}

fn counts_line(counts: &SkillCounts) -> String {
    format!(
        "plugin {}, local-only {}, overrides {}, total {}",
        counts.plugin_count, counts.local_only_count, counts.override_count, counts.total
    )
}

/// Render only the warning and error blocks, for runs that fail before a
/// report exists.
#[must_use]
pub fn render_diagnostics_only(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    render_diagnostics(&mut out, diagnostics);
    out
}

fn render_diagnostics(out: &mut String, diagnostics: &[Diagnostic]) {
    for (severity, heading) in [(Severity::Warning, "Warnings:"), (Severity::Error, "Errors:")] {
        let mut matching = diagnostics.iter().filter(|d| d.severity() == severity).peekable();
        if matching.peek().is_none() {
            continue;
        }
        let _ = writeln!(out, "{heading}");
        for diagnostic in matching {
            let _ = writeln!(out, "  - {diagnostic}");
        }
    }
}

fn render_skill(out: &mut String, skill: &SkillClassification) {
    let _ = writeln!(out, "{} ({})", skill.name, skill.source);

    match skill.presence {
        Presence::Held => {
            out.push_str("  held: failed to parse; previous snapshot kept\n");
        }
        Presence::Added | Presence::Removed => {
            for change in &skill.sync {
                let _ = writeln!(out, "  {change}");
            }
        }
        Presence::Unchanged => {
            let mut sections = Vec::new();
            for change in &skill.sync {
                match change {
                    SyncChange::SectionsAdded { .. }
                    | SyncChange::SectionsRemoved { .. }
                    | SyncChange::SectionsModified { .. } => sections.push(change.to_string()),
                    other => {
                        let _ = writeln!(out, "  {other}");
                    }
                }
            }
            if sections.is_empty() {
                out.push_str("  sections: No changes needed\n");
            } else {
                let _ = writeln!(out, "  sections: {}", sections.join(", "));
            }
        }
    }

    for proposal in &skill.proposals {
        match proposal {
            Proposal::Tag(tag) => {
                let verb = match tag.action {
                    TagAction::Add => "add",
                    TagAction::Remove => "remove",
                };
                let _ = writeln!(out, "  tags: {verb} `{}` {APPROVAL}", tag.tag);
            }
            Proposal::TypicalUse(text) => {
                let _ = writeln!(
                    out,
                    "  typical use: {:?} -> {:?} {APPROVAL}",
                    text.old_text, text.new_text
                );
            }
        }
    }
}

fn render_summary(out: &mut String, classification: &Classification, outcome: &SyncOutcome) {
    let _ = writeln!(
        out,
        "Summary: {} skill(s) updated, {} proposal(s) pending approval",
        classification.updated_skills(),
        classification.proposal_count()
    );
    let path = outcome.index_path.display();
    match outcome.index_write {
        IndexWrite::Written => {
            let _ = write!(out, "Index written: {path}");
        }
        IndexWrite::DryRun => {
            let _ = write!(out, "Dry run: index not written ({path})");
        }
        IndexWrite::Skipped => {
            let _ = write!(out, "Index unchanged: {path}");
        }
    }
}
