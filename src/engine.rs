//! Sync orchestration.
//!
//! A run has two phases. [`SyncEngine::plan`] reads every source and the
//! baseline, merges, diffs and classifies. [`SyncEngine::apply`] writes the
//! next index when the plan has sync changes. Only `apply` touches disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::core::{self, Classification, Diagnostic, ProposalRules, Severity};
use crate::error::Result;
use crate::index::{IndexStore, SkillIndex};
use crate::sources::{FsSkillProvider, SkillProvider, SourceSummary};

/// What happened to the index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexWrite {
    /// Sync changes were written.
    Written,
    /// Nothing to sync; the file was not touched.
    Skipped,
    /// Sync changes exist but writing was suppressed.
    DryRun,
}

/// Result of the plan phase.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub sources: Vec<SourceSummary>,
    pub diagnostics: Vec<Diagnostic>,
    pub classification: Classification,
    /// The index `apply` writes if the plan has sync changes.
    pub next_index: SkillIndex,
}

impl SyncPlan {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.classification.is_noop()
    }
}

/// Everything the reporter needs about a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    pub sources: Vec<SourceSummary>,
    pub diagnostics: Vec<Diagnostic>,
    pub classification: Classification,
    pub index_path: PathBuf,
    pub index_write: IndexWrite,
}

impl SyncOutcome {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.classification.is_noop()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == Severity::Error)
    }
}

pub struct SyncEngine {
    providers: Vec<Box<dyn SkillProvider>>,
    rules: ProposalRules,
}

impl SyncEngine {
    #[must_use]
    pub fn new(providers: Vec<Box<dyn SkillProvider>>, rules: ProposalRules) -> Self {
        Self { providers, rules }
    }

    /// Plugin and local filesystem sources plus the configured proposal rules.
    pub fn from_config(config: &Config, project_root: &Path) -> Result<Self> {
        let providers: Vec<Box<dyn SkillProvider>> = vec![
            Box::new(FsSkillProvider::plugin(config.plugin_root(project_root))),
            Box::new(FsSkillProvider::local(config.local_root(project_root))),
        ];
        let rules = ProposalRules::from_config(&config.proposals)?;
        Ok(Self::new(providers, rules))
    }

    /// Plan against the index held by `store`.
    #[must_use]
    pub fn plan(&self, store: &IndexStore) -> SyncPlan {
        let (baseline, baseline_diagnostic) = store.load_baseline();
        let mut plan = self.plan_at(&baseline, Utc::now());
        plan.diagnostics.extend(baseline_diagnostic);
        plan
    }

    /// Plan against an explicit baseline. Reads sources but writes nothing.
    #[must_use]
    pub fn plan_at(&self, baseline: &SkillIndex, now: DateTime<Utc>) -> SyncPlan {
        let _span = tracing::info_span!("plan", sources = self.providers.len()).entered();

        let listings: Vec<_> = self.providers.iter().map(|p| p.list()).collect();
        let merged = core::resolve(&listings).hold_baseline(baseline.skills.values());
        let next_index = SkillIndex::from_merged(&merged, baseline, now);

        let changes = core::diff::compute(&merged, baseline, &self.rules);
        let classification = core::classify(changes, baseline.counts, next_index.counts);

        let sources = listings.iter().map(|l| l.summary()).collect();
        let diagnostics = listings
            .into_iter()
            .flat_map(|l| l.diagnostics)
            .collect::<Vec<_>>();

        tracing::info!(
            skills = merged.len(),
            held = merged.held().len(),
            diagnostics = diagnostics.len(),
            sync = classification.has_sync(),
            proposals = classification.proposal_count(),
            "plan ready"
        );

        SyncPlan {
            sources,
            diagnostics,
            classification,
            next_index,
        }
    }

    /// Write the plan's index if it has sync changes. Proposals are never
    /// written.
    pub fn apply(&self, plan: SyncPlan, store: &IndexStore, dry_run: bool) -> Result<SyncOutcome> {
        let index_write = if !plan.classification.has_sync() {
            IndexWrite::Skipped
        } else if dry_run {
            tracing::info!(path = %store.path().display(), "dry run; index not written");
            IndexWrite::DryRun
        } else {
            store.save(&plan.next_index)?;
            IndexWrite::Written
        };

        Ok(SyncOutcome {
            sources: plan.sources,
            diagnostics: plan.diagnostics,
            classification: plan.classification,
            index_path: store.path().to_path_buf(),
            index_write,
        })
    }

    /// Plan and apply in one call.
    pub fn run(&self, store: &IndexStore, dry_run: bool) -> Result<SyncOutcome> {
        let plan = self.plan(store);
        self.apply(plan, store, dry_run)
    }
}
