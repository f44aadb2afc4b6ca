//! Terminal progress reporters.

use std::sync::Mutex;

use heritagekb_core::{CandidateStatus, ProgressReporter, RecordOutcome, Stage};
use heritagekb_shared::{Category, HeritageError};
use indicatif::{ProgressBar, ProgressStyle};

/// One indicatif bar per category.
pub(crate) struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub(crate) fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(bar) = guard.as_ref() {
            f(bar);
        }
    }

    fn replace(&self, bar: Option<ProgressBar>) {
        let mut guard = self.bar.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = bar;
    }
}

impl ProgressReporter for BarProgress {
    fn category_started(&self, category: Category, candidates: usize) {
        let bar = ProgressBar::new(candidates as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
        bar.set_prefix(category.display_name());
        self.replace(Some(bar));
    }

    fn category_skipped(&self, category: Category) {
        self.replace(None);
        println!("  {} already complete, skipping", category.display_name());
    }

    fn category_failed(&self, category: Category, error: &HeritageError) {
        self.replace(None);
        eprintln!("  {} listing failed: {error}", category.display_name());
    }

    fn record_started(&self, name: &str, _current: usize, _total: usize) {
        self.with_bar(|bar| bar.set_message(name.to_string()));
    }

    fn stage(&self, stage: Stage) {
        self.with_bar(|bar| {
            let name = bar.message();
            let site = name.split(" · ").next().unwrap_or_default().to_string();
            bar.set_message(format!("{site} · {stage}"));
        });
    }

    fn record_finished(&self, _name: &str, _outcome: RecordOutcome) {
        self.with_bar(|bar| bar.inc(1));
    }

    fn category_finished(&self, category: Category) {
        let mut guard = self.bar.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(bar) = guard.take() {
            bar.finish_with_message(format!("{} done", category.display_name()));
        }
    }
}

/// Plain `[i/n] name` lines for non-interactive output.
pub(crate) struct PlainProgress;

impl ProgressReporter for PlainProgress {
    fn category_started(&self, category: Category, candidates: usize) {
        println!("{} ({candidates} candidates)", category.display_name());
    }

    fn category_skipped(&self, category: Category) {
        println!("{} already complete, skipping", category.display_name());
    }

    fn category_failed(&self, category: Category, error: &HeritageError) {
        eprintln!("{} listing failed: {error}", category.display_name());
    }

    fn record_started(&self, name: &str, current: usize, total: usize) {
        println!("  [{current}/{total}] {name}");
    }

    fn stage(&self, _stage: Stage) {}

    fn record_finished(&self, _name: &str, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Committed => {}
            RecordOutcome::Skipped(CandidateStatus::AlreadyExists) => {
                println!("      skipped (already exported)")
            }
            RecordOutcome::Skipped(_) => println!("      skipped (checkpoint)"),
            RecordOutcome::Failed => println!("      failed"),
        }
    }

    fn category_finished(&self, _category: Category) {}
}
