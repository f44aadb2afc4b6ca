//! End-to-end enrichment pipeline: listing → primary page → classify →
//! enrich → extract features → synthesize → checkpoint.
//!
//! Records are processed strictly one at a time, in listing order. Only the
//! listing and the primary page can fail a unit of work (the category and the
//! record respectively); every other source is best-effort and leaves its
//! fields empty on failure.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{error, info, instrument, warn};

use heritagekb_checkpoint::CheckpointStore;
use heritagekb_shared::text::truncate_chars;
use heritagekb_shared::{
    Candidate, Category, Coordinates, EncyclopediaEntry, HeritageError, MapFactsEntry, Result,
    SiteMeta, SiteRecord, VisitTips, VocabularyTerm,
};
use heritagekb_sources::{SourceAdapters, TranslationCache};

use crate::governorate::{self, GeocodeCache, RegionCache};
use crate::synthesize::{self, Classification, SynthesisInput};

/// Encyclopedia text appended to the vocabulary input, in characters.
const VOCABULARY_ENCYCLOPEDIA_CHARS: usize = 2000;

// ---------------------------------------------------------------------------
// Progress and control
// ---------------------------------------------------------------------------

/// Pipeline stages of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PrimaryFetch,
    Classify,
    Encyclopedia,
    Geocode,
    MapFacts,
    Region,
    Vocabulary,
    Tips,
    ExtractFeatures,
    Synthesize,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::PrimaryFetch => "primary",
            Stage::Classify => "classify",
            Stage::Encyclopedia => "encyclopedia",
            Stage::Geocode => "geocode",
            Stage::MapFacts => "map_facts",
            Stage::Region => "region",
            Stage::Vocabulary => "vocabulary",
            Stage::Tips => "tips",
            Stage::ExtractFeatures => "features",
            Stage::Synthesize => "synthesize",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a candidate still needs work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateStatus {
    New,
    /// URL or name found in the checkpoint.
    Checkpointed,
    /// Name already present in the output document.
    AlreadyExists,
}

impl CandidateStatus {
    pub fn label(self) -> &'static str {
        match self {
            CandidateStatus::New => "New",
            CandidateStatus::Checkpointed => "Checkpointed",
            CandidateStatus::AlreadyExists => "Already exists",
        }
    }
}

/// Terminal state of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Committed,
    Skipped(CandidateStatus),
    Failed,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// A category listing was fetched.
    fn category_started(&self, category: Category, candidates: usize);
    /// The category was already complete in the checkpoint.
    fn category_skipped(&self, category: Category);
    /// The listing failed; the category is aborted.
    fn category_failed(&self, category: Category, error: &HeritageError);
    /// `current` is 1-based.
    fn record_started(&self, name: &str, current: usize, total: usize);
    fn stage(&self, stage: Stage);
    fn record_finished(&self, name: &str, outcome: RecordOutcome);
    fn category_finished(&self, category: Category);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn category_started(&self, _category: Category, _candidates: usize) {}
    fn category_skipped(&self, _category: Category) {}
    fn category_failed(&self, _category: Category, _error: &HeritageError) {}
    fn record_started(&self, _name: &str, _current: usize, _total: usize) {}
    fn stage(&self, _stage: Stage) {}
    fn record_finished(&self, _name: &str, _outcome: RecordOutcome) {}
    fn category_finished(&self, _category: Category) {}
}

/// Cooperative stop flag, honoured between records.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Memo caches owned by one orchestrator and lent to the stages.
#[derive(Debug, Default)]
pub struct EnrichmentCaches {
    pub translations: TranslationCache,
    pub geocodes: GeocodeCache,
    pub regions: RegionCache,
}

impl EnrichmentCaches {
    pub fn clear(&self) {
        self.translations.clear();
        self.geocodes.clear();
        self.regions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty() && self.geocodes.is_empty() && self.regions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of [`Orchestrator::run`].
#[derive(Debug, Default)]
pub struct RunReport {
    /// Committed records in processing order.
    pub records: Vec<SiteRecord>,
    pub committed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub categories_requested: usize,
    pub completed_categories: Vec<Category>,
    /// Already complete in the checkpoint; not listed.
    pub skipped_categories: Vec<Category>,
    /// Listing failed.
    pub aborted_categories: Vec<Category>,
    pub stopped: bool,
    pub elapsed: Duration,
}

impl RunReport {
    /// True when the listing failed for every requested category.
    pub fn all_listings_failed(&self) -> bool {
        self.categories_requested > 0 && self.aborted_categories.len() == self.categories_requested
    }
}

/// One listed candidate in a dry run.
#[derive(Debug, Clone)]
pub struct PreviewEntry {
    pub category: Category,
    pub candidate: Candidate,
    pub status: CandidateStatus,
}

/// Outcome of [`Orchestrator::preview`].
#[derive(Debug, Default)]
pub struct Preview {
    pub entries: Vec<PreviewEntry>,
    pub aborted_categories: Vec<Category>,
}

impl Preview {
    pub fn count(&self, status: CandidateStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

/// Best-effort enrichment results for one record.
#[derive(Debug, Default)]
struct Enrichment {
    encyclopedia: Option<EncyclopediaEntry>,
    coordinates: Option<Coordinates>,
    map_facts: Option<MapFactsEntry>,
    region: String,
    vocabulary: Vec<VocabularyTerm>,
    tips: Option<VisitTips>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives categories and records through the stage sequence.
pub struct Orchestrator {
    adapters: SourceAdapters,
    checkpoint: CheckpointStore,
    caches: EnrichmentCaches,
    existing_names: HashSet<String>,
    stop: StopSignal,
    /// Sequence number of the last assigned id.
    last_seq: usize,
}

impl Orchestrator {
    pub fn new(adapters: SourceAdapters, checkpoint: CheckpointStore) -> Self {
        Self {
            adapters,
            checkpoint,
            caches: EnrichmentCaches::default(),
            existing_names: HashSet::new(),
            stop: StopSignal::new(),
            last_seq: 0,
        }
    }

    /// Start numbering after `offset` (the first record becomes `offset + 1`).
    pub fn with_id_offset(mut self, offset: usize) -> Self {
        self.last_seq = offset;
        self
    }

    /// Names that count as already done (skip-existing).
    pub fn with_existing_names<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.existing_names = names.into_iter().map(|n| n.trim().to_string()).collect();
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn checkpoint(&self) -> &CheckpointStore {
        &self.checkpoint
    }

    pub fn caches(&self) -> &EnrichmentCaches {
        &self.caches
    }

    /// Checkpoint first, then the skip-existing names.
    pub fn candidate_status(&self, candidate: &Candidate) -> CandidateStatus {
        if self.checkpoint.is_processed(&candidate.url, &candidate.name) {
            CandidateStatus::Checkpointed
        } else if self.existing_names.contains(candidate.name.trim()) {
            CandidateStatus::AlreadyExists
        } else {
            CandidateStatus::New
        }
    }

    /// Run every requested category, in processing order.
    #[instrument(skip_all, fields(categories = categories.len(), max = ?max_per_category))]
    pub async fn run(
        &mut self,
        categories: &[Category],
        max_per_category: Option<usize>,
        progress: &dyn ProgressReporter,
    ) -> RunReport {
        let start = Instant::now();
        let categories = Category::in_processing_order(categories);
        let mut report = RunReport {
            categories_requested: categories.len(),
            ..Default::default()
        };

        info!(first_id = self.last_seq + 1, "starting enrichment run");

        for category in categories {
            if self.stop.is_stopped() {
                report.stopped = true;
                break;
            }

            if self.checkpoint.is_category_complete(category) {
                info!(%category, "category already complete, skipping");
                progress.category_skipped(category);
                report.skipped_categories.push(category);
                continue;
            }

            let candidates = match self.adapters.listing.fetch(category, max_per_category).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    error!(%category, error = %e, "listing failed, aborting category");
                    progress.category_failed(category, &e);
                    report.aborted_categories.push(category);
                    continue;
                }
            };

            info!(%category, candidates = candidates.len(), "processing category");
            progress.category_started(category, candidates.len());

            let total = candidates.len();
            let mut interrupted = false;
            for (idx, candidate) in candidates.iter().enumerate() {
                if self.stop.is_stopped() {
                    interrupted = true;
                    break;
                }
                progress.record_started(&candidate.name, idx + 1, total);

                let outcome = match self.candidate_status(candidate) {
                    CandidateStatus::New => match self.process(candidate, progress).await {
                        Some(record) => {
                            report.records.push(record);
                            RecordOutcome::Committed
                        }
                        None => RecordOutcome::Failed,
                    },
                    status => {
                        info!(site = %candidate.name, status = status.label(), "skipping candidate");
                        RecordOutcome::Skipped(status)
                    }
                };

                match outcome {
                    RecordOutcome::Committed => report.committed += 1,
                    RecordOutcome::Skipped(_) => report.skipped += 1,
                    RecordOutcome::Failed => report.failed += 1,
                }
                progress.record_finished(&candidate.name, outcome);
            }

            if interrupted {
                report.stopped = true;
                info!(%category, "stop requested, category left incomplete");
                break;
            }

            if let Err(e) = self.checkpoint.mark_category_complete(category) {
                error!(%category, error = %e, "could not persist category completion");
            }
            progress.category_finished(category);
            report.completed_categories.push(category);
        }

        report.elapsed = start.elapsed();
        info!(
            committed = report.committed,
            skipped = report.skipped,
            failed = report.failed,
            aborted = report.aborted_categories.len(),
            stopped = report.stopped,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "enrichment run finished"
        );
        report
    }

    /// List candidates without enriching them.
    #[instrument(skip_all, fields(categories = categories.len()))]
    pub async fn preview(&self, categories: &[Category], max_per_category: Option<usize>) -> Preview {
        let mut preview = Preview::default();
        for category in Category::in_processing_order(categories) {
            match self.adapters.listing.fetch(category, max_per_category).await {
                Ok(candidates) => {
                    preview.entries.extend(candidates.into_iter().map(|candidate| PreviewEntry {
                        category,
                        status: self.candidate_status(&candidate),
                        candidate,
                    }));
                }
                Err(e) => {
                    warn!(%category, error = %e, "listing failed");
                    preview.aborted_categories.push(category);
                }
            }
        }
        preview
    }

    /// Clear the caches and write a final checkpoint.
    pub fn shutdown(&mut self) -> Result<()> {
        self.caches.clear();
        self.checkpoint.save()
    }

    /// Take one candidate through every stage. `None` means the record failed.
    #[instrument(skip_all, fields(site = %candidate.name))]
    async fn process(
        &mut self,
        candidate: &Candidate,
        progress: &dyn ProgressReporter,
    ) -> Option<SiteRecord> {
        progress.stage(Stage::PrimaryFetch);
        let primary = match self.adapters.primary.fetch(&candidate.url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(stage = "primary", site = %candidate.name, error = %e, "primary page failed, dropping record");
                return None;
            }
        };

        self.last_seq += 1;
        let id = format!("site_{:03}", self.last_seq);
        let name = synthesize::record_name(candidate, &primary);
        let text = synthesize::full_description(candidate, &primary);

        progress.stage(Stage::Classify);
        let classification = Classification::of(&name, &text);

        let enrichment = self
            .enrich(&name, candidate, &text, classification, progress)
            .await;

        progress.stage(Stage::ExtractFeatures);
        let sub_locations = heritagekb_extract::extract(&id, &name, &text);

        progress.stage(Stage::Synthesize);
        let record = synthesize::synthesize(SynthesisInput {
            id: &id,
            candidate,
            primary: &primary,
            classification,
            encyclopedia: enrichment.encyclopedia.as_ref(),
            region: enrichment.region,
            coordinates: enrichment.coordinates,
            vocabulary: enrichment.vocabulary,
            tips: enrichment.tips.as_ref(),
            map_facts: enrichment.map_facts.as_ref(),
            sub_locations,
        });

        if let Err(e) = self.checkpoint.mark_processed(&candidate.url, &candidate.name) {
            error!(site = %name, error = %e, "could not persist checkpoint");
        }

        info!(
            id = %record.id,
            era = record.era.map(|e| e.as_str()).unwrap_or("-"),
            region = %record.region,
            sub_locations = record.sub_locations.len(),
            facts = record.unique_facts.len(),
            terms = record.vocabulary_terms.len(),
            "record committed"
        );
        Some(record)
    }

    /// Run the best-effort stages. Failures are logged and leave gaps.
    async fn enrich(
        &self,
        name: &str,
        candidate: &Candidate,
        text: &str,
        classification: Classification,
        progress: &dyn ProgressReporter,
    ) -> Enrichment {
        let hint = candidate.location_hint.as_str();
        let adapters = &self.adapters;
        let mut out = Enrichment::default();

        progress.stage(Stage::Encyclopedia);
        out.encyclopedia = best_effort(Stage::Encyclopedia, name, adapters.encyclopedia.query(name, hint).await)
            .flatten();

        progress.stage(Stage::Geocode);
        out.coordinates =
            governorate::forward_geocode(adapters.geocode.as_ref(), &self.caches.geocodes, name, hint).await;

        if let Some(map_facts) = &adapters.map_facts {
            progress.stage(Stage::MapFacts);
            out.map_facts = best_effort(Stage::MapFacts, name, map_facts.query(name, hint).await).flatten();
        }

        progress.stage(Stage::Region);
        let known_point = out
            .coordinates
            .or_else(|| out.map_facts.as_ref().and_then(|m| m.coordinates));
        out.region = governorate::resolve_region(
            adapters.geocode.as_ref(),
            &self.caches.geocodes,
            &self.caches.regions,
            name,
            hint,
            known_point,
        )
        .await;

        progress.stage(Stage::Vocabulary);
        let vocabulary_text = match &out.encyclopedia {
            Some(entry) => format!(
                "{text} {}",
                truncate_chars(&entry.full_text, VOCABULARY_ENCYCLOPEDIA_CHARS)
            ),
            None => text.to_string(),
        };
        out.vocabulary = best_effort(
            Stage::Vocabulary,
            name,
            adapters
                .translate
                .extract_and_translate(name, &vocabulary_text, &self.caches.translations)
                .await,
        )
        .unwrap_or_default();

        progress.stage(Stage::Tips);
        let meta = SiteMeta {
            place_type: classification.place_type,
            tourism_type: classification.tourism_type,
            region: out.region.clone(),
        };
        out.tips = best_effort(Stage::Tips, name, adapters.tips.query(name, &meta).await).flatten();

        out
    }
}

/// Log and swallow a secondary-source failure.
fn best_effort<T>(stage: Stage, site: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(stage = stage.as_str(), site, error = %e, "source failed, continuing without it");
            None
        }
    }
}
