//! Source adapter contracts consumed by the pipeline.
//!
//! Every adapter is a best-effort query function: the pipeline decides what a
//! failure means (fatal for listings, record-fatal for primary pages, ignored
//! for everything else).

use std::sync::Arc;

use async_trait::async_trait;

use heritagekb_shared::{
    Candidate, Category, Coordinates, EncyclopediaEntry, MapFactsEntry, PrimaryPage, Result,
    SiteMeta, VisitTips, VocabularyTerm,
};

use crate::cache::TranslationCache;

/// Enumerates candidate sites for a category.
#[async_trait]
pub trait Listing: Send + Sync {
    /// Candidates in listing order, at most `max` when set.
    async fn fetch(&self, category: Category, max: Option<usize>) -> Result<Vec<Candidate>>;
}

/// Loads the detail page of one candidate.
#[async_trait]
pub trait PrimaryFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<PrimaryPage>;
}

/// Forward and reverse geocoding.
#[async_trait]
pub trait Geocode: Send + Sync {
    /// Coordinates inside the Egypt box, or `None`.
    async fn query(&self, name: &str, hint: &str) -> Result<Option<Coordinates>>;

    /// Raw administrative region name for a point, or `None`.
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>>;
}

/// Encyclopedic article lookup.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    async fn query(&self, name: &str, hint: &str) -> Result<Option<EncyclopediaEntry>>;
}

/// Practical visiting information.
#[async_trait]
pub trait Tips: Send + Sync {
    async fn query(&self, name: &str, meta: &SiteMeta) -> Result<Option<VisitTips>>;
}

/// Extracts notable terms from text and translates them.
#[async_trait]
pub trait TermTranslate: Send + Sync {
    /// Translations are memoised in `cache`, which the caller owns.
    async fn extract_and_translate(
        &self,
        name: &str,
        text: &str,
        cache: &TranslationCache,
    ) -> Result<Vec<VocabularyTerm>>;
}

/// Map-provider facts (rating, hours, coordinates).
#[async_trait]
pub trait MapFacts: Send + Sync {
    async fn query(&self, name: &str, hint: &str) -> Result<Option<MapFactsEntry>>;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// The full set of adapters a pipeline runs against.
#[derive(Clone)]
pub struct SourceAdapters {
    pub listing: Arc<dyn Listing>,
    pub primary: Arc<dyn PrimaryFetch>,
    pub geocode: Arc<dyn Geocode>,
    pub encyclopedia: Arc<dyn Encyclopedia>,
    pub tips: Arc<dyn Tips>,
    pub translate: Arc<dyn TermTranslate>,
    /// Optional; no map provider ships by default.
    pub map_facts: Option<Arc<dyn MapFacts>>,
}

impl std::fmt::Debug for SourceAdapters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceAdapters")
            .field("map_facts", &self.map_facts.is_some())
            .finish_non_exhaustive()
    }
}
