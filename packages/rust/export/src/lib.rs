//! Output document writer.
//!
//! Flattens canonical [`SiteRecord`]s into the five-collection output
//! document (`sites`, `subLocations`, `cards`, `tips`, `vocabularyTerms`),
//! merges with a previous run's output and writes the result atomically.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use heritagekb_shared::{Coordinates, HeritageError, Result, SiteRecord};

// ---------------------------------------------------------------------------
// Document rows
// ---------------------------------------------------------------------------

/// A site without its nested collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub native_name: String,
    /// Empty when unknown.
    #[serde(default)]
    pub era: String,
    #[serde(default)]
    pub tourism_type: String,
    #[serde(default)]
    pub place_type: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub estimated_duration: String,
    #[serde(default)]
    pub best_time_to_visit: String,
    #[serde(default)]
    pub opening_hours: String,
    #[serde(default)]
    pub official_website: String,
    #[serde(default)]
    pub unique_facts: Vec<String>,
    #[serde(default)]
    pub key_figures: Vec<String>,
    #[serde(default)]
    pub architectural_features: Vec<String>,
    #[serde(default)]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
}

/// A sub-location row. The parent record is referenced as `siteId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubLocationRow {
    pub id: String,
    pub site_id: String,
    pub name: String,
    #[serde(default)]
    pub native_name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub image_ref: String,
}

/// Long-form text for one sub-location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRow {
    pub id: String,
    pub sub_location_id: String,
    pub full_description: String,
}

/// One visitor tip. `siteId` holds the owning record's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipRow {
    pub site_id: String,
    pub tip: String,
}

/// One vocabulary term. `siteId` holds the owning record's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyRow {
    pub site_id: String,
    pub english: String,
    pub native: String,
    #[serde(default)]
    pub pronunciation: String,
}

/// The exported document. Collection order follows record order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default)]
    pub sites: Vec<SiteRow>,
    #[serde(default)]
    pub sub_locations: Vec<SubLocationRow>,
    #[serde(default)]
    pub cards: Vec<CardRow>,
    #[serde(default)]
    pub tips: Vec<TipRow>,
    #[serde(default)]
    pub vocabulary_terms: Vec<VocabularyRow>,
}

/// What a write produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub path: PathBuf,
    pub sites: usize,
    pub sub_locations: usize,
    pub cards: usize,
    pub tips: usize,
    pub vocabulary_terms: usize,
    pub size_bytes: usize,
    pub sha256: String,
    pub written_at: DateTime<Utc>,
    /// Records held back by strict validation.
    pub rejected: usize,
    /// Where the rejected records and their issues were written.
    pub rejected_path: Option<PathBuf>,
    /// The requested output path when the document went to a side file instead.
    pub diverted_from: Option<PathBuf>,
}

/// Export behaviour switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Hold back records with validation issues instead of warning.
    pub strict: bool,
    /// Append to the document already at the output path.
    pub merge: bool,
}

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// `{subLocationId}_card_01`
pub fn card_id(sub_location_id: &str) -> String {
    format!("{sub_location_id}_card_01")
}

impl ExportDocument {
    pub fn from_records(records: &[SiteRecord]) -> Self {
        let mut doc = Self::default();
        doc.extend(records);
        doc
    }

    /// Append the rows of `records` after the existing ones.
    pub fn extend<'a>(&mut self, records: impl IntoIterator<Item = &'a SiteRecord>) {
        for record in records {
            self.push(record);
        }
    }

    fn push(&mut self, record: &SiteRecord) {
        self.sites.push(SiteRow {
            id: record.id.clone(),
            name: record.name.clone(),
            native_name: record.native_name.clone(),
            era: record.era.map(|e| e.as_str().to_string()).unwrap_or_default(),
            tourism_type: record.tourism_type.as_str().to_string(),
            place_type: record.place_type.as_str().to_string(),
            region: record.region.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            short_description: record.short_description.clone(),
            full_description: record.full_description.clone(),
            images: record.images.clone(),
            estimated_duration: record.estimated_duration.clone(),
            best_time_to_visit: record.best_time_to_visit.clone(),
            opening_hours: record.opening_hours.clone(),
            official_website: record.official_website.clone(),
            unique_facts: record.unique_facts.clone(),
            key_figures: record.key_figures.clone(),
            architectural_features: record.architectural_features.clone(),
            source_url: record.source_url.clone(),
            rating: record.rating,
            review_count: record.review_count,
        });

        for sub in &record.sub_locations {
            self.sub_locations.push(SubLocationRow {
                id: sub.id.clone(),
                site_id: record.id.clone(),
                name: sub.name.clone(),
                native_name: sub.native_name.clone(),
                short_description: sub.short_description.clone(),
                image_ref: sub.image_ref.clone(),
            });
            let full_description = if sub.full_description.trim().is_empty() {
                record.full_description.clone()
            } else {
                sub.full_description.clone()
            };
            self.cards.push(CardRow {
                id: card_id(&sub.id),
                sub_location_id: sub.id.clone(),
                full_description,
            });
        }

        self.tips.extend(record.tips.iter().map(|tip| TipRow {
            site_id: record.id.clone(),
            tip: tip.clone(),
        }));

        self.vocabulary_terms
            .extend(record.vocabulary_terms.iter().map(|term| VocabularyRow {
                site_id: record.id.clone(),
                english: term.english.clone(),
                native: term.native.clone(),
                pronunciation: term.pronunciation.clone(),
            }));
    }

    /// Read a previously written document. A missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(HeritageError::io(path, e)),
        };
        let doc = serde_json::from_str(&content).map_err(|e| {
            HeritageError::Export(format!("invalid output document {}: {e}", path.display()))
        })?;
        Ok(Some(doc))
    }

    pub fn site_names(&self) -> HashSet<String> {
        self.sites.iter().map(|s| s.name.trim().to_string()).collect()
    }

    /// Highest `site_NNN` sequence number in the document (0 when none).
    pub fn max_site_sequence(&self) -> usize {
        self.sites
            .iter()
            .filter_map(|s| s.id.strip_prefix("site_")?.parse::<usize>().ok())
            .max()
            .unwrap_or(0)
    }

    /// Every card must point at a sub-location of the same document.
    pub fn check_references(&self) -> Result<()> {
        if self.cards.len() != self.sub_locations.len() {
            return Err(HeritageError::validation(format!(
                "{} cards for {} sub-locations",
                self.cards.len(),
                self.sub_locations.len()
            )));
        }
        let ids: HashSet<&str> = self.sub_locations.iter().map(|s| s.id.as_str()).collect();
        match self
            .cards
            .iter()
            .find(|c| !ids.contains(c.sub_location_id.as_str()))
        {
            Some(orphan) => Err(HeritageError::validation(format!(
                "card {} references unknown sub-location {}",
                orphan.id, orphan.sub_location_id
            ))),
            None => Ok(()),
        }
    }

    /// Pretty JSON with non-ASCII text kept as-is, written via tmp + rename.
    #[instrument(skip_all, fields(path = %path.display(), sites = self.sites.len()))]
    pub fn write(&self, path: &Path) -> Result<ExportSummary> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| HeritageError::Export(format!("JSON serialization failed: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| HeritageError::io(parent, e))?;
        }

        write_atomic(path, &json)?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        let sha256 = format!("{:x}", hasher.finalize());

        debug!(size = json.len(), "wrote output document");

        Ok(ExportSummary {
            path: path.to_path_buf(),
            sites: self.sites.len(),
            sub_locations: self.sub_locations.len(),
            cards: self.cards.len(),
            tips: self.tips.len(),
            vocabulary_terms: self.vocabulary_terms.len(),
            size_bytes: json.len(),
            sha256,
            written_at: Utc::now(),
            rejected: 0,
            rejected_path: None,
            diverted_from: None,
        })
    }
}

/// Write `content` via tmp + rename. The tmp file is removed when either step fails.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp = temp_path(path);
    if let Err(e) = std::fs::write(&temp, content) {
        let _ = std::fs::remove_file(&temp);
        return Err(HeritageError::io(&temp, e));
    }
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(HeritageError::io(path, e));
    }
    Ok(())
}

/// `.<file>.tmp` next to the target.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.json".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

/// `<stem>.<timestamp>.<ext>` next to the target.
fn side_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "json".to_string());
    path.with_file_name(format!("{stem}.{}.{ext}", at.format("%Y%m%dT%H%M%S%3f")))
}

/// `<stem>.rejected.json` next to the written document.
fn rejected_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!("{stem}.rejected.json"))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Problems with one record. Empty means valid.
pub fn validate_record(record: &SiteRecord) -> Vec<String> {
    let mut issues = Vec::new();
    if record.id.trim().is_empty() {
        issues.push("missing site id".to_string());
    }
    if record.name.trim().is_empty() {
        issues.push("missing site name".to_string());
    }
    match (record.latitude, record.longitude) {
        (None, None) => {}
        (Some(lat), Some(lon)) if Coordinates::validated(lat, lon).is_some() => {}
        (lat, lon) => issues.push(format!("invalid coordinates: {lat:?}, {lon:?}")),
    }
    if record.sub_locations.is_empty() {
        issues.push("no sub-locations".to_string());
    }
    issues
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// A record held back by strict validation, with the reasons.
#[derive(Debug, Serialize)]
struct RejectedRecord<'a> {
    issues: Vec<String>,
    record: &'a SiteRecord,
}

/// Validate, optionally merge, and write `records` to `path`.
///
/// Committed records always reach disk when any path next to `path` is
/// writable. An unreadable previous document or an unwritable `path` diverts
/// the write to a timestamped side file. Strict mode writes the valid records
/// and lists the rest in a `<stem>.rejected.json` report.
#[instrument(skip_all, fields(path = %path.display(), records = records.len(), strict = options.strict))]
pub fn export(records: &[SiteRecord], path: &Path, options: ExportOptions) -> Result<ExportSummary> {
    let mut accepted = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for record in records {
        let issues = validate_record(record);
        for issue in &issues {
            warn!(site = %record.name, id = %display_key(record), %issue, "record validation issue");
        }
        if options.strict && !issues.is_empty() {
            rejected.push(RejectedRecord { issues, record });
        } else {
            accepted.push(record);
        }
    }

    let mut target = path.to_path_buf();
    let mut doc = ExportDocument::default();
    if options.merge {
        match ExportDocument::load(path) {
            Ok(Some(previous)) => doc = previous,
            Ok(None) => {}
            Err(e) => {
                target = side_path(path, Utc::now());
                warn!(
                    error = %e,
                    side_file = %target.display(),
                    "existing output unreadable, writing to a side file"
                );
            }
        }
    }
    let previous = doc.sites.len();
    doc.extend(accepted.iter().copied());
    if let Err(e) = doc.check_references() {
        warn!(error = %e, "output document has dangling references");
    }

    let mut summary = match doc.write(&target) {
        Ok(summary) => summary,
        Err(e) if target == path => {
            let side = side_path(path, Utc::now());
            warn!(
                error = %e,
                side_file = %side.display(),
                "output not writable, writing to a side file"
            );
            doc.write(&side)?
        }
        Err(e) => return Err(e),
    };
    if summary.path != path {
        summary.diverted_from = Some(path.to_path_buf());
    }

    if !rejected.is_empty() {
        summary.rejected = rejected.len();
        let report = rejected_path(&summary.path);
        let written = serde_json::to_string_pretty(&rejected)
            .map_err(|e| HeritageError::Export(format!("JSON serialization failed: {e}")))
            .and_then(|json| write_atomic(&report, &json));
        match written {
            Ok(()) => {
                warn!(
                    rejected = rejected.len(),
                    report = %report.display(),
                    "records held back by strict validation"
                );
                summary.rejected_path = Some(report);
            }
            Err(e) => warn!(
                error = %e,
                rejected = rejected.len(),
                "could not write rejected-records report"
            ),
        }
    }

    info!(
        new_sites = accepted.len(),
        previous_sites = previous,
        sites = summary.sites,
        sub_locations = summary.sub_locations,
        cards = summary.cards,
        tips = summary.tips,
        vocabulary_terms = summary.vocabulary_terms,
        rejected = summary.rejected,
        sha256 = %summary.sha256,
        "export complete"
    );
    Ok(summary)
}

fn display_key(record: &SiteRecord) -> &str {
    if record.id.trim().is_empty() {
        &record.name
    } else {
        &record.id
    }
}

/// Site names already in the output at `path`. Unreadable output counts as empty.
pub fn existing_site_names(path: &Path) -> HashSet<String> {
    match ExportDocument::load(path) {
        Ok(Some(doc)) => doc.site_names(),
        Ok(None) => HashSet::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read existing output");
            HashSet::new()
        }
    }
}

/// Highest site sequence already in the output at `path`, 0 when unknown.
pub fn existing_id_offset(path: &Path) -> usize {
    match ExportDocument::load(path) {
        Ok(Some(doc)) => doc.max_site_sequence(),
        Ok(None) => 0,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read existing output");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use heritagekb_shared::{Era, PlaceType, SubLocation, TourismType, VocabularyTerm};
    use uuid::Uuid;

    use super::*;

    fn sub(id: &str, name: &str, full: &str) -> SubLocation {
        SubLocation {
            id: id.into(),
            name: name.into(),
            native_name: String::new(),
            short_description: format!("{name}."),
            full_description: full.into(),
            image_ref: String::new(),
        }
    }

    fn record(seq: usize, name: &str) -> SiteRecord {
        let id = format!("site_{seq:03}");
        SiteRecord {
            sub_locations: vec![
                sub(&format!("{id}_sub_01"), "Temple of Amun", "The great temple."),
                sub(&format!("{id}_sub_02"), "Sacred Lake", ""),
            ],
            id,
            name: name.into(),
            native_name: "الكرنك".into(),
            era: Some(Era::NewKingdom),
            tourism_type: TourismType::Pharaonic,
            place_type: PlaceType::Temple,
            region: "Luxor".into(),
            latitude: Some(25.72),
            longitude: Some(32.66),
            short_description: "A temple complex.".into(),
            full_description: "A vast temple complex on the east bank.".into(),
            images: vec!["karnak.jpg".into()],
            estimated_duration: "3-4 hours".into(),
            best_time_to_visit: "Early morning".into(),
            opening_hours: String::new(),
            official_website: String::new(),
            tips: vec!["Bring water.".into(), "Start early.".into()],
            vocabulary_terms: vec![VocabularyTerm {
                english: "Temple".into(),
                native: "معبد".into(),
                pronunciation: "Tem-Ple".into(),
            }],
            unique_facts: Vec::new(),
            key_figures: vec!["Amun".into()],
            architectural_features: Vec::new(),
            source_url: String::new(),
            rating: None,
            review_count: None,
        }
    }

    fn test_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("hkb-export-test-{}", Uuid::now_v7()))
            .join("researched_sites.json")
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn cards_match_sub_locations() {
        let doc = ExportDocument::from_records(&[record(1, "Karnak"), record(2, "Luxor Temple")]);

        assert_eq!(doc.sites.len(), 2);
        assert_eq!(doc.cards.len(), doc.sub_locations.len());
        doc.check_references().expect("references");
        assert_eq!(doc.cards[0].id, "site_001_sub_01_card_01");
        assert_eq!(doc.sub_locations[2].site_id, "site_002");
        assert_eq!(doc.tips.len(), 4);
        assert_eq!(doc.vocabulary_terms[1].site_id, "site_002");
    }

    #[test]
    fn empty_card_text_falls_back_to_site_description() {
        let doc = ExportDocument::from_records(&[record(1, "Karnak")]);
        assert_eq!(doc.cards[0].full_description, "The great temple.");
        assert_eq!(
            doc.cards[1].full_description,
            "A vast temple complex on the east bank."
        );
    }

    #[test]
    fn wire_format() {
        let mut unknown_era = record(1, "Karnak");
        unknown_era.era = None;
        let doc = ExportDocument::from_records(&[unknown_era]);
        let json: serde_json::Value = serde_json::to_value(&doc).expect("json");

        let keys: Vec<&str> = json
            .as_object()
            .expect("object")
            .keys()
            .map(String::as_str)
            .collect();
        for key in ["sites", "subLocations", "cards", "tips", "vocabularyTerms"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        let site = &json["sites"][0];
        assert_eq!(site["era"], "");
        assert_eq!(site["tourismType"], "Pharaonic");
        assert!(site.get("subLocations").is_none());
        assert!(site.get("rating").is_none());
        assert_eq!(json["cards"][0]["subLocationId"], "site_001_sub_01");
        assert_eq!(json["tips"][0]["siteId"], "site_001");
    }

    #[test]
    fn write_is_atomic_and_keeps_arabic() {
        let path = test_path();
        let summary = export(&[record(1, "Karnak")], &path, ExportOptions::default())
            .expect("export");

        assert_eq!(summary.sites, 1);
        assert_eq!(summary.cards, 2);
        assert_eq!(summary.sha256.len(), 64);
        assert!(!temp_path(&path).exists());

        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.contains("الكرنك"));
        assert_eq!(raw.len(), summary.size_bytes);
        cleanup(&path);
    }

    #[test]
    fn merge_appends_to_previous_output() {
        let path = test_path();
        export(&[record(1, "Karnak")], &path, ExportOptions::default()).expect("first");

        assert_eq!(existing_id_offset(&path), 1);
        assert!(existing_site_names(&path).contains("Karnak"));

        let merged = ExportOptions {
            merge: true,
            ..Default::default()
        };
        let summary = export(&[record(2, "Philae")], &path, merged).expect("second");
        assert_eq!(summary.sites, 2);

        let doc = ExportDocument::load(&path).expect("load").expect("present");
        assert_eq!(doc.sites[1].id, "site_002");
        assert_eq!(doc.max_site_sequence(), 2);

        let replaced = export(&[record(3, "Abydos")], &path, ExportOptions::default())
            .expect("third");
        assert_eq!(replaced.sites, 1);
        cleanup(&path);
    }

    #[test]
    fn missing_output_is_empty() {
        let path = test_path();
        assert!(ExportDocument::load(&path).expect("load").is_none());
        assert!(existing_site_names(&path).is_empty());
        assert_eq!(existing_id_offset(&path), 0);
    }

    #[test]
    fn validation_issues() {
        let mut bad = record(1, "");
        bad.latitude = Some(48.85);
        bad.sub_locations.clear();
        let issues = validate_record(&bad);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().any(|i| i.starts_with("invalid coordinates")));

        let mut half = record(2, "Half");
        half.longitude = None;
        assert_eq!(validate_record(&half).len(), 1);
        assert!(validate_record(&record(3, "Fine")).is_empty());
    }

    #[test]
    fn strict_mode_writes_valid_records_and_reports_the_rest() {
        let path = test_path();
        let mut bad = record(1, "Karnak");
        bad.sub_locations.clear();

        let strict = ExportOptions {
            strict: true,
            ..Default::default()
        };
        let summary = export(&[bad.clone(), record(2, "Philae")], &path, strict).expect("strict");
        assert_eq!(summary.sites, 1);
        assert_eq!(summary.rejected, 1);

        let doc = ExportDocument::load(&path).expect("load").expect("present");
        assert_eq!(doc.sites[0].name, "Philae");

        let report_path = summary.rejected_path.expect("report");
        assert_eq!(report_path, path.with_file_name("researched_sites.rejected.json"));
        let raw = std::fs::read_to_string(&report_path).expect("read");
        let report: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(report[0]["record"]["id"], "site_001");
        assert_eq!(report[0]["issues"][0], "no sub-locations");

        let summary = export(&[bad], &path, ExportOptions::default()).expect("lenient");
        assert_eq!(summary.sites, 1);
        assert_eq!(summary.cards, 0);
        assert_eq!(summary.rejected, 0);
        cleanup(&path);
    }

    #[test]
    fn corrupt_previous_output_diverts_to_side_file() {
        let path = test_path();
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "{ truncated").expect("seed");

        let merged = ExportOptions {
            merge: true,
            strict: false,
        };
        let summary = export(&[record(1, "Karnak")], &path, merged).expect("export");

        assert_eq!(summary.diverted_from.as_deref(), Some(path.as_path()));
        assert_ne!(summary.path, path);
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "{ truncated");

        let side = ExportDocument::load(&summary.path).expect("load").expect("present");
        assert_eq!(side.sites.len(), 1);
        assert_eq!(side.sites[0].name, "Karnak");
        cleanup(&path);
    }

    #[test]
    fn unwritable_output_still_lands_on_disk() {
        let path = test_path();
        std::fs::create_dir_all(&path).expect("directory in the way");

        let records = [record(1, "Karnak"), record(2, "Philae")];
        let summary = export(&records, &path, ExportOptions::default()).expect("export");

        assert!(path.is_dir());
        assert!(!temp_path(&path).exists());
        assert_eq!(summary.diverted_from.as_deref(), Some(path.as_path()));
        let name = summary.path.file_name().expect("name").to_string_lossy().into_owned();
        assert!(name.starts_with("researched_sites.") && name.ends_with(".json"));

        let side = ExportDocument::load(&summary.path).expect("load").expect("present");
        let names: Vec<&str> = side.sites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Karnak", "Philae"]);
        cleanup(&path);
    }

    #[test]
    fn side_file_names() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T08:15:30.250Z")
            .expect("timestamp")
            .with_timezone(&Utc);
        assert_eq!(
            side_path(Path::new("out/researched_sites.json"), at),
            PathBuf::from("out/researched_sites.20260301T081530250.json")
        );
        assert_eq!(
            rejected_path(Path::new("out/researched_sites.json")),
            PathBuf::from("out/researched_sites.rejected.json")
        );
    }
}
