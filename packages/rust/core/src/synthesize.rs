//! Record synthesis: merge per-stage outputs into one [`SiteRecord`].
//!
//! Pure field selection. Precedence:
//! - era: a recognised encyclopedia period overrides the primary-text era
//! - tips group (tips, duration, best time, hours, website): all from the
//!   tips stage or all empty
//! - encyclopedia group (facts, figures, features, article URL): all from the
//!   encyclopedia stage or all empty
//! - coordinates: geocoder first, then map facts

use heritagekb_shared::text::truncate_chars;
use heritagekb_shared::{
    Candidate, Coordinates, EncyclopediaEntry, Era, MapFactsEntry, PlaceType, PrimaryPage,
    SiteRecord, SubLocation, TourismType, VisitTips, VocabularyTerm,
};

/// Character budget of the short description.
pub const SHORT_DESCRIPTION_CHARS: usize = 200;

/// Most images kept per record.
pub const MAX_IMAGES: usize = 5;

/// Output of the classification stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub era: Option<Era>,
    pub tourism_type: TourismType,
    pub place_type: PlaceType,
}

impl Classification {
    /// Classify a record from its name and description.
    pub fn of(name: &str, text: &str) -> Self {
        let era = heritagekb_classify::era(text);
        Self {
            era,
            tourism_type: heritagekb_classify::tourism_type(era, text, name),
            place_type: heritagekb_classify::place_type(name, text),
        }
    }
}

/// Everything the stages produced for one candidate.
#[derive(Debug, Clone)]
pub struct SynthesisInput<'a> {
    pub id: &'a str,
    pub candidate: &'a Candidate,
    pub primary: &'a PrimaryPage,
    pub classification: Classification,
    pub encyclopedia: Option<&'a EncyclopediaEntry>,
    pub region: String,
    pub coordinates: Option<Coordinates>,
    pub vocabulary: Vec<VocabularyTerm>,
    pub tips: Option<&'a VisitTips>,
    pub map_facts: Option<&'a MapFactsEntry>,
    pub sub_locations: Vec<SubLocation>,
}

/// Display name: listing title, else the detail page `h1`.
pub fn record_name(candidate: &Candidate, primary: &PrimaryPage) -> String {
    let listed = candidate.name.trim();
    if listed.is_empty() {
        primary.title.trim().to_string()
    } else {
        listed.to_string()
    }
}

/// The text classification and extraction run over.
pub fn full_description(candidate: &Candidate, primary: &PrimaryPage) -> String {
    if primary.long_description.trim().is_empty() {
        candidate.description_hint.trim().to_string()
    } else {
        primary.long_description.clone()
    }
}

/// Listing image first, then the page gallery, de-duplicated.
pub fn merge_images(candidate: &Candidate, primary: &PrimaryPage) -> Vec<String> {
    let mut images: Vec<String> = Vec::with_capacity(MAX_IMAGES);
    let listed = candidate.image_hint.trim();
    let sources = std::iter::once(listed)
        .chain(primary.images.iter().map(|s| s.trim()))
        .filter(|s| !s.is_empty());
    for src in sources {
        if !images.iter().any(|i| i == src) {
            images.push(src.to_string());
            if images.len() == MAX_IMAGES {
                break;
            }
        }
    }
    images
}

/// Era after applying the encyclopedia override.
pub fn merged_era(primary_era: Option<Era>, encyclopedia: Option<&EncyclopediaEntry>) -> Option<Era> {
    encyclopedia
        .and_then(|e| e.period.as_deref())
        .and_then(heritagekb_classify::normalize_period)
        .or(primary_era)
}

/// Build the canonical record.
pub fn synthesize(input: SynthesisInput<'_>) -> SiteRecord {
    let SynthesisInput {
        id,
        candidate,
        primary,
        classification,
        encyclopedia,
        region,
        coordinates,
        vocabulary,
        tips,
        map_facts,
        mut sub_locations,
    } = input;

    let name = record_name(candidate, primary);
    let full_description = full_description(candidate, primary);
    let images = merge_images(candidate, primary);

    let short_source = if candidate.description_hint.trim().is_empty() {
        full_description.as_str()
    } else {
        candidate.description_hint.trim()
    };
    let short_description = truncate_chars(short_source, SHORT_DESCRIPTION_CHARS).to_string();

    let coordinates = coordinates
        .or_else(|| map_facts.and_then(|m| m.coordinates))
        .and_then(|c| Coordinates::validated(c.lat, c.lon));

    // The fallback sub-location stands for the whole site.
    if let [only] = sub_locations.as_mut_slice() {
        if only.name == name {
            only.native_name = primary.native_name.clone();
            only.image_ref = images.first().cloned().unwrap_or_default();
        }
    }

    let mut record = SiteRecord {
        id: id.to_string(),
        name,
        native_name: primary.native_name.clone(),
        era: merged_era(classification.era, encyclopedia),
        tourism_type: classification.tourism_type,
        place_type: classification.place_type,
        region,
        latitude: coordinates.map(|c| c.lat),
        longitude: coordinates.map(|c| c.lon),
        short_description,
        full_description,
        images,
        estimated_duration: String::new(),
        best_time_to_visit: String::new(),
        opening_hours: String::new(),
        official_website: String::new(),
        sub_locations,
        tips: Vec::new(),
        vocabulary_terms: vocabulary,
        unique_facts: Vec::new(),
        key_figures: Vec::new(),
        architectural_features: Vec::new(),
        source_url: String::new(),
        rating: map_facts.and_then(|m| m.rating),
        review_count: map_facts.and_then(|m| m.review_count),
    };

    if let Some(tips) = tips {
        record.tips = tips.tips.clone();
        record.estimated_duration = tips.duration.clone();
        record.best_time_to_visit = tips.best_time.clone();
        record.opening_hours = tips.opening_hours.clone();
        record.official_website = tips.official_url.clone();
    }

    if let Some(entry) = encyclopedia {
        record.unique_facts = entry.facts.clone();
        record.key_figures = entry.figures.clone();
        record.architectural_features = entry.features.clone();
        record.source_url = entry.url.clone();
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> Candidate {
        Candidate {
            url: "https://egymonuments.gov.eg/en/archaeological-sites/karnak".into(),
            name: "Karnak Temples".into(),
            location_hint: "Luxor".into(),
            description_hint: "The largest religious complex ever built.".into(),
            image_hint: "https://egymonuments.gov.eg/media/karnak.jpg".into(),
        }
    }

    fn primary() -> PrimaryPage {
        PrimaryPage {
            title: "Karnak".into(),
            long_description: "Construction began in the Middle Kingdom under Senusret I.".into(),
            native_name: "معابد الكرنك".into(),
            images: vec![
                "https://egymonuments.gov.eg/media/karnak.jpg".into(),
                "https://egymonuments.gov.eg/media/karnak-2.jpg".into(),
            ],
        }
    }

    fn input<'a>(c: &'a Candidate, p: &'a PrimaryPage) -> SynthesisInput<'a> {
        SynthesisInput {
            id: "site_001",
            candidate: c,
            primary: p,
            classification: Classification::of(&c.name, &p.long_description),
            encyclopedia: None,
            region: "Luxor".into(),
            coordinates: None,
            vocabulary: Vec::new(),
            tips: None,
            map_facts: None,
            sub_locations: heritagekb_extract::extract("site_001", &c.name, &p.long_description),
        }
    }

    #[test]
    fn bare_record_leaves_optional_groups_empty() {
        let (c, p) = (candidate(), primary());
        let record = synthesize(input(&c, &p));

        assert_eq!(record.id, "site_001");
        assert_eq!(record.name, "Karnak Temples");
        assert_eq!(record.era, Some(Era::MiddleKingdom));
        assert_eq!(record.short_description, "The largest religious complex ever built.");
        assert_eq!(record.images.len(), 2);
        assert_eq!(record.images[0], "https://egymonuments.gov.eg/media/karnak.jpg");
        assert!(record.tips.is_empty());
        assert!(record.estimated_duration.is_empty());
        assert!(record.unique_facts.is_empty());
        assert!(record.source_url.is_empty());
        assert!(record.latitude.is_none());

        assert_eq!(record.sub_locations.len(), 1);
        let only = &record.sub_locations[0];
        assert_eq!(only.name, "Karnak Temples");
        assert_eq!(only.native_name, "معابد الكرنك");
        assert_eq!(only.image_ref, record.images[0]);
    }

    #[test]
    fn encyclopedia_period_overrides_primary_era() {
        let (c, p) = (candidate(), primary());
        let entry = EncyclopediaEntry {
            facts: vec!["It is the largest ancient religious site.".into()],
            figures: vec!["Amun".into()],
            url: "https://en.wikipedia.org/wiki/Karnak".into(),
            period: Some("New Kingdom".into()),
            ..Default::default()
        };
        let record = synthesize(SynthesisInput {
            encyclopedia: Some(&entry),
            ..input(&c, &p)
        });
        assert_eq!(record.era, Some(Era::NewKingdom));
        assert_eq!(record.key_figures, vec!["Amun".to_string()]);
        assert_eq!(record.source_url, "https://en.wikipedia.org/wiki/Karnak");

        let unmapped = EncyclopediaEntry {
            period: Some("First Intermediate".into()),
            ..entry
        };
        let record = synthesize(SynthesisInput {
            encyclopedia: Some(&unmapped),
            ..input(&c, &p)
        });
        assert_eq!(record.era, Some(Era::MiddleKingdom));
    }

    #[test]
    fn tips_group_is_taken_wholesale() {
        let (c, p) = (candidate(), primary());
        let tips = VisitTips {
            tips: vec!["Bring water.".into()],
            opening_hours: String::new(),
            best_time: "Early morning".into(),
            duration: "3-4 hours".into(),
            ticket_info: None,
            official_url: String::new(),
        };
        let record = synthesize(SynthesisInput {
            tips: Some(&tips),
            ..input(&c, &p)
        });
        assert_eq!(record.tips, vec!["Bring water.".to_string()]);
        assert_eq!(record.estimated_duration, "3-4 hours");
        assert_eq!(record.best_time_to_visit, "Early morning");
    }

    #[test]
    fn coordinates_prefer_geocoder_and_are_validated() {
        let (c, p) = (candidate(), primary());
        let facts = MapFactsEntry {
            rating: Some(4.8),
            review_count: Some(1200),
            coordinates: Some(Coordinates {
                lat: 25.7,
                lon: 32.6,
            }),
            ..Default::default()
        };

        let from_map = synthesize(SynthesisInput {
            map_facts: Some(&facts),
            ..input(&c, &p)
        });
        assert_eq!(from_map.latitude, Some(25.7));
        assert_eq!(from_map.rating, Some(4.8));
        assert_eq!(from_map.review_count, Some(1200));

        let outside = synthesize(SynthesisInput {
            coordinates: Some(Coordinates {
                lat: 48.85,
                lon: 2.29,
            }),
            ..input(&c, &p)
        });
        assert!(outside.latitude.is_none());
        assert!(outside.longitude.is_none());
    }

    #[test]
    fn short_description_falls_back_to_full_text() {
        let c = Candidate {
            description_hint: String::new(),
            ..candidate()
        };
        let p = PrimaryPage {
            long_description: "x".repeat(450),
            ..primary()
        };
        let record = synthesize(input(&c, &p));
        assert_eq!(record.short_description.chars().count(), SHORT_DESCRIPTION_CHARS);
    }

    #[test]
    fn synthesis_is_deterministic() {
        let (c, p) = (candidate(), primary());
        assert_eq!(synthesize(input(&c, &p)), synthesize(input(&c, &p)));
    }
}
