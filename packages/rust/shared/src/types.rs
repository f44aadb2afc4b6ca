//! Core domain types for heritage site records.

use serde::{Deserialize, Serialize};

use crate::error::HeritageError;

/// Southern edge of the accepted coordinate box.
pub const EGYPT_LAT_MIN: f64 = 21.0;
/// Northern edge of the accepted coordinate box.
pub const EGYPT_LAT_MAX: f64 = 32.0;
/// Western edge of the accepted coordinate box.
pub const EGYPT_LON_MIN: f64 = 24.0;
/// Eastern edge of the accepted coordinate box.
pub const EGYPT_LON_MAX: f64 = 37.0;

// ---------------------------------------------------------------------------
// Closed taxonomies
// ---------------------------------------------------------------------------

/// Historical era of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Era {
    #[serde(rename = "Pre-Dynastic")]
    PreDynastic,
    #[serde(rename = "Old Kingdom")]
    OldKingdom,
    #[serde(rename = "Middle Kingdom")]
    MiddleKingdom,
    #[serde(rename = "New Kingdom")]
    NewKingdom,
    #[serde(rename = "Late Period")]
    LatePeriod,
    Ptolemaic,
    Roman,
    Islamic,
    Modern,
}

impl Era {
    /// Every era, oldest first.
    pub const ALL: [Era; 9] = [
        Era::PreDynastic,
        Era::OldKingdom,
        Era::MiddleKingdom,
        Era::NewKingdom,
        Era::LatePeriod,
        Era::Ptolemaic,
        Era::Roman,
        Era::Islamic,
        Era::Modern,
    ];

    /// Wire name used in the output document.
    pub fn as_str(self) -> &'static str {
        match self {
            Era::PreDynastic => "Pre-Dynastic",
            Era::OldKingdom => "Old Kingdom",
            Era::MiddleKingdom => "Middle Kingdom",
            Era::NewKingdom => "New Kingdom",
            Era::LatePeriod => "Late Period",
            Era::Ptolemaic => "Ptolemaic",
            Era::Roman => "Roman",
            Era::Islamic => "Islamic",
            Era::Modern => "Modern",
        }
    }

    /// Eras that classify as Pharaonic tourism.
    pub fn is_pharaonic(self) -> bool {
        matches!(
            self,
            Era::PreDynastic
                | Era::OldKingdom
                | Era::MiddleKingdom
                | Era::NewKingdom
                | Era::LatePeriod
        )
    }
}

impl std::fmt::Display for Era {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tourism classification shown to app users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TourismType {
    Pharaonic,
    #[serde(rename = "Greco-Roman")]
    GrecoRoman,
    Coptic,
    Islamic,
    Modern,
}

impl TourismType {
    /// Wire name used in the output document.
    pub fn as_str(self) -> &'static str {
        match self {
            TourismType::Pharaonic => "Pharaonic",
            TourismType::GrecoRoman => "Greco-Roman",
            TourismType::Coptic => "Coptic",
            TourismType::Islamic => "Islamic",
            TourismType::Modern => "Modern",
        }
    }
}

impl std::fmt::Display for TourismType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical kind of place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceType {
    Pyramid,
    Temple,
    Tomb,
    Museum,
    Mosque,
    Church,
    Fortress,
    Market,
    Monument,
    Ruins,
}

impl PlaceType {
    /// Wire name used in the output document.
    pub fn as_str(self) -> &'static str {
        match self {
            PlaceType::Pyramid => "Pyramid",
            PlaceType::Temple => "Temple",
            PlaceType::Tomb => "Tomb",
            PlaceType::Museum => "Museum",
            PlaceType::Mosque => "Mosque",
            PlaceType::Church => "Church",
            PlaceType::Fortress => "Fortress",
            PlaceType::Market => "Market",
            PlaceType::Monument => "Monument",
            PlaceType::Ruins => "Ruins",
        }
    }
}

impl std::fmt::Display for PlaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Top-level listing grouping on the primary source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    ArchaeologicalSites,
    Monuments,
    Museums,
    SunkenMonuments,
}

impl Category {
    /// All categories in processing order.
    pub const ALL: [Category; 4] = [
        Category::ArchaeologicalSites,
        Category::Monuments,
        Category::Museums,
        Category::SunkenMonuments,
    ];

    /// URL slug, also used as the checkpoint key.
    pub fn slug(self) -> &'static str {
        match self {
            Category::ArchaeologicalSites => "archaeological-sites",
            Category::Monuments => "monuments",
            Category::Museums => "museums",
            Category::SunkenMonuments => "sunken-monuments",
        }
    }

    /// Human-readable label.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::ArchaeologicalSites => "Archaeological Sites",
            Category::Monuments => "Monuments",
            Category::Museums => "Museums",
            Category::SunkenMonuments => "Sunken Monuments",
        }
    }

    /// Sort and de-duplicate a caller-supplied category list into processing order.
    pub fn in_processing_order(requested: &[Category]) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| requested.contains(c))
            .collect()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for Category {
    type Err = HeritageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.slug() == s.trim())
            .ok_or_else(|| {
                HeritageError::validation(format!(
                    "unknown category '{s}' (expected one of: archaeological-sites, monuments, museums, sunken-monuments)"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A latitude/longitude pair known to lie inside Egypt's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Accept the pair only if it is finite and inside the bounding box.
    pub fn validated(lat: f64, lon: f64) -> Option<Self> {
        let inside = lat.is_finite()
            && lon.is_finite()
            && (EGYPT_LAT_MIN..=EGYPT_LAT_MAX).contains(&lat)
            && (EGYPT_LON_MIN..=EGYPT_LON_MAX).contains(&lon);
        inside.then_some(Self { lat, lon })
    }

    /// Parse string coordinates as returned by geocoding APIs.
    pub fn parse(lat: &str, lon: &str) -> Option<Self> {
        let lat = lat.trim().parse::<f64>().ok()?;
        let lon = lon.trim().parse::<f64>().ok()?;
        Self::validated(lat, lon)
    }
}

// ---------------------------------------------------------------------------
// Adapter payloads
// ---------------------------------------------------------------------------

/// One entry of a category listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub location_hint: String,
    #[serde(default)]
    pub description_hint: String,
    #[serde(default)]
    pub image_hint: String,
}

/// Detail page content from the primary source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryPage {
    pub title: String,
    pub long_description: String,
    pub native_name: String,
    pub images: Vec<String>,
}

/// Encyclopedia article digest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncyclopediaEntry {
    pub title: String,
    pub summary: String,
    pub full_text: String,
    pub native_title: String,
    pub url: String,
    pub facts: Vec<String>,
    pub figures: Vec<String>,
    pub features: Vec<String>,
    /// Raw period label as written in the article (e.g. "New Kingdom", "Byzantine").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

/// Practical visiting information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitTips {
    pub tips: Vec<String>,
    pub opening_hours: String,
    pub best_time: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_info: Option<String>,
    pub official_url: String,
}

/// Map-provider facts about a place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapFactsEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Classification summary handed to the tips source.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteMeta {
    pub place_type: PlaceType,
    pub tourism_type: TourismType,
    pub region: String,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// English / native / pronunciation triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyTerm {
    pub english: String,
    pub native: String,
    pub pronunciation: String,
}

/// A named area within a site, shown as its own card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubLocation {
    /// `{recordId}_sub_{NN}`.
    pub id: String,
    pub name: String,
    pub native_name: String,
    pub short_description: String,
    pub full_description: String,
    pub image_ref: String,
}

/// The canonical, fully synthesized site record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    pub id: String,
    pub name: String,
    pub native_name: String,
    #[serde(default)]
    pub era: Option<Era>,
    pub tourism_type: TourismType,
    pub place_type: PlaceType,
    pub region: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub short_description: String,
    pub full_description: String,
    pub images: Vec<String>,
    pub estimated_duration: String,
    pub best_time_to_visit: String,
    pub opening_hours: String,
    pub official_website: String,
    pub sub_locations: Vec<SubLocation>,
    pub tips: Vec<String>,
    pub vocabulary_terms: Vec<VocabularyTerm>,
    pub unique_facts: Vec<String>,
    pub key_figures: Vec<String>,
    pub architectural_features: Vec<String>,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
}
