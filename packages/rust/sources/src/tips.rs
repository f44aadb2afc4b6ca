//! Practical visiting tips from curated rule tables. No network access.

use async_trait::async_trait;
use tracing::{debug, instrument};

use heritagekb_shared::{PlaceType, Result, SiteMeta, TourismType, VisitTips};

use crate::traits::Tips;

const MAX_RULE_TIPS: usize = 8;

const GENERAL_TIPS: &[&str] = &[
    "Bring water and wear comfortable walking shoes.",
    "Photography rules vary - check at the entrance.",
];

/// Official websites keyed by a lowercase name fragment. More specific
/// fragments come first.
const OFFICIAL_SITES: &[(&[&str], &str)] = &[
    (&["grand egyptian museum"], "https://grandegyptianmuseum.org"),
    (
        &["egyptian museum"],
        "https://egymonuments.gov.eg/en/museums/the-egyptian-museum",
    ),
    (
        &["bibliotheca", "library of alexandria"],
        "https://www.bibalex.org",
    ),
];

/// Large complexes that need half a day regardless of place type.
const LONG_VISITS: &[&str] = &["karnak", "giza plateau", "valley of the kings", "saqqara"];

const REGION_TIPS: &[(&[&str], &str)] = &[
    (
        &["luxor", "aswan"],
        "The sun can be extremely intense - bring sunscreen and a hat.",
    ),
    (
        &["alexandria"],
        "The Mediterranean breeze can make it cooler than Cairo - bring a light jacket.",
    ),
    (
        &["cairo", "giza"],
        "Be prepared for persistent vendors and unofficial guides - politely decline if not interested.",
    ),
];

/// Tips derived from place type, region and tourism type.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedTips;

impl RuleBasedTips {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tips for RuleBasedTips {
    #[instrument(skip_all, fields(name = %name))]
    async fn query(&self, name: &str, meta: &SiteMeta) -> Result<Option<VisitTips>> {
        let tips = build_tips(name, meta);
        debug!(count = tips.tips.len(), "tips generated");
        Ok(Some(tips))
    }
}

/// Assemble the full tip set for one site.
pub fn build_tips(name: &str, meta: &SiteMeta) -> VisitTips {
    let lower_name = name.to_lowercase();
    let region = meta.region.to_lowercase();

    let mut tips: Vec<String> = GENERAL_TIPS.iter().map(|t| t.to_string()).collect();
    tips.extend(place_tips(meta.place_type, &lower_name).iter().map(|t| t.to_string()));
    for (cities, tip) in REGION_TIPS {
        if cities.iter().any(|c| region.contains(c)) {
            tips.push(tip.to_string());
        }
    }
    match meta.tourism_type {
        TourismType::Pharaonic => tips.push(
            "Download a hieroglyphics guide app to understand the ancient inscriptions.".into(),
        ),
        TourismType::Islamic => {
            tips.push("Visit outside of Friday prayer times for a calmer experience.".into())
        }
        _ => {}
    }
    tips.truncate(MAX_RULE_TIPS);

    let official_url = official_site(&lower_name).unwrap_or_default().to_string();
    let duration = visit_duration(meta.place_type, &lower_name).to_string();
    let best_time = best_time(meta.place_type, &region).to_string();

    if !official_url.is_empty() {
        tips.push(format!("Official website: {official_url}"));
    }
    tips.push(format!("Recommended visit duration: {duration}"));
    tips.push(format!("Best time to visit: {best_time}"));

    VisitTips {
        tips,
        opening_hours: String::new(),
        best_time,
        duration,
        ticket_info: None,
        official_url,
    }
}

fn place_tips(place_type: PlaceType, name: &str) -> &'static [&'static str] {
    if place_type == PlaceType::Pyramid || name.contains("pyramid") {
        return &[
            "Visiting the interior requires a separate ticket and is not recommended for those with claustrophobia.",
            "Arrive early to avoid crowds and heat.",
        ];
    }
    if place_type == PlaceType::Tomb || name.contains("tomb") || name.contains("valley") {
        return &[
            "Flash photography is prohibited to protect the ancient paintings.",
            "Only a limited number of tombs are open at any time - check which ones before visiting.",
        ];
    }
    match place_type {
        PlaceType::Temple => &[
            "Early morning or late afternoon provides the best lighting for photography.",
            "Consider hiring a licensed guide to understand the hieroglyphics and history.",
        ],
        PlaceType::Museum => &[
            "Audio guides are often available at the entrance.",
            "Large bags may need to be checked at the entrance.",
        ],
        PlaceType::Mosque => &[
            "Dress modestly - shoulders and knees should be covered.",
            "Remove shoes before entering prayer areas.",
            "Non-Muslims may have restricted access during prayer times.",
        ],
        PlaceType::Church => &[
            "Dress modestly when visiting religious sites.",
            "Photography may be restricted in certain areas.",
        ],
        _ => &[],
    }
}

fn official_site(name: &str) -> Option<&'static str> {
    OFFICIAL_SITES
        .iter()
        .find(|(keys, _)| keys.iter().any(|k| name.contains(k)))
        .map(|(_, url)| *url)
}

fn visit_duration(place_type: PlaceType, name: &str) -> &'static str {
    if LONG_VISITS.iter().any(|k| name.contains(k)) {
        return "3-4 hours";
    }
    match place_type {
        PlaceType::Temple | PlaceType::Pyramid | PlaceType::Fortress => "1-2 hours",
        PlaceType::Museum => "2-3 hours",
        PlaceType::Tomb | PlaceType::Mosque | PlaceType::Church => "30 minutes - 1 hour",
        _ => "1-2 hours",
    }
}

fn best_time(place_type: PlaceType, region: &str) -> &'static str {
    match place_type {
        PlaceType::Pyramid | PlaceType::Temple | PlaceType::Tomb | PlaceType::Ruins => {
            "Early morning (8-10 AM) or late afternoon (3-5 PM) to avoid heat"
        }
        PlaceType::Museum => "Weekday mornings for fewer crowds",
        PlaceType::Mosque => "Mid-morning or mid-afternoon, outside prayer times",
        _ if region.contains("luxor") || region.contains("aswan") => {
            "Early morning or late afternoon; winter months (Oct-Mar) are cooler"
        }
        _ => "Early morning for fewer crowds",
    }
}
