//! Rule-based classification of free text into closed taxonomies.
//!
//! Three deterministic functions, each driven by an ordered table in
//! [`rules`]:
//! - [`era`] finds the oldest period mentioned, falling back to explicit dates
//! - [`tourism_type`] maps an era (or keywords) to a tourism category
//! - [`place_type`] picks the first matching physical kind of place
//!
//! [`normalize_period`] additionally maps encyclopedia period labels into [`Era`].

mod rules;

use std::sync::LazyLock;

use heritagekb_shared::{Era, PlaceType, TourismType};
use regex::Regex;

use rules::{
    BC_THRESHOLDS, ERA_PHRASES, ISLAMIC_CONQUEST_AD, PERIOD_LABELS, PLACE_KEYWORDS,
    TOURISM_KEYWORDS,
};

// ---------------------------------------------------------------------------
// Date patterns (compiled once, matched against lowercased text)
// ---------------------------------------------------------------------------

/// `2600 BC`, `1350 b.c.`, `332 BCE`.
static BC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:bc\b|b\.c\.|bce\b)").expect("valid regex")
});

/// `30 AD`, `641 CE`, `4th century AD`.
static AD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:st|nd|rd|th)?\s*(?:century)?\s*(?:ad\b|a\.d\.|ce\b)")
        .expect("valid regex")
});

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify the historical era of a description.
///
/// Period phrases are checked oldest first, so the oldest era mentioned wins
/// regardless of where it appears. Without a phrase, the first BC date (then
/// the first AD date) is bucketed. `None` means unclassified.
pub fn era(text: &str) -> Option<Era> {
    let lower = text.to_lowercase();

    if let Some((_, era)) = ERA_PHRASES.iter().find(|(rule, _)| rule.matches(&lower)) {
        return Some(*era);
    }

    if let Some(year) = first_number(&BC_RE, &lower) {
        return Some(era_for_bc_year(year));
    }

    first_number(&AD_RE, &lower).map(era_for_ad_year)
}

/// Bucket a BC year.
pub fn era_for_bc_year(year: u64) -> Era {
    BC_THRESHOLDS
        .iter()
        .find(|(bound, _)| year > *bound)
        .map(|(_, era)| *era)
        .unwrap_or(Era::Ptolemaic)
}

/// Bucket an AD year. Values under 100 are read as centuries.
pub fn era_for_ad_year(value: u64) -> Era {
    let year = if value < 100 { value * 100 } else { value };
    if year < ISLAMIC_CONQUEST_AD {
        Era::Roman
    } else {
        Era::Islamic
    }
}

/// First match whose number parses; overflowing digit runs are skipped.
fn first_number(re: &Regex, lower: &str) -> Option<u64> {
    re.captures_iter(lower)
        .find_map(|caps| caps.get(1)?.as_str().parse().ok())
}

/// Classify the tourism category of a site.
///
/// A known era decides directly; otherwise keywords in the description and
/// name are scanned in priority order. Defaults to Pharaonic.
pub fn tourism_type(era: Option<Era>, text: &str, name: &str) -> TourismType {
    match era {
        Some(e) if e.is_pharaonic() => return TourismType::Pharaonic,
        Some(Era::Ptolemaic | Era::Roman) => return TourismType::GrecoRoman,
        Some(Era::Islamic) => return TourismType::Islamic,
        Some(Era::Modern) => return TourismType::Modern,
        _ => {}
    }

    let combined = format!("{text} {name}").to_lowercase();
    TOURISM_KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| combined.contains(w)))
        .map(|(_, tourism)| *tourism)
        .unwrap_or(TourismType::Pharaonic)
}

/// Classify the physical kind of place. Defaults to Ruins.
pub fn place_type(name: &str, text: &str) -> PlaceType {
    let combined = format!("{name} {text}").to_lowercase();
    PLACE_KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| combined.contains(w)))
        .map(|(_, place)| *place)
        .unwrap_or(PlaceType::Ruins)
}

/// Map an encyclopedia period label (e.g. "Byzantine", "Early Dynastic") into
/// the closed era set. Intermediate periods and unknown labels map to `None`.
pub fn normalize_period(label: &str) -> Option<Era> {
    let lower = label.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    let found = PERIOD_LABELS
        .iter()
        .find(|(fragments, _)| fragments.iter().any(|f| lower.contains(f)))
        .map(|(_, era)| *era);
    if found.is_none() {
        tracing::debug!(label, "period label has no era mapping");
    }
    found
}
