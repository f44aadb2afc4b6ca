//! Ordered rule tables driving classification.
//!
//! Every table is scanned top to bottom and the first hit wins, so row order
//! is part of the behaviour.

use heritagekb_shared::{Era, PlaceType, TourismType};

// ---------------------------------------------------------------------------
// Era
// ---------------------------------------------------------------------------

/// How an era row decides whether lowercased text mentions it.
#[derive(Debug, Clone, Copy)]
pub(crate) enum EraMatch {
    /// Any of the phrases is a substring.
    Any(&'static [&'static str]),
    /// Any of the phrases, or every word of the pair.
    AnyOrBoth(&'static [&'static str], (&'static str, &'static str)),
}

impl EraMatch {
    pub(crate) fn matches(&self, lower: &str) -> bool {
        match self {
            EraMatch::Any(phrases) => phrases.iter().any(|p| lower.contains(p)),
            EraMatch::AnyOrBoth(phrases, (a, b)) => {
                phrases.iter().any(|p| lower.contains(p)) || (lower.contains(a) && lower.contains(b))
            }
        }
    }
}

/// Oldest first.
pub(crate) const ERA_PHRASES: &[(EraMatch, Era)] = &[
    (EraMatch::Any(&["old kingdom"]), Era::OldKingdom),
    (EraMatch::Any(&["middle kingdom"]), Era::MiddleKingdom),
    (
        EraMatch::Any(&["new kingdom", "18th dynasty", "19th dynasty"]),
        Era::NewKingdom,
    ),
    (EraMatch::Any(&["late period"]), Era::LatePeriod),
    (EraMatch::Any(&["ptolemaic"]), Era::Ptolemaic),
    (
        EraMatch::AnyOrBoth(
            &["roman and byzantine", "roman period", "roman era"],
            ("roman", "byzantine"),
        ),
        Era::Roman,
    ),
    (
        EraMatch::Any(&["islamic", "fatimid", "mamluk", "ayyubid"]),
        Era::Islamic,
    ),
];

/// BC years strictly above the bound map to the era; the last row is the floor.
pub(crate) const BC_THRESHOLDS: &[(u64, Era)] = &[
    (3100, Era::PreDynastic),
    (2181, Era::OldKingdom),
    (1650, Era::MiddleKingdom),
    (1069, Era::NewKingdom),
    (332, Era::LatePeriod),
];

/// First AD year of Islamic rule; earlier AD years are Roman.
pub(crate) const ISLAMIC_CONQUEST_AD: u64 = 641;

// ---------------------------------------------------------------------------
// Tourism type
// ---------------------------------------------------------------------------

pub(crate) const TOURISM_KEYWORDS: &[(&[&str], TourismType)] = &[
    (
        &["mosque", "madrasa", "minaret", "islamic"],
        TourismType::Islamic,
    ),
    (
        &["coptic", "christian", "church", "monastery", "convent"],
        TourismType::Coptic,
    ),
    (
        &[
            "roman",
            "greco",
            "greek",
            "ptolem",
            "hellenistic",
            "amphitheatre",
            "byzantine",
        ],
        TourismType::GrecoRoman,
    ),
    (
        &["modern period", "modern era", "19th century", "20th century"],
        TourismType::Modern,
    ),
];

// ---------------------------------------------------------------------------
// Place type
// ---------------------------------------------------------------------------

pub(crate) const PLACE_KEYWORDS: &[(&[&str], PlaceType)] = &[
    (&["pyramid"], PlaceType::Pyramid),
    (&["temple"], PlaceType::Temple),
    (&["tomb", "cemetery", "necropolis", "burial"], PlaceType::Tomb),
    (&["museum"], PlaceType::Museum),
    (&["mosque", "madrasa"], PlaceType::Mosque),
    (
        &["church", "cathedral", "monastery", "convent"],
        PlaceType::Church,
    ),
    (
        &["fortress", "citadel", "fort", "castle"],
        PlaceType::Fortress,
    ),
    (&["market", "bazaar", "khan"], PlaceType::Market),
    (
        &[
            "amphitheatre",
            "theater",
            "theatre",
            "obelisk",
            "statue",
            "colossus",
        ],
        PlaceType::Monument,
    ),
];

// ---------------------------------------------------------------------------
// Encyclopedia period labels
// ---------------------------------------------------------------------------

/// Period label fragments, most specific first.
pub(crate) const PERIOD_LABELS: &[(&[&str], Era)] = &[
    (&["pre-dynastic", "predynastic"], Era::PreDynastic),
    (&["early dynastic", "old kingdom"], Era::OldKingdom),
    (&["middle kingdom"], Era::MiddleKingdom),
    (
        &[
            "new kingdom",
            "18th dynasty",
            "19th dynasty",
            "20th dynasty",
        ],
        Era::NewKingdom,
    ),
    (&["late period"], Era::LatePeriod),
    (
        &["ptolemaic", "ptolemy", "greek", "hellenistic"],
        Era::Ptolemaic,
    ),
    (&["roman", "byzantine", "coptic"], Era::Roman),
    (
        &["islamic", "fatimid", "mamluk", "ayyubid", "ottoman"],
        Era::Islamic,
    ),
    (
        &["muhammad ali", "modern", "19th century", "20th century"],
        Era::Modern,
    ),
];
