//! The ordered feature pattern registry.
//!
//! Each rule pairs a case-insensitive pattern with a [`FeatureKind`]. Rules
//! are tried in table order and matches within a rule in text order; that
//! order decides which of two overlapping names is kept.

use std::fmt;

use heritagekb_shared::text::title_case;

/// Deity names recognised inside "Temple of ..." phrases.
pub const DEITIES: &str = "Khnum|Satet|Khonsu|Amun|Ra|Horus|Isis|Osiris|Hathor|Thoth|Ptah|Anubis|\
Sobek|Sekhmet|Bastet|Mut|Aten|Min|Nefertum|Neith|Montu|Wepwawet|Set";

/// Kind of named feature, which selects naming and description templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Theater,
    Villa,
    Baths,
    Educational,
    Temple,
    Tomb,
    Mosque,
    Church,
    Monument,
}

impl FeatureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Theater => "theater",
            FeatureKind::Villa => "villa",
            FeatureKind::Baths => "baths",
            FeatureKind::Educational => "educational",
            FeatureKind::Temple => "temple",
            FeatureKind::Tomb => "tomb",
            FeatureKind::Mosque => "mosque",
            FeatureKind::Church => "church",
            FeatureKind::Monument => "monument",
        }
    }

    /// Build the feature name from a captured proper name.
    pub fn name_from_capture(self, captured: &str) -> String {
        let captured = title_case(captured.trim());
        match self {
            FeatureKind::Temple => format!("Temple of {captured}"),
            FeatureKind::Tomb => format!("Tomb of {captured}"),
            FeatureKind::Mosque => format!("Mosque of {captured}"),
            FeatureKind::Church => format!("Church of {captured}"),
            _ => captured,
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registry row.
#[derive(Debug, Clone)]
pub struct FeatureRule {
    /// Regex source; compiled case-insensitively. Capture group 1, when
    /// present, is the proper name fed to the kind's name template.
    pub pattern: String,
    pub kind: FeatureKind,
    /// Reject a match when the next non-space character is this one.
    pub not_followed_by: Option<char>,
}

impl FeatureRule {
    pub fn new(pattern: impl Into<String>, kind: FeatureKind) -> Self {
        Self {
            pattern: pattern.into(),
            kind,
            not_followed_by: None,
        }
    }

    pub fn not_followed_by(mut self, ch: char) -> Self {
        self.not_followed_by = Some(ch);
        self
    }
}

/// The standard registry for Egyptian heritage prose.
pub fn standard_rules() -> Vec<FeatureRule> {
    use FeatureKind::*;

    vec![
        // Theaters
        FeatureRule::new(r"Roman\s+Theater\s*\([^)]+\)", Theater),
        FeatureRule::new(r"Roman\s+Theater", Theater).not_followed_by('('),
        FeatureRule::new(r"Amphitheatre", Theater),
        // Residential
        FeatureRule::new(r"Villa\s+of\s+the\s+[A-Z][a-z]+", Villa),
        // Baths
        FeatureRule::new(r"Roman\s+Baths?", Baths),
        FeatureRule::new(r"Public\s+Baths?", Baths),
        // Educational
        FeatureRule::new(r"Lecture\s+Halls?", Educational),
        FeatureRule::new(r"Library", Educational),
        // Temples
        FeatureRule::new(
            format!(r"[Tt]emple\s+of\s+(?:[^,]*?\s+)?({DEITIES})\b"),
            Temple,
        ),
        FeatureRule::new(r"[Tt]emple\s+of\s+[^,]+,\s*([A-Z][a-z]{3,12})\b", Temple),
        FeatureRule::new(r"([A-Z][a-z]+)'s\s+Temple", Temple),
        FeatureRule::new(r"Great\s+Temple", Temple),
        // Tombs
        FeatureRule::new(r"Tomb\s+of\s+([A-Z][a-zA-Z\s]{2,20}?)(?:\s*\(|,|\.|$)", Tomb),
        FeatureRule::new(r"Royal\s+Tomb", Tomb),
        FeatureRule::new(r"Burial\s+Chamber", Tomb),
        // Places of worship
        FeatureRule::new(r"Mosque\s+of\s+([A-Z][a-zA-Z\s]+?)(?:\s*\(|,|\.|$)", Mosque),
        FeatureRule::new(r"Church\s+of\s+([A-Z][a-zA-Z\s]+?)(?:\s*\(|,|\.|$)", Church),
        // Standalone structures
        FeatureRule::new(r"Nilometer", Monument),
        FeatureRule::new(r"Colossi", Monument),
        FeatureRule::new(r"Obelisk", Monument),
        FeatureRule::new(r"Sphinx", Monument),
        FeatureRule::new(r"Pylon", Monument),
    ]
}
