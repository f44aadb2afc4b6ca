//! Feature and sub-location extraction from site prose.
//!
//! A [`FeatureExtractor`] interprets an ordered [`FeatureRule`] table: every
//! rule is scanned over the text, candidate names are built from captures or
//! the literal match, and overlapping names are dropped by case-insensitive
//! containment. Accepted features become [`SubLocation`]s with templated
//! descriptions. A text with no features yields the site itself as its only
//! sub-location.

mod describe;
mod registry;

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::{debug, instrument};

use heritagekb_shared::text::title_case;
use heritagekb_shared::{HeritageError, Result, SubLocation};

pub use registry::{DEITIES, FeatureKind, FeatureRule, standard_rules};

/// Most sub-locations produced for one site.
pub const MAX_FEATURES: usize = 5;

/// Names this short or shorter are rejected.
const MIN_NAME_CHARS: usize = 4;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A named feature found in the text, before it becomes a sub-location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub kind: FeatureKind,
}

#[derive(Debug)]
struct CompiledRule {
    regex: Regex,
    kind: FeatureKind,
    not_followed_by: Option<char>,
}

/// Compiled pattern registry plus the generic matching routine.
#[derive(Debug)]
pub struct FeatureExtractor {
    rules: Vec<CompiledRule>,
}

static STANDARD: LazyLock<FeatureExtractor> = LazyLock::new(|| {
    FeatureExtractor::new(&standard_rules()).expect("valid regex")
});

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract sub-locations with the standard registry.
pub fn extract(record_id: &str, record_name: &str, text: &str) -> Vec<SubLocation> {
    FeatureExtractor::standard().extract(record_id, record_name, text)
}

impl FeatureExtractor {
    /// Compile a rule table. Patterns are matched case-insensitively.
    pub fn new(rules: &[FeatureRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let regex = RegexBuilder::new(&rule.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        HeritageError::validation(format!(
                            "invalid {} pattern '{}': {e}",
                            rule.kind, rule.pattern
                        ))
                    })?;
                Ok(CompiledRule {
                    regex,
                    kind: rule.kind,
                    not_followed_by: rule.not_followed_by,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// The shared extractor built from [`standard_rules`].
    pub fn standard() -> &'static FeatureExtractor {
        &STANDARD
    }

    /// Named features in acceptance order, at most [`MAX_FEATURES`].
    pub fn find_features(&self, text: &str) -> Vec<Feature> {
        let mut accepted: Vec<Feature> = Vec::new();
        let mut accepted_lower: Vec<String> = Vec::new();

        'rules: for rule in &self.rules {
            for caps in rule.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };

                if let Some(ch) = rule.not_followed_by {
                    if text[whole.end()..].trim_start().starts_with(ch) {
                        continue;
                    }
                }

                let name = match caps.get(1) {
                    Some(captured) => rule.kind.name_from_capture(captured.as_str()),
                    None => title_case(whole.as_str().trim()),
                };
                if name.chars().count() <= MIN_NAME_CHARS {
                    continue;
                }

                let lower = name.to_lowercase();
                let overlaps = accepted_lower
                    .iter()
                    .any(|existing| existing.contains(&lower) || lower.contains(existing.as_str()));
                if overlaps {
                    continue;
                }

                accepted_lower.push(lower);
                accepted.push(Feature {
                    name,
                    kind: rule.kind,
                });
                if accepted.len() == MAX_FEATURES {
                    break 'rules;
                }
            }
        }

        accepted
    }

    /// Build the sub-locations for one record.
    ///
    /// Never returns an empty list: without features, the record itself is
    /// the single sub-location and keeps `text` verbatim as its description.
    #[instrument(skip_all, fields(record = %record_id))]
    pub fn extract(&self, record_id: &str, record_name: &str, text: &str) -> Vec<SubLocation> {
        let features = self.find_features(text);

        if features.is_empty() {
            debug!("no named features, using the site as its own sub-location");
            return vec![SubLocation {
                id: sub_location_id(record_id, 1),
                name: record_name.to_string(),
                native_name: String::new(),
                short_description: describe::summarize(text, record_name),
                full_description: text.to_string(),
                image_ref: String::new(),
            }];
        }

        debug!(count = features.len(), "extracted named features");
        features
            .into_iter()
            .enumerate()
            .map(|(idx, feature)| {
                let description = describe::describe_feature(&feature.name, feature.kind, text);
                SubLocation {
                    id: sub_location_id(record_id, idx + 1),
                    name: feature.name,
                    native_name: String::new(),
                    short_description: description.clone(),
                    full_description: description,
                    image_ref: String::new(),
                }
            })
            .collect()
    }
}

/// `{recordId}_sub_{NN}`, 1-based.
pub fn sub_location_id(record_id: &str, sequence: usize) -> String {
    format!("{record_id}_sub_{sequence:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(subs: &[SubLocation]) -> Vec<&str> {
        subs.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn repeated_feature_yields_one_sub_location() {
        let text = "The Temple of Amun dominates the site. Pilgrims came from afar. \
                    Priests served the Temple of Amun daily. Later kings enlarged the Temple of Amun.";
        let subs = extract("site_001", "Karnak", text);
        assert_eq!(names(&subs), vec!["Temple of Amun"]);
        assert_eq!(subs[0].id, "site_001_sub_01");
        assert_eq!(
            subs[0].full_description,
            "The Temple of Amun is a sacred site dedicated to ancient Egyptian religious practices."
        );
        assert_eq!(subs[0].short_description, subs[0].full_description);
    }

    #[test]
    fn no_match_falls_back_to_site_itself() {
        let text = "A quiet field of scattered stones beside the river, visited mostly by herons.";
        let subs = extract("site_007", "Kom el-Hettan", text);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "site_007_sub_01");
        assert_eq!(subs[0].name, "Kom el-Hettan");
        assert_eq!(subs[0].full_description, text);
        assert_eq!(subs[0].short_description, text);
    }

    #[test]
    fn empty_text_gets_generic_summary() {
        let subs = extract("site_002", "Tell Basta", "");
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].full_description, "");
        assert_eq!(
            subs[0].short_description,
            "Tell Basta is an archaeological site of historical and cultural significance."
        );
    }

    #[test]
    fn parenthesised_theater_wins_over_bare_match() {
        let text = "The Roman Theater (Kom el-Dikka) has marble seats. The Roman Theater hosted concerts.";
        let subs = extract("site_003", "Kom el-Dikka", text);
        assert_eq!(names(&subs), vec!["Roman Theater (Kom El-Dikka)"]);
        assert!(subs[0].full_description.contains("tiered marble seating"));
    }

    #[test]
    fn bare_theater_is_guarded_against_parenthesis() {
        let extractor = FeatureExtractor::new(&[
            FeatureRule::new(r"Roman\s+Theater", FeatureKind::Theater).not_followed_by('(')
        ])
        .expect("compile");
        assert!(extractor.find_features("the Roman Theater (north)").is_empty());
        assert_eq!(extractor.find_features("the Roman Theater stands").len(), 1);
    }

    #[test]
    fn containment_dedup_keeps_first_accepted() {
        let text = "Visit the Villa of the Birds. The Temple of Horus and the Great Temple of Horus stand nearby.";
        let features = FeatureExtractor::standard().find_features(text);
        let found: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(found, vec!["Villa Of The Birds", "Temple of Horus", "Great Temple"]);
    }

    #[test]
    fn capped_at_five() {
        let text = "It has a Nilometer, an Obelisk, a Sphinx, a Pylon, the Colossi, \
                    a Library and Roman Baths.";
        let subs = extract("site_004", "Complex", text);
        assert_eq!(subs.len(), MAX_FEATURES);
        assert_eq!(subs[4].id, "site_004_sub_05");
        assert_eq!(names(&subs)[0], "Roman Baths");
    }

    #[test]
    fn tomb_capture_uses_template() {
        let subs = extract("site_005", "Valley", "Highlights include the Tomb of Nefertari, with painted walls.");
        assert_eq!(names(&subs), vec!["Tomb of Nefertari"]);
    }

    #[test]
    fn short_names_rejected() {
        let extractor =
            FeatureExtractor::new(&[FeatureRule::new(r"\bRa\b", FeatureKind::Monument)])
                .expect("compile");
        assert!(extractor.find_features("Ra was worshipped").is_empty());
    }

    #[test]
    fn invalid_rule_is_a_validation_error() {
        let err = FeatureExtractor::new(&[FeatureRule::new("(unclosed", FeatureKind::Tomb)])
            .unwrap_err();
        assert!(err.to_string().contains("invalid tomb pattern"));
    }

    #[test]
    fn extraction_is_deterministic() {
        let text = "The Temple of Isis at Philae faces the Nile. A Pylon guards the entrance.";
        assert_eq!(extract("s", "Philae", text), extract("s", "Philae", text));
    }
}
