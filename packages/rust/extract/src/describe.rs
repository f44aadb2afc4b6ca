//! Templated feature descriptions.

use heritagekb_shared::text::split_sentences;

use crate::registry::FeatureKind;

/// Words too common to tie a sentence to a feature.
const STOPWORDS: &[&str] = &["of", "the", "and"];

/// Keyword gate for a conditional template.
#[derive(Debug, Clone, Copy)]
enum Gate {
    AllOf(&'static [&'static str]),
    AnyOf(&'static [&'static str]),
}

impl Gate {
    fn admits(&self, details: &str) -> bool {
        match self {
            Gate::AllOf(words) => words.iter().all(|w| details.contains(w)),
            Gate::AnyOf(words) => words.iter().any(|w| details.contains(w)),
        }
    }
}

/// Conditional variants, tried in order against the relevant sentences.
const VARIANTS: &[(FeatureKind, Gate, &str)] = &[
    (
        FeatureKind::Theater,
        Gate::AllOf(&["only", "egypt"]),
        "The {name} is the only Roman theater discovered in Egypt. It features tiered marble \
         seating and served as a venue for musical performances and public gatherings in ancient times.",
    ),
    (
        FeatureKind::Theater,
        Gate::AnyOf(&["marble", "seats"]),
        "The {name} is a well-preserved ancient performance venue with tiered marble seating, \
         offering visitors a glimpse into the entertainment culture of Roman Alexandria.",
    ),
    (
        FeatureKind::Villa,
        Gate::AnyOf(&["mosaic", "birds"]),
        "The {name} is renowned for its stunning floor mosaics depicting colorful birds and \
         intricate geometric patterns, representing the luxurious lifestyle of wealthy Roman residents.",
    ),
    (
        FeatureKind::Baths,
        Gate::AnyOf(&["hypocaust", "heating"]),
        "The {name} demonstrate advanced Roman engineering, featuring a sophisticated hypocaust \
         (underfloor heating) system that showcases the technological achievements of the era.",
    ),
    (
        FeatureKind::Educational,
        Gate::AnyOf(&["school", "university", "philosoph"]),
        "The {name} are believed to be part of an ancient philosophical school or university, \
         offering a rare glimpse into academic life in Greco-Roman Alexandria.",
    ),
];

fn default_template(kind: FeatureKind) -> &'static str {
    match kind {
        FeatureKind::Theater => {
            "The {name} is an ancient performance venue that reflects the cultural life of the period."
        }
        FeatureKind::Villa => {
            "The {name} offers insight into the residential architecture and lifestyle of ancient times."
        }
        FeatureKind::Baths => "The {name} showcase Roman bathing culture and engineering achievements.",
        FeatureKind::Educational => {
            "The {name} represent the intellectual and educational heritage of ancient Alexandria."
        }
        FeatureKind::Temple => {
            "The {name} is a sacred site dedicated to ancient Egyptian religious practices."
        }
        FeatureKind::Tomb => "The {name} provides insights into ancient burial customs and beliefs.",
        FeatureKind::Mosque => {
            "The {name} is an important Islamic religious and architectural landmark."
        }
        FeatureKind::Church => "The {name} represents the rich Coptic Christian heritage of Egypt.",
        FeatureKind::Monument => {
            "The {name} is a significant historical monument worthy of exploration."
        }
    }
}

/// Sentences of `text` that mention the feature name or one of its words.
pub(crate) fn relevant_sentences<'a>(feature_name: &str, text: &'a str) -> Vec<&'a str> {
    let name_lower = feature_name.to_lowercase();
    let words: Vec<&str> = name_lower
        .split_whitespace()
        .filter(|w| w.chars().count() >= 3 && !STOPWORDS.contains(w))
        .collect();

    split_sentences(text)
        .into_iter()
        .map(str::trim)
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            lower.contains(&name_lower) || words.iter().any(|w| lower.contains(w))
        })
        .collect()
}

/// Describe a feature from the sentences of `text` that mention it.
pub(crate) fn describe_feature(feature_name: &str, kind: FeatureKind, text: &str) -> String {
    let relevant = relevant_sentences(feature_name, text);

    let template = if relevant.is_empty() {
        default_template(kind)
    } else {
        let details = relevant.join(" ").to_lowercase();
        VARIANTS
            .iter()
            .find(|(k, gate, _)| *k == kind && gate.admits(&details))
            .map(|(_, _, template)| *template)
            .unwrap_or_else(|| default_template(kind))
    };

    template.replace("{name}", feature_name)
}

/// Sentences counted toward a fallback summary must be longer than this.
const MIN_SENTENCE_CHARS: usize = 30;
/// Stop adding sentences once the summary exceeds this.
const SUMMARY_CHAR_BUDGET: usize = 200;

/// Summarize a whole-site description from its opening sentences.
pub(crate) fn summarize(text: &str, site_name: &str) -> String {
    let mut picked: Vec<&str> = Vec::new();
    let mut length = 0usize;

    for sentence in split_sentences(text).into_iter().take(3) {
        let sentence = sentence.trim();
        if sentence.chars().count() <= MIN_SENTENCE_CHARS {
            continue;
        }
        if !picked.is_empty() {
            length += 1;
        }
        length += sentence.chars().count();
        picked.push(sentence);
        if length > SUMMARY_CHAR_BUDGET {
            break;
        }
    }

    if picked.is_empty() {
        format!("{site_name} is an archaeological site of historical and cultural significance.")
    } else {
        picked.join(" ")
    }
}
