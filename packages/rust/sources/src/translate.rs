//! Vocabulary terms: pick notable words out of a description, translate them
//! to Arabic and attach a pronunciation hint.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use tracing::{debug, instrument, warn};

use heritagekb_shared::text::title_case;
use heritagekb_shared::{HeritageError, Result, VocabularyTerm};

use crate::cache::{translation_key, TranslationCache};
use crate::http::HttpClient;
use crate::traits::TermTranslate;

pub const MAX_TERMS: usize = 8;

/// Curated pronunciations, keyed by lowercase term.
const PRONUNCIATION_GUIDE: &[(&str, &str)] = &[
    ("ramesses", "Ram-sees"),
    ("ramses", "Ram-sees"),
    ("amenhotep", "Ah-men-HO-tep"),
    ("thutmose", "Thut-MO-seh"),
    ("tutankhamun", "Too-tan-KAH-moon"),
    ("khufu", "KOO-foo"),
    ("khafre", "KAF-ray"),
    ("menkaure", "Men-KOW-ray"),
    ("hatshepsut", "Hat-SHEP-soot"),
    ("akhenaten", "Ak-en-AH-ten"),
    ("cleopatra", "Klee-oh-PAT-ra"),
    ("nefertiti", "Nef-er-TEE-tee"),
    ("amun", "AH-moon"),
    ("amun-ra", "AH-moon RAH"),
    ("ra", "RAH"),
    ("horus", "HOR-us"),
    ("isis", "EYE-sis"),
    ("osiris", "Oh-SY-ris"),
    ("hathor", "HATH-or"),
    ("anubis", "Ah-NOO-bis"),
    ("thoth", "THOTH"),
    ("ptah", "Puh-TAH"),
    ("hypostyle hall", "HY-po-style hall"),
    ("pylon", "PY-lon"),
    ("obelisk", "OB-eh-lisk"),
    ("sarcophagus", "Sar-KOF-ah-gus"),
    ("cartouche", "Kar-TOOSH"),
    ("hieroglyph", "HY-ro-glif"),
    ("mastaba", "Mas-TAH-ba"),
    ("minaret", "Min-ah-RET"),
    ("mihrab", "Mih-RAHB"),
    ("mosque", "MOSK"),
];

// ---------------------------------------------------------------------------
// Term patterns, highest priority first
// ---------------------------------------------------------------------------

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("valid regex")
}

static TERM_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "pharaoh",
            Regex::new(
                r"\b(?:Ramesses|Ramses|Amenhotep|Thutmose|Tutankhamun|Khufu|Khafre|Menkaure|Hatshepsut|Akhenaten|Seti|Cleopatra|Nefertiti|Ptolemy)\b",
            )
            .expect("valid regex"),
        ),
        (
            "deity",
            Regex::new(
                r"\b(?:Amun-Ra|Amun|Ra|Re|Horus|Isis|Osiris|Hathor|Thoth|Ptah|Anubis|Sobek|Sekhmet|Bastet|Mut|Aten|Khnum|Khonsu|Montu|Set|Seth|Nephthys|Maat|Nut|Geb|Shu|Tefnut)\b",
            )
            .expect("valid regex"),
        ),
        (
            "architecture",
            ci(r"\b(?:hypostyle hall|pylon|obelisk|sphinx|colossus|sanctuary|mastaba|pyramid|sarcophagus|cartouche|hieroglyph|stele|relief|fresco|mummy|burial chamber|false door|offering table)\b"),
        ),
        (
            "title",
            ci(r"\b(?:high priest|god's wife|royal wife|pharaoh|king|queen|vizier|priestess|priest|scribe|princess|prince)\b"),
        ),
        (
            "place_feature",
            ci(r"\b(?:temple|tomb|chapel|shrine|necropolis|cemetery|fortress|citadel|mosque|minaret|dome|mihrab|church|monastery|basilica|catacomb)\b"),
        ),
    ]
});

static VOWEL_CONSONANT_RE: LazyLock<Regex> = LazyLock::new(|| ci(r"([aeiou])([^aeiou\s-])"));

static SOUND_SWAPS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (ci("ph"), "f"),
        (ci("ou"), "oo"),
        (ci("ei"), "ay"),
        (ci("ae"), "ee"),
    ]
});

/// Notable terms in `"{name} {text}"`, pattern priority then text order,
/// case-insensitively unique, at most [`MAX_TERMS`].
pub fn extract_terms(name: &str, text: &str) -> Vec<String> {
    let combined = format!("{name} {text}");
    let mut terms: Vec<String> = Vec::new();

    'outer: for (_, re) in TERM_PATTERNS.iter() {
        for m in re.find_iter(&combined) {
            let term = m.as_str();
            if !terms.iter().any(|t| t.eq_ignore_ascii_case(term)) {
                terms.push(term.to_string());
                if terms.len() == MAX_TERMS {
                    break 'outer;
                }
            }
        }
    }
    terms
}

/// Curated pronunciation, or a syllable-split approximation.
pub fn pronunciation(term: &str) -> String {
    let lower = term.trim().to_lowercase();
    if let Some((_, guide)) = PRONUNCIATION_GUIDE.iter().find(|(k, _)| *k == lower) {
        return guide.to_string();
    }

    let mut phonetic = lower;
    for (re, replacement) in SOUND_SWAPS.iter() {
        phonetic = re.replace_all(&phonetic, *replacement).into_owned();
    }
    if phonetic.chars().count() > 6 {
        phonetic = VOWEL_CONSONANT_RE
            .replace_all(&phonetic, "$1-$2")
            .into_owned();
    }
    title_case(&phonetic)
}

fn display_term(term: &str) -> String {
    if term.chars().count() > 3 {
        title_case(&term.to_lowercase())
    } else {
        term.to_string()
    }
}

/// Concatenate the translated segments of a `translate_a/single` response.
fn parse_translation(value: &serde_json::Value) -> Option<String> {
    let segments = value.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|s| s.as_str()))
        .collect();
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// English to Arabic translator backed by the public Google translate endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTermTranslator {
    http: HttpClient,
    url: String,
    target_lang: String,
}

impl GoogleTermTranslator {
    pub fn new(http: HttpClient, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
            target_lang: "ar".into(),
        }
    }

    /// Translate one term, consulting `cache` first. Failures yield an empty
    /// string and are not cached.
    pub async fn translate(&self, term: &str, cache: &TranslationCache) -> String {
        let key = translation_key(term);
        if key.is_empty() {
            return String::new();
        }
        if let Some(hit) = cache.get(&key) {
            return hit;
        }
        match self.fetch_translation(term).await {
            Ok(text) => {
                cache.insert(key, text.clone());
                text
            }
            Err(e) => {
                warn!(term, error = %e, "translation failed");
                String::new()
            }
        }
    }

    async fn fetch_translation(&self, term: &str) -> Result<String> {
        let value: serde_json::Value = self
            .http
            .get_json(
                &self.url,
                &[
                    ("client", "gtx"),
                    ("sl", "en"),
                    ("tl", self.target_lang.as_str()),
                    ("dt", "t"),
                    ("q", term),
                ],
            )
            .await?;
        parse_translation(&value)
            .ok_or_else(|| HeritageError::parse(format!("empty translation for '{term}'")))
    }
}

#[async_trait]
impl TermTranslate for GoogleTermTranslator {
    #[instrument(skip_all, fields(name = %name))]
    async fn extract_and_translate(
        &self,
        name: &str,
        text: &str,
        cache: &TranslationCache,
    ) -> Result<Vec<VocabularyTerm>> {
        let mut vocabulary = Vec::new();
        for term in extract_terms(name, text) {
            let native = self.translate(&term, cache).await;
            vocabulary.push(VocabularyTerm {
                english: display_term(&term),
                native,
                pronunciation: pronunciation(&term),
            });
        }

        let name = name.trim();
        let name_listed = vocabulary
            .iter()
            .any(|v| v.english.eq_ignore_ascii_case(name));
        if !name.is_empty() && vocabulary.len() < MAX_TERMS && !name_listed {
            let native = self.translate(name, cache).await;
            if !native.is_empty() {
                vocabulary.insert(
                    0,
                    VocabularyTerm {
                        english: name.to_string(),
                        native,
                        pronunciation: pronunciation(name),
                    },
                );
            }
        }
        vocabulary.truncate(MAX_TERMS);

        debug!(terms = vocabulary.len(), cached = cache.len(), "vocabulary built");
        Ok(vocabulary)
    }
}
