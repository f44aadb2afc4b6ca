//! Encyclopedia lookups against the MediaWiki action API.
//!
//! A site name is tried under several title spellings; if none resolves, a
//! full-text search is run and the first relevant hit is used. The article is
//! then mined for facts, figures, architectural features and its period.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use heritagekb_shared::text::{collapse_whitespace, split_sentences, title_case, truncate_chars};
use heritagekb_shared::{EncyclopediaEntry, HeritageError, Result};

use crate::http::HttpClient;
use crate::traits::Encyclopedia;

const MAX_FACTS: usize = 5;
const MAX_FIGURES: usize = 10;
const FACT_MIN_CHARS: usize = 30;
const FACT_MAX_CHARS: usize = 300;
/// Period labels are only searched in the article's opening.
const PERIOD_WINDOW_CHARS: usize = 2000;
const SEARCH_LIMIT: &str = "5";

/// Snippet words that mark a search hit as plausibly about Egyptian heritage.
const RELEVANCE_KEYWORDS: &[&str] = &[
    "egypt",
    "egyptian",
    "pharaoh",
    "ancient",
    "temple",
    "tomb",
    "pyramid",
    "alexandria",
    "cairo",
    "luxor",
    "aswan",
    "archaeological",
    "roman",
    "ptolemaic",
];

/// Transliteration spellings that differ between sources.
const SPELLING_SWAPS: &[(&str, &str)] = &[
    ("el-", "el "),
    ("el ", "el-"),
    ("al-", "al "),
    ("al ", "al-"),
    ("dikka", "deka"),
    ("deka", "dikka"),
    ("shek", "sheikh"),
    ("sheikh", "shek"),
];

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("valid regex")
}

static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("valid regex"));

static PHARAOH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:Ramesses|Ramses|Amenhotep|Thutmose|Tutankhamun|Khufu|Khafre|Menkaure|Hatshepsut|Akhenaten|Seti|Ptolemy|Cleopatra|Nefertiti|Sneferu|Djoser|Cheops|Zoser)(?:\s+[IVX]+\b)?",
    )
    .expect("valid regex")
});

static DEITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:Amun|Ra|Horus|Isis|Osiris|Hathor|Thoth|Ptah|Anubis|Sobek|Sekhmet|Bastet|Mut|Aten|Min|Khnum|Khonsu|Nefertum|Neith)\b",
    )
    .expect("valid regex")
});

static ARCHITECTURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    ci(r"\b(?:hypostyle hall|pylon|sanctuary|obelisk|colossus|sphinx|mastaba|serdab|pyramid|mortuary temple|valley temple|causeway|sacred lake|colonnade|peristyle|naos|pronaos)\b")
});

static PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    ci(r"\b(?:Old Kingdom|Middle Kingdom|New Kingdom|Late Period|Ptolemaic|Roman|Byzantine|Coptic|Islamic|Mamluk|Ottoman|Pre-Dynastic|Early Dynastic|First Intermediate|Second Intermediate|Third Intermediate)\b")
});

static FACT_INDICATORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        ci(r"\b(?:oldest|largest|first|only|unique|rare|famous|renowned|best-preserved|most|earliest|longest|highest|deepest)\b"),
        ci(r"\b(?:UNESCO|World Heritage|discovered in|built in|constructed in|dating to|dates back|excavated|uncovered)\b"),
        ci(r"\b\d{3,4}\s*(?:BCE|BC|AD|CE|B\.C\.|A\.D\.)"),
        ci(r"\b(?:meters?|metres?|feet|acres?|hectares?|square)\b.*\b\d+\b"),
    ]
});

// ---------------------------------------------------------------------------
// API payloads (formatversion=2)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiResponse<Q> {
    query: Option<Q>,
}

#[derive(Debug, Default, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<WikiPage>,
}

#[derive(Debug, Deserialize)]
struct WikiPage {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    fullurl: String,
    #[serde(default)]
    langlinks: Vec<LangLink>,
}

#[derive(Debug, Deserialize)]
struct LangLink {
    lang: String,
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    #[serde(default)]
    snippet: String,
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Encyclopedia adapter for a MediaWiki installation (English Wikipedia by default).
#[derive(Debug, Clone)]
pub struct WikipediaEncyclopedia {
    http: HttpClient,
    api_url: String,
    native_lang: String,
}

impl WikipediaEncyclopedia {
    pub fn new(http: HttpClient, api_url: &str) -> Self {
        Self {
            http,
            api_url: api_url.to_string(),
            native_lang: "ar".into(),
        }
    }

    async fn fetch_page(&self, title: &str) -> Result<Option<WikiPage>> {
        let response: ApiResponse<PagesQuery> = self
            .http
            .get_json(
                &self.api_url,
                &[
                    ("action", "query"),
                    ("format", "json"),
                    ("formatversion", "2"),
                    ("redirects", "1"),
                    ("prop", "extracts|info|langlinks"),
                    ("explaintext", "1"),
                    ("inprop", "url"),
                    ("lllang", self.native_lang.as_str()),
                    ("titles", title),
                ],
            )
            .await?;

        Ok(response
            .query
            .unwrap_or_default()
            .pages
            .into_iter()
            .find(|p| !p.missing && !p.invalid && !p.extract.trim().is_empty()))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response: ApiResponse<SearchQuery> = self
            .http
            .get_json(
                &self.api_url,
                &[
                    ("action", "query"),
                    ("format", "json"),
                    ("formatversion", "2"),
                    ("list", "search"),
                    ("srprop", "snippet"),
                    ("srlimit", SEARCH_LIMIT),
                    ("srsearch", query),
                ],
            )
            .await?;
        Ok(response.query.unwrap_or_default().search)
    }

    async fn search_fallback(&self, name: &str, hint: &str) -> Result<Option<WikiPage>> {
        let mut queries = vec![format!("{name} Egypt"), name.to_string()];
        if !hint.trim().is_empty() {
            queries.push(format!("{name} {hint}"));
        }

        for query in queries {
            let hits = match self.search(&query).await {
                Ok(hits) => hits,
                Err(e) => {
                    debug!(query = %query, error = %e, "search failed");
                    continue;
                }
            };
            for hit in hits.iter().filter(|h| is_relevant_hit(name, &h.title, &h.snippet)) {
                if let Some(page) = self.fetch_page(&hit.title).await? {
                    info!(title = %page.title, query = %query, "article found via search");
                    return Ok(Some(page));
                }
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl Encyclopedia for WikipediaEncyclopedia {
    #[instrument(skip_all, fields(name = %name))]
    async fn query(&self, name: &str, hint: &str) -> Result<Option<EncyclopediaEntry>> {
        let mut last_error: Option<HeritageError> = None;
        let mut any_answered = false;
        let mut found: Option<WikiPage> = None;

        for title in title_variants(name, hint) {
            match self.fetch_page(&title).await {
                Ok(Some(page)) => {
                    debug!(title = %page.title, "article found by title");
                    found = Some(page);
                    break;
                }
                Ok(None) => any_answered = true,
                Err(e) => {
                    warn!(title = %title, error = %e, "article lookup failed");
                    last_error = Some(e);
                }
            }
        }

        if found.is_none() {
            if let Some(e) = last_error.filter(|_| !any_answered) {
                return Err(e);
            }
            found = self.search_fallback(name, hint).await?;
        }

        let Some(page) = found else {
            info!("no encyclopedia article");
            return Ok(None);
        };

        let native_title = page
            .langlinks
            .iter()
            .find(|l| l.lang == self.native_lang)
            .map(|l| l.title.clone())
            .unwrap_or_default();

        Ok(Some(digest_article(
            page.title,
            &page.extract,
            page.fullurl,
            native_title,
        )))
    }
}

// ---------------------------------------------------------------------------
// Article mining
// ---------------------------------------------------------------------------

/// Build an entry from a plain-text article.
pub fn digest_article(
    title: String,
    extract: &str,
    url: String,
    native_title: String,
) -> EncyclopediaEntry {
    let (intro, body) = split_intro(extract);
    let full_text = body;

    EncyclopediaEntry {
        title,
        summary: clean_text(&intro),
        facts: unique_facts(&full_text),
        figures: key_figures(&full_text),
        features: architectural_features(&full_text),
        period: historical_period(&full_text),
        full_text,
        native_title,
        url,
    }
}

/// Split a plain-text extract into its lead section and the whole text with
/// `== Heading ==` lines removed.
fn split_intro(extract: &str) -> (String, String) {
    let mut intro = Vec::new();
    let mut body = Vec::new();
    let mut in_intro = true;
    for line in extract.lines() {
        if line.trim_start().starts_with("==") {
            in_intro = false;
            continue;
        }
        if in_intro {
            intro.push(line);
        }
        body.push(line);
    }
    (intro.join("\n"), body.join("\n").trim().to_string())
}

/// Strip `[n]` reference markers and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    collapse_whitespace(&REFERENCE_RE.replace_all(text, ""))
}

/// Sentences with superlatives, dates or measurements.
pub fn unique_facts(text: &str) -> Vec<String> {
    let mut facts: Vec<String> = Vec::new();
    for sentence in split_sentences(text) {
        let len = sentence.chars().count();
        if !(FACT_MIN_CHARS..=FACT_MAX_CHARS).contains(&len) {
            continue;
        }
        if FACT_INDICATORS.iter().any(|re| re.is_match(sentence)) {
            let fact = clean_text(sentence);
            if !facts.contains(&fact) {
                facts.push(fact);
                if facts.len() == MAX_FACTS {
                    break;
                }
            }
        }
    }
    facts
}

/// Rulers then deities, first-seen order, case-insensitively unique.
pub fn key_figures(text: &str) -> Vec<String> {
    let mut figures: Vec<String> = Vec::new();
    let matches = PHARAOH_RE
        .find_iter(text)
        .chain(DEITY_RE.find_iter(text))
        .map(|m| collapse_whitespace(m.as_str()));
    for figure in matches {
        if !figures.iter().any(|f| f.eq_ignore_ascii_case(&figure)) {
            figures.push(figure);
            if figures.len() == MAX_FIGURES {
                break;
            }
        }
    }
    figures
}

/// Architectural terms, title-cased, first-seen order.
pub fn architectural_features(text: &str) -> Vec<String> {
    let mut features: Vec<String> = Vec::new();
    for m in ARCHITECTURE_RE.find_iter(text) {
        let feature = title_case(&m.as_str().to_lowercase());
        if !features.contains(&feature) {
            features.push(feature);
        }
    }
    features
}

/// First period label in the article's opening.
pub fn historical_period(text: &str) -> Option<String> {
    PERIOD_RE
        .find(truncate_chars(text, PERIOD_WINDOW_CHARS))
        .map(|m| title_case(&m.as_str().to_lowercase()))
}

/// Article titles to try, in order, without duplicates.
pub fn title_variants(name: &str, hint: &str) -> Vec<String> {
    let name = name.trim();
    let hint = hint.trim();
    let lower = name.to_lowercase();
    let mut variants: Vec<String> = vec![name.to_string()];

    if name.contains('-') {
        variants.push(name.replace('-', " "));
    }
    if name.contains(' ') {
        variants.push(name.replace(' ', "-"));
    }
    for (from, to) in SPELLING_SWAPS {
        if lower.contains(from) {
            variants.push(title_case(&lower.replace(from, to)));
        }
    }
    if !hint.is_empty() {
        variants.push(format!("{name} ({hint})"));
        variants.push(format!("{name}, {hint}"));
    }
    if !lower.contains("temple") {
        variants.push(format!("{name} Temple"));
        variants.push(format!("Temple of {name}"));
    }
    if !lower.contains("pyramid") && ["giza", "saqqara", "dahshur"].iter().any(|p| lower.contains(p)) {
        variants.push(format!("{name} Pyramid"));
    }
    let without_article = name.replace("The ", "").replace("the ", "");
    if without_article != name {
        variants.push(without_article.trim().to_string());
    }

    let mut seen: Vec<String> = Vec::with_capacity(variants.len());
    for v in variants {
        if !v.is_empty() && !seen.contains(&v) {
            seen.push(v);
        }
    }
    seen
}

/// A search hit counts when its snippet sounds Egyptian or its title covers
/// at least half of the name's words.
fn is_relevant_hit(name: &str, title: &str, snippet: &str) -> bool {
    let snippet = snippet.to_lowercase();
    if RELEVANCE_KEYWORDS.iter().any(|k| snippet.contains(k)) {
        return true;
    }
    let normalized = name.to_lowercase().replace(['-', '_'], " ");
    let parts: Vec<&str> = normalized.split_whitespace().collect();
    let title = title.to_lowercase();
    let hits = parts.iter().filter(|p| title.contains(*p)).count();
    hits >= parts.len() / 2
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::http::RateLimiter;
    use crate::retry::RetryPolicy;

    const ARTICLE: &str = "The Karnak Temple Complex comprises a vast mix of temples.[1] It was built over two thousand years.\n\n\
== History ==\n\
Construction began in the Middle Kingdom under Senusret I. The Great Hypostyle Hall was built by Seti I and Ramesses II.\n\
It is the largest ancient religious site in the world. The main temple is dedicated to Amun. \
The sacred lake covers about 9,250 square metres and a pylon marks the entrance.";

    #[test]
    fn digest_extracts_everything() {
        let entry = digest_article(
            "Karnak".into(),
            ARTICLE,
            "https://en.wikipedia.org/wiki/Karnak".into(),
            "الكرنك".into(),
        );
        assert_eq!(
            entry.summary,
            "The Karnak Temple Complex comprises a vast mix of temples. It was built over two thousand years."
        );
        assert!(!entry.full_text.contains("== History =="));
        assert_eq!(entry.period.as_deref(), Some("Middle Kingdom"));
        assert_eq!(entry.figures, vec!["Seti I", "Ramesses II", "Amun"]);
        assert_eq!(entry.features, vec!["Hypostyle Hall", "Sacred Lake", "Pylon"]);
        assert!(entry
            .facts
            .iter()
            .any(|f| f == "It is the largest ancient religious site in the world."));
        assert!(entry.facts.len() <= MAX_FACTS);
        assert_eq!(entry.native_title, "الكرنك");
    }

    #[test]
    fn reference_markers_removed() {
        assert_eq!(clean_text("Built  in 1350 BC.[12] Restored[3]."), "Built in 1350 BC. Restored.");
    }

    #[test]
    fn variants_cover_transliterations() {
        let variants = title_variants("Kom El-Dikka", "Alexandria");
        assert_eq!(variants[0], "Kom El-Dikka");
        assert!(variants.contains(&"Kom El Dikka".to_string()));
        assert!(variants.contains(&"Kom El-Deka".to_string()));
        assert!(variants.contains(&"Kom El-Dikka (Alexandria)".to_string()));
        assert!(variants.contains(&"Temple of Kom El-Dikka".to_string()));

        let giza = title_variants("The Giza Necropolis", "");
        assert!(giza.contains(&"The Giza Necropolis Pyramid".to_string()));
        assert!(giza.contains(&"Giza Necropolis".to_string()));
    }

    #[test]
    fn search_relevance() {
        assert!(is_relevant_hit("Kom El-Dikka", "Kom El Deka", ""));
        assert!(is_relevant_hit("Foo Bar", "Unrelated", "an ancient egyptian site"));
        assert!(!is_relevant_hit("Qaitbay Citadel Fortress", "Pizza", "an Italian dish"));
    }

    fn encyclopedia(uri: &str) -> WikipediaEncyclopedia {
        let http = HttpClient::new(
            "heritagekb-test",
            Duration::from_secs(5),
            RetryPolicy::none(),
            Arc::new(RateLimiter::unlimited()),
        )
        .expect("client");
        WikipediaEncyclopedia::new(http, &format!("{uri}/w/api.php"))
    }

    #[tokio::test]
    async fn query_by_title() {
        let server = wiremock::MockServer::start().await;
        let body = serde_json::json!({
            "query": { "pages": [{
                "title": "Karnak",
                "extract": ARTICLE,
                "fullurl": "https://en.wikipedia.org/wiki/Karnak",
                "langlinks": [{ "lang": "ar", "title": "الكرنك" }]
            }]}
        });

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("titles", "Karnak"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let entry = encyclopedia(&server.uri())
            .query("Karnak", "Luxor")
            .await
            .expect("query")
            .expect("article");
        assert_eq!(entry.title, "Karnak");
        assert_eq!(entry.native_title, "الكرنك");
        assert_eq!(entry.url, "https://en.wikipedia.org/wiki/Karnak");
    }

    #[tokio::test]
    async fn falls_back_to_search() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("titles", "Kom el Deka"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "pages": [{
                    "title": "Kom el Deka",
                    "extract": "Kom el Deka is a Roman era site in Alexandria with a small theatre.",
                    "fullurl": "https://en.wikipedia.org/wiki/Kom_el_Deka"
                }]}
            })))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("list", "search"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "search": [{ "title": "Kom el Deka", "snippet": "Roman theatre in Alexandria" }]}
            })))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "pages": [{ "title": "Missing", "missing": true }]}
            })))
            .mount(&server)
            .await;

        let entry = encyclopedia(&server.uri())
            .query("Roman Amphitheatre Site", "")
            .await
            .expect("query")
            .expect("article");
        assert_eq!(entry.title, "Kom el Deka");
        assert_eq!(entry.period.as_deref(), Some("Roman"));
    }

    #[tokio::test]
    async fn no_article_is_none() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("list", "search"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "search": [] }
            })))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "pages": [{ "title": "Nowhere", "missing": true }]}
            })))
            .mount(&server)
            .await;

        let entry = encyclopedia(&server.uri())
            .query("Nowhere Site", "")
            .await
            .expect("query");
        assert!(entry.is_none());
    }
}
