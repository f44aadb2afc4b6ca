//! Detail pages of the primary heritage source.

use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use heritagekb_shared::text::contains_arabic;
use heritagekb_shared::{HeritageError, PrimaryPage, Result};

use crate::http::HttpClient;
use crate::listing::element_text;
use crate::traits::PrimaryFetch;

/// Paragraphs this short or shorter are navigation noise.
const MIN_PARAGRAPH_CHARS: usize = 40;

/// Most gallery images kept per page.
const MAX_IMAGES: usize = 5;

/// Footer and navigation phrases.
const BOILERPLATE: &[&str] = &[
    "copyright",
    "developed by",
    "all rights reserved",
    "read more",
    "click here",
];

static H1_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static P_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").expect("valid selector"));
static GALLERY_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".gallery img, .slider img, article img").expect("valid selector")
});

/// Fetches a detail page plus its Arabic twin for the native name.
#[derive(Debug, Clone)]
pub struct HtmlPrimaryFetch {
    http: HttpClient,
}

impl HtmlPrimaryFetch {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn native_name(&self, url: &str) -> Option<String> {
        if !url.contains("/en/") {
            return None;
        }
        let native_url = url.replacen("/en/", "/ar/", 1);
        match self.http.get_text(&native_url).await {
            Ok(html) => parse_native_title(&html),
            Err(e) => {
                debug!(url = %native_url, error = %e, "native page unavailable");
                None
            }
        }
    }
}

#[async_trait]
impl PrimaryFetch for HtmlPrimaryFetch {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<PrimaryPage> {
        let page_url = Url::parse(url)
            .map_err(|e| HeritageError::validation(format!("invalid page URL '{url}': {e}")))?;
        let html = self.http.get_text(url).await?;
        let mut page = parse_detail_page(&html, &page_url);
        page.native_name = self.native_name(url).await.unwrap_or_default();
        debug!(
            paragraphs_chars = page.long_description.len(),
            images = page.images.len(),
            has_native = !page.native_name.is_empty(),
            "primary page parsed"
        );
        Ok(page)
    }
}

/// Extract title, body paragraphs and gallery images from a detail page.
pub fn parse_detail_page(html: &str, page_url: &Url) -> PrimaryPage {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&H1_SEL)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let paragraphs: Vec<String> = doc
        .select(&P_SEL)
        .map(element_text)
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .filter(|text| {
            let lower = text.to_lowercase();
            !BOILERPLATE.iter().any(|b| lower.contains(b))
        })
        .collect();

    let mut images: Vec<String> = Vec::new();
    for img in doc.select(&GALLERY_SEL) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        let Ok(resolved) = page_url.join(src) else {
            continue;
        };
        let resolved = resolved.to_string();
        let lower = resolved.to_lowercase();
        if lower.contains("logo") || lower.contains("icon") || images.contains(&resolved) {
            continue;
        }
        images.push(resolved);
        if images.len() == MAX_IMAGES {
            break;
        }
    }

    PrimaryPage {
        title,
        long_description: paragraphs.join("\n\n"),
        native_name: String::new(),
        images,
    }
}

/// The `h1` of the Arabic page, when it is actually written in Arabic.
pub fn parse_native_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&H1_SEL)
        .next()
        .map(element_text)
        .filter(|t| contains_arabic(t))
}
