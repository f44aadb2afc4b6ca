//! Category listing pages of the primary heritage source.

use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument};
use url::Url;

use heritagekb_shared::{Candidate, Category, HeritageError, Result};

use crate::http::HttpClient;
use crate::traits::Listing;

static ITEM_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.listItem").expect("valid selector"));
static LOCATION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".location p").expect("valid selector"));
static DETAILS_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".details > p").expect("valid selector"));
static IMG_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid selector"));

/// Reads `{base}/en/{category}/` and turns each `a.listItem` into a [`Candidate`].
#[derive(Debug, Clone)]
pub struct HtmlListing {
    http: HttpClient,
    base_url: Url,
}

impl HtmlListing {
    pub fn new(http: HttpClient, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| HeritageError::config(format!("invalid base_url '{base_url}': {e}")))?;
        Ok(Self { http, base_url })
    }

    fn listing_url(&self, category: Category) -> Result<Url> {
        self.base_url
            .join(&format!("/en/{}/", category.slug()))
            .map_err(|e| HeritageError::config(format!("cannot build listing URL: {e}")))
    }
}

#[async_trait]
impl Listing for HtmlListing {
    #[instrument(skip_all, fields(category = %category))]
    async fn fetch(&self, category: Category, max: Option<usize>) -> Result<Vec<Candidate>> {
        let url = self.listing_url(category)?;
        let html = self.http.get_text(url.as_str()).await?;
        let candidates = parse_listing(&html, &url, category, max);
        info!(count = candidates.len(), "listing parsed");
        Ok(candidates)
    }
}

/// Parse a listing page. Anchors outside the category path are ignored.
pub fn parse_listing(
    html: &str,
    page_url: &Url,
    category: Category,
    max: Option<usize>,
) -> Vec<Candidate> {
    let doc = Html::parse_document(html);
    let marker = format!("/{}/", category.slug());

    doc.select(&ITEM_SEL)
        .filter_map(|item| {
            let href = item.value().attr("href")?;
            let url = page_url.join(href).ok()?;
            if !url.path().contains(&marker) {
                return None;
            }
            let name = item
                .value()
                .attr("title")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| element_text(item));
            Some(Candidate {
                url: url.to_string(),
                name,
                location_hint: first_text(item, &LOCATION_SEL),
                description_hint: first_text(item, &DETAILS_SEL),
                image_hint: item
                    .select(&IMG_SEL)
                    .next()
                    .and_then(|img| img.value().attr("src"))
                    .and_then(|src| page_url.join(src).ok())
                    .map(|u| u.to_string())
                    .unwrap_or_default(),
            })
        })
        .filter(|c| !c.name.is_empty())
        .take(max.unwrap_or(usize::MAX))
        .collect()
}

fn first_text(item: ElementRef<'_>, sel: &Selector) -> String {
    item.select(sel).next().map(element_text).unwrap_or_default()
}

pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    heritagekb_shared::text::collapse_whitespace(&el.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RateLimiter;
    use crate::retry::RetryPolicy;
    use std::sync::Arc;
    use std::time::Duration;

    const LISTING: &str = r#"
<html><body>
  <a class="listItem" href="/en/archaeological-sites/karnak-temples" title="Karnak Temples">
    <img src="/media/karnak.jpg">
    <div class="location"><p>Luxor</p></div>
    <div class="details"><p>The largest religious complex.</p></div>
  </a>
  <a class="listItem" href="/en/museums/egyptian-museum" title="Egyptian Museum"></a>
  <a class="listItem" href="https://egymonuments.gov.eg/en/archaeological-sites/philae" title="Philae Temple">
    <div class="location"><p>Aswan</p></div>
  </a>
  <a class="listItem" href="/en/archaeological-sites/abydos" title="Abydos"></a>
</body></html>
"#;

    fn base() -> Url {
        Url::parse("https://egymonuments.gov.eg/en/archaeological-sites/").expect("url")
    }

    #[test]
    fn parses_candidates_in_order() {
        let items = parse_listing(LISTING, &base(), Category::ArchaeologicalSites, None);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "Karnak Temples");
        assert_eq!(
            items[0].url,
            "https://egymonuments.gov.eg/en/archaeological-sites/karnak-temples"
        );
        assert_eq!(items[0].location_hint, "Luxor");
        assert_eq!(items[0].description_hint, "The largest religious complex.");
        assert_eq!(items[0].image_hint, "https://egymonuments.gov.eg/media/karnak.jpg");
        assert_eq!(items[1].name, "Philae Temple");
        assert_eq!(items[1].image_hint, "");
    }

    #[test]
    fn respects_max() {
        let items = parse_listing(LISTING, &base(), Category::ArchaeologicalSites, Some(2));
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "Philae Temple");
    }

    #[tokio::test]
    async fn fetches_listing_from_server() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/en/archaeological-sites/"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(LISTING))
            .mount(&server)
            .await;

        let http = HttpClient::new(
            "heritagekb-test",
            Duration::from_secs(5),
            RetryPolicy::none(),
            Arc::new(RateLimiter::unlimited()),
        )
        .expect("client");
        let listing = HtmlListing::new(http, &server.uri()).expect("listing");
        let items = listing
            .fetch(Category::ArchaeologicalSites, None)
            .await
            .expect("fetch");
        assert_eq!(items.len(), 3);
        assert!(items[0].url.starts_with(&server.uri()));
    }

    #[tokio::test]
    async fn listing_http_failure_is_an_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let http = HttpClient::new(
            "heritagekb-test",
            Duration::from_secs(5),
            RetryPolicy::none(),
            Arc::new(RateLimiter::unlimited()),
        )
        .expect("client");
        let listing = HtmlListing::new(http, &server.uri()).expect("listing");
        assert!(listing.fetch(Category::Museums, None).await.is_err());
    }
}
