//! Source adapters for the enrichment pipeline.
//!
//! This crate provides:
//! - [`traits`]: the adapter contracts the pipeline consumes ([`Listing`],
//!   [`PrimaryFetch`], [`Geocode`], [`Encyclopedia`], [`Tips`],
//!   [`TermTranslate`], [`MapFacts`]) and the [`SourceAdapters`] bundle
//! - [`http`]: shared HTTP client with retry and per-provider rate limiting
//! - concrete adapters for the heritage portal, Nominatim, Wikipedia and
//!   Google translate, plus rule-based visiting tips
//! - [`cache`]: memo caches owned by the pipeline

pub mod cache;
pub mod http;
pub mod listing;
pub mod nominatim;
pub mod primary;
pub mod retry;
pub mod tips;
pub mod traits;
pub mod translate;
pub mod wikipedia;

use std::sync::Arc;
use std::time::Duration;

use heritagekb_shared::{AppConfig, Result};

pub use cache::{MemoCache, TranslationCache, translation_key};
pub use http::{HttpClient, RateLimiter};
pub use listing::HtmlListing;
pub use nominatim::NominatimGeocoder;
pub use primary::HtmlPrimaryFetch;
pub use retry::RetryPolicy;
pub use tips::RuleBasedTips;
pub use traits::{
    Encyclopedia, Geocode, Listing, MapFacts, PrimaryFetch, SourceAdapters, TermTranslate, Tips,
};
pub use translate::GoogleTermTranslator;
pub use wikipedia::WikipediaEncyclopedia;

/// Wire the default HTTP adapters from configuration.
///
/// Each provider gets its own rate limiter; the heritage portal's listing and
/// detail fetches share one.
pub fn default_adapters(config: &AppConfig) -> Result<SourceAdapters> {
    let timeout = Duration::from_secs(config.sources.http_timeout_secs);
    let retry = RetryPolicy::from(&config.retry);
    let limits = &config.rate_limits;

    let portal = HttpClient::new(
        &config.sources.user_agent,
        timeout,
        retry.clone(),
        Arc::new(RateLimiter::from_millis(limits.primary_ms)),
    )?;
    let geocoder = HttpClient::new(
        &config.sources.geocoder_user_agent,
        timeout,
        retry.clone(),
        Arc::new(RateLimiter::from_millis(limits.geocode_ms)),
    )?;
    let wiki = HttpClient::new(
        &config.sources.user_agent,
        timeout,
        retry.clone(),
        Arc::new(RateLimiter::from_millis(limits.encyclopedia_ms)),
    )?;
    let translate = HttpClient::new(
        &config.sources.user_agent,
        timeout,
        retry,
        Arc::new(RateLimiter::unlimited()),
    )?;

    Ok(SourceAdapters {
        listing: Arc::new(HtmlListing::new(portal.clone(), &config.sources.base_url)?),
        primary: Arc::new(HtmlPrimaryFetch::new(portal)),
        geocode: Arc::new(NominatimGeocoder::new(geocoder, &config.sources.geocoder_url)),
        encyclopedia: Arc::new(WikipediaEncyclopedia::new(
            wiki,
            &config.sources.encyclopedia_api_url,
        )),
        tips: Arc::new(RuleBasedTips::new()),
        translate: Arc::new(GoogleTermTranslator::new(
            translate,
            &config.sources.translate_url,
        )),
        map_facts: None,
    })
}
