//! Nominatim (OpenStreetMap) geocoding.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use heritagekb_shared::{Coordinates, HeritageError, Result};

use crate::http::HttpClient;
use crate::traits::Geocode;

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    state: Option<String>,
    province: Option<String>,
    county: Option<String>,
    state_district: Option<String>,
}

impl Address {
    /// First populated administrative field, most specific to Egypt first.
    fn region(self) -> Option<String> {
        [self.state, self.province, self.county, self.state_district]
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ReverseHit {
    #[serde(default)]
    address: Address,
}

/// Geocoder backed by a Nominatim instance. The client's rate limiter should
/// allow at most one request per second against the public instance.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: HttpClient,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn search(&self, query: &str) -> Result<Option<Coordinates>> {
        let url = format!("{}/search", self.base_url);
        let hits: Vec<SearchHit> = self
            .http
            .get_json(
                &url,
                &[
                    ("q", query),
                    ("format", "json"),
                    ("addressdetails", "1"),
                    ("limit", "1"),
                ],
            )
            .await?;

        let coords = hits
            .first()
            .and_then(|hit| Coordinates::parse(&hit.lat, &hit.lon));
        if coords.is_none() && !hits.is_empty() {
            debug!(query, "geocode hit outside Egypt or malformed, discarded");
        }
        Ok(coords)
    }
}

/// Forward queries to try, most specific first.
fn forward_queries(name: &str, hint: &str) -> Vec<String> {
    let hint = hint.trim();
    let mut queries = Vec::with_capacity(2);
    if !hint.is_empty() {
        queries.push(format!("{name}, {hint}, Egypt"));
    }
    queries.push(format!("{name}, Egypt"));
    queries
}

#[async_trait]
impl Geocode for NominatimGeocoder {
    #[instrument(skip_all, fields(name = %name))]
    async fn query(&self, name: &str, hint: &str) -> Result<Option<Coordinates>> {
        let mut last_error: Option<HeritageError> = None;
        let mut any_answered = false;

        for query in forward_queries(name, hint) {
            match self.search(&query).await {
                Ok(Some(coords)) => return Ok(Some(coords)),
                Ok(None) => any_answered = true,
                Err(e) => {
                    warn!(query = %query, error = %e, "geocode query failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_answered => Err(e),
            _ => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        let url = format!("{}/reverse", self.base_url);
        let lat = lat.to_string();
        let lon = lon.to_string();
        let hit: ReverseHit = self
            .http
            .get_json(
                &url,
                &[
                    ("lat", lat.as_str()),
                    ("lon", lon.as_str()),
                    ("format", "json"),
                    ("addressdetails", "1"),
                ],
            )
            .await?;
        Ok(hit.address.region())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::http::RateLimiter;
    use crate::retry::RetryPolicy;

    fn geocoder(uri: &str) -> NominatimGeocoder {
        let http = HttpClient::new(
            "heritagekb-test",
            Duration::from_secs(5),
            RetryPolicy::none(),
            Arc::new(RateLimiter::unlimited()),
        )
        .expect("client");
        NominatimGeocoder::new(http, uri)
    }

    #[test]
    fn query_order() {
        assert_eq!(
            forward_queries("Karnak", "Luxor"),
            vec!["Karnak, Luxor, Egypt", "Karnak, Egypt"]
        );
        assert_eq!(forward_queries("Karnak", " "), vec!["Karnak, Egypt"]);
    }

    #[tokio::test]
    async fn falls_back_to_second_query() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/search"))
            .and(wiremock::matchers::query_param("q", "Karnak, Luxor, Egypt"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/search"))
            .and(wiremock::matchers::query_param("q", "Karnak, Egypt"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(r#"[{"lat":"25.7188","lon":"32.6573"}]"#),
            )
            .mount(&server)
            .await;

        let coords = geocoder(&server.uri())
            .query("Karnak", "Luxor")
            .await
            .expect("query");
        assert_eq!(
            coords,
            Some(Coordinates {
                lat: 25.7188,
                lon: 32.6573
            })
        );
    }

    #[tokio::test]
    async fn coordinates_outside_egypt_are_discarded() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/search"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(r#"[{"lat":"48.8584","lon":"2.2945"}]"#),
            )
            .mount(&server)
            .await;

        let coords = geocoder(&server.uri())
            .query("Obelisk", "")
            .await
            .expect("query");
        assert!(coords.is_none());
    }

    #[tokio::test]
    async fn reverse_reads_state_field() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/reverse"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                r#"{"address":{"county":"Qurna","state":"Luxor Governorate","country":"Egypt"}}"#,
            ))
            .mount(&server)
            .await;

        let region = geocoder(&server.uri())
            .reverse(25.7, 32.6)
            .await
            .expect("reverse");
        assert_eq!(region.as_deref(), Some("Luxor Governorate"));
    }

    #[tokio::test]
    async fn all_queries_failing_is_an_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(geocoder(&server.uri()).query("Karnak", "Luxor").await.is_err());
    }
}
