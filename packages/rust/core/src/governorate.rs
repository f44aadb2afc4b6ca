//! Governorate (region) resolution.
//!
//! Tiers, first hit wins:
//! 1. a curated known-place fragment found in the site name
//! 2. the location hint is itself a governorate (or an alias of one)
//! 3. forward geocode the site, then reverse geocode that point
//! 4. reverse geocode the record's own coordinates
//! 5. the raw, unresolved hint
//!
//! Geocoder failures at tiers 3 and 4 are logged and treated as misses.

use tracing::{debug, instrument, warn};

use heritagekb_shared::Coordinates;
use heritagekb_sources::{Geocode, MemoCache};

/// Forward geocode results keyed by `name|hint`.
pub type GeocodeCache = MemoCache<Option<Coordinates>>;

/// Resolved governorates keyed by `name|hint|lat|lon`.
pub type RegionCache = MemoCache<Option<String>>;

/// Lowercase spelling to official governorate name.
const GOVERNORATES: &[(&str, &str)] = &[
    ("alexandria", "Alexandria"),
    ("aswan", "Aswan"),
    ("asyut", "Asyut"),
    ("beheira", "Beheira"),
    ("beni suef", "Beni Suef"),
    ("cairo", "Cairo"),
    ("dakahlia", "Dakahlia"),
    ("damietta", "Damietta"),
    ("faiyum", "Faiyum"),
    ("fayoum", "Faiyum"),
    ("gharbia", "Gharbia"),
    ("giza", "Giza"),
    ("ismailia", "Ismailia"),
    ("kafr el sheikh", "Kafr El Sheikh"),
    ("kafr el-sheikh", "Kafr El Sheikh"),
    ("luxor", "Luxor"),
    ("matruh", "Matruh"),
    ("matrouh", "Matruh"),
    ("minya", "Minya"),
    ("al-minya", "Minya"),
    ("monufia", "Monufia"),
    ("menoufia", "Monufia"),
    ("new valley", "New Valley"),
    ("wadi al-jadid", "New Valley"),
    ("north sinai", "North Sinai"),
    ("port said", "Port Said"),
    ("qalyubia", "Qalyubia"),
    ("qena", "Qena"),
    ("red sea", "Red Sea"),
    ("sharqia", "Sharqia"),
    ("sharkia", "Sharqia"),
    ("al-sharkia", "Sharqia"),
    ("sohag", "Sohag"),
    ("south sinai", "South Sinai"),
    ("suez", "Suez"),
];

/// Name fragments of well-known sites, checked in order.
const KNOWN_PLACES: &[(&str, &str)] = &[
    ("giza plateau", "Giza"),
    ("pyramids", "Giza"),
    ("sphinx", "Giza"),
    ("saqqara", "Giza"),
    ("dahshur", "Giza"),
    ("abu rawash", "Giza"),
    ("karnak", "Luxor"),
    ("valley of the kings", "Luxor"),
    ("valley of the queens", "Luxor"),
    ("deir el-bahari", "Luxor"),
    ("deir al-bahari", "Luxor"),
    ("medinet habu", "Luxor"),
    ("colossi of memnon", "Luxor"),
    ("luxor temple", "Luxor"),
    ("abu simbel", "Aswan"),
    ("philae", "Aswan"),
    ("elephantine", "Aswan"),
    ("nubian museum", "Aswan"),
    ("unfinished obelisk", "Aswan"),
    ("bibliotheca alexandrina", "Alexandria"),
    ("catacombs of kom el shoqafa", "Alexandria"),
    ("kom el-dikka", "Alexandria"),
    ("qaitbay citadel", "Alexandria"),
    ("pompey's pillar", "Alexandria"),
    ("egyptian museum", "Cairo"),
    ("cairo citadel", "Cairo"),
    ("khan el-khalili", "Cairo"),
    ("al-azhar", "Cairo"),
    ("coptic cairo", "Cairo"),
    ("old cairo", "Cairo"),
    ("heliopolis", "Cairo"),
    ("saint catherine", "South Sinai"),
    ("mount sinai", "South Sinai"),
    ("sharm el-sheikh", "South Sinai"),
    ("dahab", "South Sinai"),
    ("hurghada", "Red Sea"),
];

/// Tier 1: a known site fragment inside the name.
pub fn known_place(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    KNOWN_PLACES
        .iter()
        .find(|(fragment, _)| lower.contains(fragment))
        .map(|(_, gov)| *gov)
}

/// Official name for an exact governorate spelling.
pub fn governorate(spelling: &str) -> Option<&'static str> {
    let key = spelling.trim().to_lowercase();
    GOVERNORATES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, gov)| *gov)
}

/// Map a geocoder address field ("Luxor Governorate", "محافظة أسوان") onto a
/// governorate. Unknown names are `None`.
pub fn normalize_governorate(raw: &str) -> Option<&'static str> {
    let stripped = raw
        .to_lowercase()
        .replace(" governorate", "")
        .replace("محافظة", "");
    governorate(&stripped)
}

/// All distinct official governorate names, sorted.
pub fn all_governorates() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = GOVERNORATES.iter().map(|(_, gov)| *gov).collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Forward geocode through the memo cache. A failed lookup is logged and
/// cached as no point, so later tiers in the same run do not query again.
pub async fn forward_geocode(
    geocode: &dyn Geocode,
    cache: &GeocodeCache,
    name: &str,
    hint: &str,
) -> Option<Coordinates> {
    let key = format!("{name}|{hint}");
    if let Some(hit) = cache.get(&key) {
        return hit;
    }
    match geocode.query(name, hint).await {
        Ok(coords) => {
            cache.insert(key, coords);
            coords
        }
        Err(e) => {
            warn!(stage = "geocode", site = %name, error = %e, "forward geocode failed");
            cache.insert(key, None);
            None
        }
    }
}

async fn reverse_governorate(geocode: &dyn Geocode, coords: Coordinates) -> Option<&'static str> {
    match geocode.reverse(coords.lat, coords.lon).await {
        Ok(Some(raw)) => {
            let resolved = normalize_governorate(&raw);
            if resolved.is_none() {
                debug!(raw = %raw, "reverse geocode returned an unknown region");
            }
            resolved
        }
        Ok(None) => None,
        Err(e) => {
            warn!(stage = "region", error = %e, "reverse geocode failed");
            None
        }
    }
}

/// Resolve the governorate for a site, falling back to the raw hint.
#[instrument(skip_all, fields(site = %name))]
pub async fn resolve_region(
    geocode: &dyn Geocode,
    geocodes: &GeocodeCache,
    regions: &RegionCache,
    name: &str,
    hint: &str,
    coords: Option<Coordinates>,
) -> String {
    let key = format!(
        "{name}|{hint}|{}|{}",
        coords.map(|c| c.lat.to_string()).unwrap_or_default(),
        coords.map(|c| c.lon.to_string()).unwrap_or_default(),
    );

    let resolved = match regions.get(&key) {
        Some(hit) => hit,
        None => {
            let resolved = resolve_uncached(geocode, geocodes, name, hint, coords).await;
            regions.insert(key, resolved.clone());
            resolved
        }
    };

    resolved.unwrap_or_else(|| hint.trim().to_string())
}

async fn resolve_uncached(
    geocode: &dyn Geocode,
    geocodes: &GeocodeCache,
    name: &str,
    hint: &str,
    coords: Option<Coordinates>,
) -> Option<String> {
    if let Some(gov) = known_place(name) {
        debug!(tier = "known_place", governorate = gov, "region resolved");
        return Some(gov.to_string());
    }
    if let Some(gov) = governorate(hint) {
        debug!(tier = "hint", governorate = gov, "region resolved");
        return Some(gov.to_string());
    }

    let forward = forward_geocode(geocode, geocodes, name, hint).await;
    if let Some(point) = forward {
        if let Some(gov) = reverse_governorate(geocode, point).await {
            debug!(tier = "forward_geocode", governorate = gov, "region resolved");
            return Some(gov.to_string());
        }
    }

    // Skip a second reverse lookup of the point tier 3 already tried.
    let point = coords.filter(|c| Some(*c) != forward)?;
    let gov = reverse_governorate(geocode, point).await?;
    debug!(tier = "reverse_geocode", governorate = gov, "region resolved");
    Some(gov.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use heritagekb_shared::{HeritageError, Result};

    use super::*;

    /// Answers every query with one point and region, counting calls.
    struct FixedGeocoder {
        point: Option<Coordinates>,
        region: Option<String>,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FixedGeocoder {
        fn new(point: Option<Coordinates>, region: Option<&str>) -> Self {
            Self {
                point,
                region: region.map(str::to_string),
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(None, None)
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Geocode for FixedGeocoder {
        async fn query(&self, name: &str, _hint: &str) -> Result<Option<Coordinates>> {
            self.calls.lock().expect("lock").push(format!("query:{name}"));
            if self.fail {
                return Err(HeritageError::Network("offline".into()));
            }
            Ok(self.point)
        }

        async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
            self.calls.lock().expect("lock").push(format!("reverse:{lat},{lon}"));
            if self.fail {
                return Err(HeritageError::Network("offline".into()));
            }
            Ok(self.region.clone())
        }
    }

    fn karnak_point() -> Coordinates {
        Coordinates {
            lat: 25.7188,
            lon: 32.6573,
        }
    }

    #[test]
    fn normalizes_address_fields() {
        assert_eq!(normalize_governorate("Luxor Governorate"), Some("Luxor"));
        assert_eq!(normalize_governorate("  Kafr El-Sheikh "), Some("Kafr El Sheikh"));
        assert_eq!(normalize_governorate("Fayoum"), Some("Faiyum"));
        assert_eq!(normalize_governorate("Bavaria"), None);
        assert_eq!(all_governorates().len(), 27);
    }

    #[tokio::test]
    async fn known_place_beats_geocoder() {
        let geo = FixedGeocoder::new(Some(karnak_point()), Some("Qena Governorate"));
        let region = resolve_region(
            &geo,
            &GeocodeCache::new(),
            &RegionCache::new(),
            "Karnak Temples",
            "Qena",
            Some(karnak_point()),
        )
        .await;
        assert_eq!(region, "Luxor");
        assert!(geo.calls().is_empty());
    }

    #[tokio::test]
    async fn hint_governorate_beats_geocoder() {
        let geo = FixedGeocoder::new(Some(karnak_point()), Some("Qena Governorate"));
        let region = resolve_region(
            &geo,
            &GeocodeCache::new(),
            &RegionCache::new(),
            "Temple of Hibis",
            " New Valley ",
            None,
        )
        .await;
        assert_eq!(region, "New Valley");
        assert!(geo.calls().is_empty());
    }

    #[tokio::test]
    async fn falls_through_to_forward_then_reverse() {
        let geo = FixedGeocoder::new(Some(karnak_point()), Some("Qena Governorate"));
        let geocodes = GeocodeCache::new();
        let regions = RegionCache::new();
        let region =
            resolve_region(&geo, &geocodes, &regions, "Dendera Complex", "Dendera", None).await;
        assert_eq!(region, "Qena");

        // Second call is served from the region cache.
        let again =
            resolve_region(&geo, &geocodes, &regions, "Dendera Complex", "Dendera", None).await;
        assert_eq!(again, "Qena");
        assert_eq!(geo.calls().len(), 2);
    }

    #[tokio::test]
    async fn unresolved_falls_back_to_raw_hint() {
        let geo = FixedGeocoder::failing();
        let region = resolve_region(
            &geo,
            &GeocodeCache::new(),
            &RegionCache::new(),
            "Wadi Something",
            "Western Desert",
            Some(karnak_point()),
        )
        .await;
        assert_eq!(region, "Western Desert");
        assert_eq!(geo.calls().len(), 2);
    }

    #[tokio::test]
    async fn forward_geocode_reuses_cached_answer() {
        let geo = FixedGeocoder::new(Some(karnak_point()), None);
        let cache = GeocodeCache::new();
        assert_eq!(
            forward_geocode(&geo, &cache, "Karnak", "Luxor").await,
            Some(karnak_point())
        );
        assert_eq!(
            forward_geocode(&geo, &cache, "Karnak", "Luxor").await,
            Some(karnak_point())
        );
        assert_eq!(geo.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_forward_lookup_is_not_repeated_by_region_tier() {
        let geo = FixedGeocoder::failing();
        let geocodes = GeocodeCache::new();

        assert_eq!(forward_geocode(&geo, &geocodes, "Oasis Shrine", "Somewhere").await, None);
        let region = resolve_region(
            &geo,
            &geocodes,
            &RegionCache::new(),
            "Oasis Shrine",
            "Somewhere",
            None,
        )
        .await;

        assert_eq!(region, "Somewhere");
        assert_eq!(geo.calls(), vec!["query:Oasis Shrine".to_string()]);
    }
}
