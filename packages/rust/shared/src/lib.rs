//! Shared types, error model, and configuration for heritagekb.
//!
//! This crate is the foundation depended on by all other heritagekb crates.
//! It provides:
//! - [`HeritageError`], the unified error type
//! - Domain types ([`SiteRecord`], [`SubLocation`], [`Era`], [`Category`], adapter payloads)
//! - Configuration ([`AppConfig`], config loading)
//! - Text helpers ([`text`])

pub mod config;
pub mod error;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ExportConfig, RateLimitsConfig, RetryConfig, SourcesConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{HeritageError, Result};
pub use types::{
    Candidate, Category, Coordinates, EGYPT_LAT_MAX, EGYPT_LAT_MIN, EGYPT_LON_MAX, EGYPT_LON_MIN,
    EncyclopediaEntry, Era, MapFactsEntry, PlaceType, PrimaryPage, SiteMeta, SiteRecord,
    SubLocation, TourismType, VisitTips, VocabularyTerm,
};
